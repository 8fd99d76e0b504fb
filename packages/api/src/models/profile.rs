//! # Profile model for stick users and NGOs
//!
//! Defines the persisted user record and the two shapes used to write it:
//!
//! ## [`UserProfile`]
//!
//! The complete record stored by the backend under its opaque `id`. Common
//! fields (`name`, `email`, `mode`) are always present. The remaining fields
//! are meaningful only for one [`Mode`]:
//!
//! - **personal** — `age`, `gender`, `stick_sim` (the device SIM, fixed after
//!   registration) and `caretaker_number`.
//! - **ngo** — `ngo_name`, `ngo_email` and `ngo_mobile`.
//!
//! The JSON form uses camelCase keys (`stickSIM` keeps its historical
//! spelling) and omits absent fields, so the same bytes are used for the local
//! session cache and the backend document.
//!
//! ## [`ProfileDraft`]
//!
//! Registration input. Everything is optional except the email; the mode may be
//! left out and is then supplied by the session's selected mode.
//!
//! ## [`ProfilePatch`]
//!
//! A partial write. [`UserProfile::merged`] applies it field by field; an
//! empty string in an optional text field clears it.
//! [`ProfilePatch::touches_identity`] tells whether a patch sets one of the
//! fields a profile update may never change (`email`, `stick_sim`, `mode`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The two mutually exclusive account kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Personal,
    Ngo,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Personal => "personal",
            Mode::Ngo => "ngo",
        }
    }

    /// Human readable label used on the mode selection screen.
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Personal => "Personal",
            Mode::Ngo => "NGO",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "personal" => Ok(Mode::Personal),
            "ngo" => Ok(Mode::Ngo),
            other => Err(format!("Unknown mode: {other}")),
        }
    }
}

/// Persisted profile of a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub mode: Mode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(rename = "stickSIM", default, skip_serializing_if = "Option::is_none")]
    pub stick_sim: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caretaker_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ngo_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ngo_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ngo_mobile: Option<String>,
}

impl UserProfile {
    /// Get display name, falling back to email if name is not set.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.email
        } else {
            &self.name
        }
    }

    /// Return a copy with every field set by `patch` replaced.
    pub fn merged(&self, patch: &ProfilePatch) -> UserProfile {
        let mut next = self.clone();
        if let Some(name) = &patch.name {
            next.name = name.clone();
        }
        if let Some(email) = &patch.email {
            next.email = email.clone();
        }
        if let Some(mode) = patch.mode {
            next.mode = mode;
        }
        if let Some(age) = patch.age {
            next.age = Some(age);
        }
        merge_text(&mut next.gender, &patch.gender);
        merge_text(&mut next.stick_sim, &patch.stick_sim);
        merge_text(&mut next.caretaker_number, &patch.caretaker_number);
        merge_text(&mut next.ngo_name, &patch.ngo_name);
        merge_text(&mut next.ngo_email, &patch.ngo_email);
        merge_text(&mut next.ngo_mobile, &patch.ngo_mobile);
        next
    }

    /// Build a profile from a patch that carries at least `email` and `mode`.
    ///
    /// Used by backends when the first write for an id arrives.
    pub fn from_patch(id: &str, patch: &ProfilePatch) -> Option<UserProfile> {
        let base = UserProfile {
            id: id.to_string(),
            name: String::new(),
            email: patch.email.clone()?,
            mode: patch.mode?,
            age: None,
            gender: None,
            stick_sim: None,
            caretaker_number: None,
            ngo_name: None,
            ngo_email: None,
            ngo_mobile: None,
        };
        Some(base.merged(patch))
    }
}

/// `Some("")` clears the field.
fn merge_text(target: &mut Option<String>, update: &Option<String>) {
    if let Some(value) = update {
        *target = (!value.is_empty()).then(|| value.clone());
    }
}

/// Registration input collected by the sign-up form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(rename = "stickSIM", default, skip_serializing_if = "Option::is_none")]
    pub stick_sim: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caretaker_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ngo_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ngo_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ngo_mobile: Option<String>,
}

impl ProfileDraft {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Self::default()
        }
    }

    /// Complete the draft into a profile for `mode`.
    ///
    /// Fields belonging to the other mode are dropped. An NGO without its own
    /// contact email uses the account email.
    pub fn into_profile(self, id: &str, mode: Mode) -> UserProfile {
        let email = self.email.trim().to_string();
        match mode {
            Mode::Personal => UserProfile {
                id: id.to_string(),
                name: self.name,
                email,
                mode,
                age: self.age,
                gender: self.gender,
                stick_sim: self.stick_sim,
                caretaker_number: self.caretaker_number,
                ngo_name: None,
                ngo_email: None,
                ngo_mobile: None,
            },
            Mode::Ngo => UserProfile {
                id: id.to_string(),
                name: self.name,
                ngo_email: self.ngo_email.or_else(|| Some(email.clone())),
                email,
                mode,
                age: None,
                gender: None,
                stick_sim: None,
                caretaker_number: None,
                ngo_name: self.ngo_name,
                ngo_mobile: self.ngo_mobile,
            },
        }
    }
}

/// Partial profile write. `None` means "leave unchanged"; an empty string in
/// an optional text field removes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(rename = "stickSIM", default, skip_serializing_if = "Option::is_none")]
    pub stick_sim: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caretaker_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ngo_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ngo_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ngo_mobile: Option<String>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        *self == ProfilePatch::default()
    }

    /// Whether the patch tries to change `email`, `stick_sim` or `mode`.
    pub fn touches_identity(&self) -> bool {
        self.email.is_some() || self.mode.is_some() || self.stick_sim.is_some()
    }
}

impl From<&UserProfile> for ProfilePatch {
    fn from(profile: &UserProfile) -> Self {
        ProfilePatch {
            name: Some(profile.name.clone()),
            email: Some(profile.email.clone()),
            mode: Some(profile.mode),
            age: profile.age,
            gender: profile.gender.clone(),
            stick_sim: profile.stick_sim.clone(),
            caretaker_number: profile.caretaker_number.clone(),
            ngo_name: profile.ngo_name.clone(),
            ngo_email: profile.ngo_email.clone(),
            ngo_mobile: profile.ngo_mobile.clone(),
        }
    }
}
