//! Form state for the sign-in, registration, profile and add-member screens.
//!
//! Screens keep the raw text the user typed; these types turn it into the
//! domain values the session layer accepts, or a validation message.

use api::{MemberDraft, Mode, ProfileDraft, ProfilePatch, UserProfile};

use crate::error::AuthError;

fn required(value: &str, label: &str) -> Result<String, AuthError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AuthError::validation(format!("{label} is required")));
    }
    Ok(value.to_string())
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_age(value: &str) -> Result<Option<u32>, AuthError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    match value.parse::<u32>() {
        Ok(age) if (1..=130).contains(&age) => Ok(Some(age)),
        _ => Err(AuthError::validation("Age must be a number between 1 and 130")),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(AuthError::validation("Please fill in all fields"));
        }
        Ok(())
    }
}

/// Sign-up form. Which fields are required depends on the mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub age: String,
    pub gender: String,
    pub stick_sim: String,
    pub caretaker_number: String,
    pub ngo_name: String,
    pub ngo_mobile: String,
}

impl RegistrationForm {
    /// The profile draft and password to register with.
    pub fn into_request(self, mode: Mode) -> Result<(ProfileDraft, String), AuthError> {
        let email = required(&self.email, "Email")?;
        if self.password.is_empty() {
            return Err(AuthError::validation("Password is required"));
        }
        if self.password != self.confirm_password {
            return Err(AuthError::validation("Passwords don't match"));
        }

        let draft = match mode {
            Mode::Personal => {
                let age = parse_age(&self.age)?
                    .ok_or_else(|| AuthError::validation("Age is required"))?;
                ProfileDraft {
                    name: required(&self.name, "Name")?,
                    mode: Some(mode),
                    age: Some(age),
                    gender: optional(&self.gender),
                    stick_sim: Some(required(&self.stick_sim, "Stick SIM number")?),
                    caretaker_number: Some(required(&self.caretaker_number, "Caretaker number")?),
                    ..ProfileDraft::new(email)
                }
            }
            Mode::Ngo => {
                let ngo_name = required(&self.ngo_name, "NGO name")?;
                ProfileDraft {
                    name: ngo_name.clone(),
                    mode: Some(mode),
                    ngo_name: Some(ngo_name),
                    ngo_mobile: Some(required(&self.ngo_mobile, "NGO mobile number")?),
                    ..ProfileDraft::new(email)
                }
            }
        };
        Ok((draft, self.password))
    }
}

/// Profile edit form, seeded from the signed-in user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    pub name: String,
    pub age: String,
    pub gender: String,
    pub caretaker_number: String,
    pub ngo_name: String,
    pub ngo_mobile: String,
}

impl ProfileForm {
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            name: profile.name.clone(),
            age: profile.age.map(|a| a.to_string()).unwrap_or_default(),
            gender: profile.gender.clone().unwrap_or_default(),
            caretaker_number: profile.caretaker_number.clone().unwrap_or_default(),
            ngo_name: profile.ngo_name.clone().unwrap_or_default(),
            ngo_mobile: profile.ngo_mobile.clone().unwrap_or_default(),
        }
    }

    /// Editable fields for `mode` as a patch. Name and age are required;
    /// clearing an optional field removes it from the profile.
    pub fn into_patch(self, mode: Mode) -> Result<ProfilePatch, AuthError> {
        match mode {
            Mode::Personal => {
                let age = parse_age(&self.age)?.ok_or_else(|| AuthError::validation("Age is required"))?;
                Ok(ProfilePatch {
                    name: Some(required(&self.name, "Name")?),
                    age: Some(age),
                    gender: Some(self.gender.trim().to_string()),
                    caretaker_number: Some(self.caretaker_number.trim().to_string()),
                    ..ProfilePatch::default()
                })
            }
            Mode::Ngo => {
                let ngo_name = required(&self.ngo_name, "NGO name")?;
                Ok(ProfilePatch {
                    name: Some(ngo_name.clone()),
                    ngo_name: Some(ngo_name),
                    ngo_mobile: Some(self.ngo_mobile.trim().to_string()),
                    ..ProfilePatch::default()
                })
            }
        }
    }
}

/// Add-member form on the NGO dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberForm {
    pub name: String,
    pub age: String,
    pub gender: String,
    pub stick_sim: String,
}

impl MemberForm {
    pub fn into_draft(self) -> Result<MemberDraft, AuthError> {
        let draft = MemberDraft {
            name: self.name.trim().to_string(),
            age: parse_age(&self.age)?,
            gender: self.gender.trim().to_string(),
            stick_sim: self.stick_sim.trim().to_string(),
        };
        let missing = draft.missing_fields();
        if !missing.is_empty() {
            return Err(AuthError::validation(format!(
                "Please fill in all fields (missing: {})",
                missing.join(", ")
            )));
        }
        Ok(draft)
    }
}
