//! NGO member read model.
//!
//! A [`Member`] wraps the profile of a personal stick user managed by an NGO
//! and adds the device indicators shown on the NGO dashboard. The indicators
//! are display data fed by the dashboard; nothing here validates them beyond
//! clamping the battery level.

use serde::{Deserialize, Serialize};

use super::profile::{Mode, UserProfile};

/// Connectivity of a member's stick as shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Online,
    Away,
    Offline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub profile: UserProfile,
    pub status: MemberStatus,
    pub battery_level: u8,
    pub alert_count: u32,
}

impl Member {
    /// Wrap a personal profile. NGO profiles cannot be members.
    pub fn from_profile(profile: UserProfile) -> Option<Member> {
        if profile.mode != Mode::Personal {
            return None;
        }
        Some(Member {
            profile,
            status: MemberStatus::Offline,
            battery_level: 0,
            alert_count: 0,
        })
    }

    pub fn with_status(mut self, status: MemberStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_battery(mut self, level: u8) -> Self {
        self.battery_level = level.min(100);
        self
    }

    pub fn with_alerts(mut self, count: u32) -> Self {
        self.alert_count = count;
        self
    }

    pub fn is_low_battery(&self) -> bool {
        self.battery_level < 30
    }
}

/// Members whose name contains `query`, ignoring case. An empty query keeps
/// everyone.
pub fn filter_members<'a>(members: &'a [Member], query: &str) -> Vec<&'a Member> {
    let needle = query.trim().to_lowercase();
    members
        .iter()
        .filter(|m| needle.is_empty() || m.profile.name.to_lowercase().contains(&needle))
        .collect()
}

/// Add-member form input. All four fields are required.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberDraft {
    pub name: String,
    pub age: Option<u32>,
    pub gender: String,
    pub stick_sim: String,
}

impl MemberDraft {
    /// Names of the required fields that are still blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.age.is_none() {
            missing.push("age");
        }
        if self.gender.trim().is_empty() {
            missing.push("gender");
        }
        if self.stick_sim.trim().is_empty() {
            missing.push("stickSIM");
        }
        missing
    }
}
