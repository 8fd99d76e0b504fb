//! Device readings shown on the dashboards.
//!
//! The stick hardware does not report to the app yet, so battery, location,
//! alerts and the NGO member roster are fixed demo values.

use api::{Member, MemberStatus, Mode, ProfileDraft};

#[derive(PartialEq)]
pub struct Alert {
    pub time: &'static str,
    pub date: &'static str,
    pub message: &'static str,
}

pub struct Location {
    pub address: &'static str,
    pub latitude: f64,
    pub longitude: f64,
    pub last_movement: &'static str,
    pub battery_impact: &'static str,
}

#[derive(PartialEq)]
pub struct Document {
    pub name: &'static str,
    pub uploaded: &'static str,
}

/// A roster entry: the member plus when the stick was last seen.
#[derive(Clone, PartialEq)]
pub struct RosterEntry {
    pub member: Member,
    pub last_active: &'static str,
}

pub const PERSONAL_BATTERY: u8 = 78;
pub const MEMBER_BATTERY: u8 = 65;

pub const PERSONAL_ALERTS: &[Alert] = &[
    Alert { time: "10:45 AM", date: "Today", message: "Fall detected. User confirmed they are OK." },
    Alert { time: "02:30 PM", date: "Today", message: "Unusual movement pattern detected. No response from user." },
    Alert { time: "09:12 AM", date: "Today", message: "Low battery warning. Please charge the device." },
    Alert { time: "06:45 PM", date: "Today", message: "Location tracking temporarily unavailable." },
    Alert { time: "11:20 AM", date: "Today", message: "User manually triggered alert. Caretaker notified." },
];

pub const MEMBER_ALERTS: &[Alert] = &[
    Alert { time: "08:15 AM", date: "Today", message: "Low battery warning. Please charge the device." },
    Alert { time: "07:45 PM", date: "Yesterday", message: "Location tracking temporarily unavailable." },
];

pub const LOCATION: Location = Location {
    address: "Connaught Place, New Delhi, India",
    latitude: 28.6139,
    longitude: 77.2090,
    last_movement: "15 minutes ago",
    battery_impact: "Low impact (3%/hour)",
};

pub const DOCUMENTS: &[Document] = &[
    Document { name: "Medical Report.pdf", uploaded: "Uploaded 2 weeks ago" },
    Document { name: "ID Card.jpg", uploaded: "Uploaded 1 month ago" },
];

/// Rough hours of use left on a charge.
pub fn hours_remaining(battery: u8) -> u32 {
    u32::from(battery) * 18 / 100
}

#[allow(clippy::too_many_arguments)]
fn entry(
    id: &str,
    name: &str,
    age: u32,
    gender: &str,
    sim: &str,
    last_active: &'static str,
    battery: u8,
    status: MemberStatus,
    alerts: u32,
) -> Option<RosterEntry> {
    let profile = ProfileDraft {
        name: name.to_string(),
        age: Some(age),
        gender: Some(gender.to_string()),
        stick_sim: Some(sim.to_string()),
        ..ProfileDraft::default()
    }
    .into_profile(id, Mode::Personal);
    let member = Member::from_profile(profile)?
        .with_status(status)
        .with_battery(battery)
        .with_alerts(alerts);
    Some(RosterEntry { member, last_active })
}

pub fn roster() -> Vec<RosterEntry> {
    [
        entry("1", "John Doe", 65, "Male", "SIM123456", "10 mins ago", 78, MemberStatus::Online, 0),
        entry("2", "Jane Smith", 42, "Female", "SIM789012", "3 hrs ago", 45, MemberStatus::Away, 1),
        entry("3", "Robert Johnson", 78, "Male", "SIM345678", "1 day ago", 23, MemberStatus::Offline, 2),
        entry("4", "Emily Davis", 53, "Female", "SIM901234", "2 days ago", 92, MemberStatus::Online, 0),
        entry("5", "Michael Wilson", 70, "Male", "SIM567890", "5 hrs ago", 35, MemberStatus::Away, 3),
    ]
    .into_iter()
    .flatten()
    .collect()
}

pub fn find(id: &str) -> Option<RosterEntry> {
    roster().into_iter().find(|e| e.member.profile.id == id)
}
