use api::{filter_members, Member, MemberStatus, Mode};
use dioxus::prelude::*;
use ui::{use_session, Destination};

use super::widgets::{AlertsCard, BatteryCard, LocationCard};
use super::{Guarded, Shell};
use crate::demo;
use crate::Route;

#[component]
pub fn Dashboard() -> Element {
    rsx! {
        Guarded {
            target: Destination::Dashboard,
            Shell { DashboardBody {} }
        }
    }
}

#[component]
fn DashboardBody() -> Element {
    let session = use_session();
    match session().mode() {
        Some(Mode::Ngo) => rsx! { NgoDashboard {} },
        _ => rsx! { PersonalDashboard {} },
    }
}

#[component]
fn PersonalDashboard() -> Element {
    let session = use_session();
    let name = session()
        .user
        .map(|u| u.display_name().to_string())
        .unwrap_or_default();

    rsx! {
        h2 { "Welcome, {name}" }
        div {
            class: "stack",
            BatteryCard { level: demo::PERSONAL_BATTERY }
            LocationCard {}
            AlertsCard {
                alerts: demo::PERSONAL_ALERTS,
                footnote: "Yesterday's alerts have been auto-deleted",
            }
        }
    }
}

fn status_label(status: MemberStatus) -> &'static str {
    match status {
        MemberStatus::Online => "online",
        MemberStatus::Away => "away",
        MemberStatus::Offline => "offline",
    }
}

/// One line of the member list, ready to render.
struct MemberRow {
    id: String,
    name: String,
    details: String,
    status: &'static str,
    battery: String,
    battery_class: &'static str,
    alerts: Option<String>,
}

impl MemberRow {
    fn new(member: &Member) -> Self {
        let profile = &member.profile;
        Self {
            id: profile.id.clone(),
            name: profile.name.clone(),
            details: format!(
                "Age {} · {} · SIM {}",
                profile.age.map(|a| a.to_string()).unwrap_or_else(|| "-".to_string()),
                profile.gender.as_deref().unwrap_or("-"),
                profile.stick_sim.as_deref().unwrap_or("-"),
            ),
            status: status_label(member.status),
            battery: format!("{}%", member.battery_level),
            battery_class: if member.is_low_battery() { "battery low" } else { "battery" },
            alerts: (member.alert_count > 0).then(|| format!("{} alerts", member.alert_count)),
        }
    }
}

#[component]
fn NgoDashboard() -> Element {
    let mut query = use_signal(String::new);
    let roster = use_hook(demo::roster);

    let members: Vec<Member> = roster.iter().map(|e| e.member.clone()).collect();
    let rows: Vec<MemberRow> = filter_members(&members, &query())
        .into_iter()
        .map(MemberRow::new)
        .collect();
    let member_count = members.len();
    let total_alerts: u32 = members.iter().map(|m| m.alert_count).sum();
    let low_battery = members.iter().filter(|m| m.is_low_battery()).count();

    rsx! {
        div {
            class: "row spread",
            h2 { "Members" }
            Link { class: "btn btn-primary", to: Route::AddMember {}, "Add Member" }
        }

        div {
            class: "stats",
            div { class: "card stat", strong { "{member_count}" } span { "Members" } }
            div { class: "card stat", strong { "{total_alerts}" } span { "Open alerts" } }
            div { class: "card stat", strong { "{low_battery}" } span { "Low battery" } }
        }

        input {
            class: "search",
            r#type: "search",
            placeholder: "Search members by name",
            value: "{query}",
            oninput: move |e| query.set(e.value()),
        }

        if rows.is_empty() {
            p { class: "muted", "No members match \"{query}\"" }
        }

        ul {
            class: "members",
            for row in rows {
                li {
                    key: "{row.id}",
                    Link {
                        class: "card member-row",
                        to: Route::MemberDetail { id: row.id.clone() },
                        div {
                            strong { "{row.name}" }
                            p { class: "muted small", "{row.details}" }
                        }
                        div {
                            class: "member-meta",
                            span { class: "status {row.status}", "{row.status}" }
                            span { class: row.battery_class, "{row.battery}" }
                            if let Some(alerts) = &row.alerts {
                                span { class: "alert-count", "{alerts}" }
                            }
                        }
                    }
                }
            }
        }
    }
}
