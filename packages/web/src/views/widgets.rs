//! Device cards shared by the personal dashboard and the member view.

use dioxus::prelude::*;

use crate::demo::{self, Alert};

/// Alerts shown before "View More".
const ALERT_PREVIEW: usize = 3;

#[component]
pub fn BatteryCard(level: u8) -> Element {
    let hours = demo::hours_remaining(level);
    let tone = if level < 30 { "low" } else { "ok" };
    rsx! {
        section {
            class: "card",
            h3 { "Battery" }
            div {
                class: "meter",
                div { class: "meter-fill {tone}", style: "width: {level}%;" }
            }
            p { class: "muted", "{level}% - Estimated {hours} hours remaining" }
        }
    }
}

#[component]
pub fn LocationCard() -> Element {
    let mut expanded = use_signal(|| false);
    let location = &demo::LOCATION;
    let coordinates = format!("{:.4}, {:.4}", location.latitude, location.longitude);

    rsx! {
        section {
            class: "card",
            button {
                class: "btn btn-primary wide",
                onclick: move |_| expanded.toggle(),
                if expanded() { "Hide Live Location" } else { "View Live Location" }
            }
            if expanded() {
                div {
                    class: "location",
                    p { strong { "Current Location" } }
                    p { "{location.address}" }
                    p { class: "muted", "Coordinates: {coordinates}" }
                    p { class: "muted", "Last movement: {location.last_movement}" }
                    p { class: "muted", "Battery usage: {location.battery_impact}" }
                }
            }
        }
    }
}

#[component]
pub fn AlertsCard(alerts: &'static [Alert], footnote: String) -> Element {
    let mut show_all = use_signal(|| false);
    let shown = if show_all() {
        alerts.len()
    } else {
        alerts.len().min(ALERT_PREVIEW)
    };

    rsx! {
        section {
            class: "card",
            h3 { "Emergency Alerts" }
            ul {
                class: "alerts",
                for alert in &alerts[..shown] {
                    li {
                        span { class: "alert-time", "{alert.date} {alert.time}" }
                        span { "{alert.message}" }
                    }
                }
            }
            if alerts.len() > ALERT_PREVIEW {
                button {
                    class: "btn btn-ghost",
                    onclick: move |_| show_all.toggle(),
                    if show_all() { "View Less" } else { "View More" }
                }
            }
            p { class: "muted small", "{footnote}" }
        }
    }
}
