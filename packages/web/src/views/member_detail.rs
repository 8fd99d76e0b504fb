use api::share;
use dioxus::prelude::*;
use ui::Destination;

use super::widgets::{AlertsCard, BatteryCard, LocationCard};
use super::{Guarded, Shell, TextField};
use crate::demo;
use crate::Route;

#[component]
pub fn MemberDetail(id: String) -> Element {
    rsx! {
        Guarded {
            target: Destination::MemberDetail(id.clone()),
            Shell { MemberDashboard { id: id.clone() } }
        }
    }
}

#[component]
fn MemberDashboard(id: String) -> Element {
    let Some(entry) = demo::find(&id) else {
        return rsx! {
            Link { class: "btn btn-ghost", to: Route::Dashboard {}, "Back to Members List" }
            p { class: "muted", "No member with id {id}" }
        };
    };
    let name = entry.member.profile.name.clone();
    let last_active = entry.last_active;

    rsx! {
        Link { class: "btn btn-ghost", to: Route::Dashboard {}, "Back to Members List" }

        h2 { "{name}'s Dashboard" }
        p { class: "muted", "Last active: {last_active}" }

        div {
            class: "stack",
            BatteryCard { level: demo::MEMBER_BATTERY }
            LocationCard {}
            AlertsCard {
                alerts: demo::MEMBER_ALERTS,
                footnote: "Older alerts have been auto-deleted",
            }
            section {
                class: "card",
                h3 { "Documents" }
                for document in demo::DOCUMENTS {
                    div {
                        key: "{document.name}",
                        class: "document",
                        div {
                            strong { "{document.name}" }
                            p { class: "muted small", "{document.uploaded}" }
                        }
                        DocumentShare { document_name: document.name.to_string() }
                    }
                }
            }
        }
    }
}

/// Open a share link outside the app.
fn open_external(url: &str) {
    #[cfg(target_arch = "wasm32")]
    {
        if let Some(window) = web_sys::window() {
            if let Err(e) = window.open_with_url_and_target(url, "_blank") {
                tracing::warn!("Failed to open {}: {:?}", url, e);
            }
        }
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        tracing::info!("Share link ready: {}", url);
    }
}

/// Share a document by email or WhatsApp.
#[component]
fn DocumentShare(document_name: String) -> Element {
    let mut open = use_signal(|| false);
    let recipient = use_signal(String::new);
    let phone = use_signal(String::new);
    let mut link = use_signal(|| Option::<String>::None);
    let mut error = use_signal(|| Option::<String>::None);

    let email_name = document_name.clone();
    let share_email = move |evt: FormEvent| {
        evt.prevent_default();
        match share::email_link(&recipient(), &email_name) {
            Ok(url) => {
                tracing::info!("Sharing {} via email to {}", email_name, recipient());
                open_external(&url);
                link.set(Some(url));
                error.set(None);
            }
            Err(e) => error.set(Some(e.to_string())),
        }
    };

    let whatsapp_name = document_name.clone();
    let share_whatsapp = move |_: MouseEvent| match share::whatsapp_link(&phone(), &whatsapp_name) {
        Ok(url) => {
            open_external(&url);
            link.set(Some(url));
            error.set(None);
        }
        Err(e) => error.set(Some(e.to_string())),
    };

    rsx! {
        button {
            class: "btn btn-ghost",
            onclick: move |_| open.toggle(),
            if open() { "Close" } else { "Share" }
        }
        if open() {
            div {
                class: "share-panel",
                p { "Share {document_name} via email or WhatsApp" }
                form {
                    onsubmit: share_email,
                    TextField { label: "Recipient Email", id: "share_email", value: recipient, kind: "email" }
                    button { class: "btn btn-primary", r#type: "submit", "Send by Email" }
                }
                TextField { label: "WhatsApp Number", id: "share_phone", value: phone, kind: "tel" }
                button { class: "btn btn-primary", onclick: share_whatsapp, "Share on WhatsApp" }

                if let Some(message) = error() {
                    p { class: "error", "{message}" }
                }
                if let Some(url) = link() {
                    a { href: "{url}", target: "_blank", "Open share link" }
                }
            }
        }
    }
}
