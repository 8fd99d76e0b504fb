use dioxus::prelude::*;
use ui::{use_session, LogoutButton};

use crate::Route;

/// Header and page frame for the signed-in screens.
#[component]
pub fn Shell(children: Element) -> Element {
    let session = use_session();
    let nav = use_navigator();

    let (name, mode) = match session().user {
        Some(user) => (user.display_name().to_string(), user.mode.label()),
        None => (String::new(), ""),
    };

    rsx! {
        div {
            class: "shell",
            header {
                class: "shell-header",
                Link {
                    class: "brand",
                    to: Route::Dashboard {},
                    "Smart Blind Stick"
                }
                div {
                    class: "shell-user",
                    span { class: "mode-badge", "{mode}" }
                    Link { to: Route::Profile {}, "{name}" }
                    LogoutButton {
                        class: "btn btn-ghost",
                        onlogout: move |_| {
                            nav.replace(Route::ModeSelection {});
                        },
                    }
                }
            }
            main {
                class: "shell-main",
                {children}
            }
        }
    }
}
