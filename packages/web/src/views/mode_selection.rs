//! Landing screen where the user picks personal or NGO mode.

use api::Mode;
use dioxus::prelude::*;
use ui::{use_session, use_session_machine, AuthError};

use crate::Route;

#[component]
pub fn ModeSelection() -> Element {
    let session = use_session();
    let machine = use_session_machine();
    let nav = use_navigator();
    let mut error = use_signal(|| Option::<String>::None);

    // Signed-in users have nothing to choose
    if session().is_authenticated() {
        nav.replace(Route::Dashboard {});
    }

    let choose = move |mode: Mode| match machine.select_mode(mode) {
        Ok(()) => {
            nav.push(Route::Login {});
        }
        Err(AuthError::AlreadyAuthenticated) => {
            nav.replace(Route::Dashboard {});
        }
        Err(e) => error.set(Some(e.to_string())),
    };
    let mut choose_personal = choose.clone();
    let mut choose_ngo = choose;

    rsx! {
        div {
            class: "screen-center",
            h1 { "Smart Blind Stick" }
            p {
                class: "muted",
                "An innovative solution to assist visually impaired individuals navigate safely and stay connected with caregivers"
            }

            div {
                class: "mode-grid",
                button {
                    class: "card mode-card",
                    onclick: move |_| choose_personal(Mode::Personal),
                    h2 { "Personal Mode" }
                    p { "For individual stick users and their caretakers" }
                }
                button {
                    class: "card mode-card",
                    onclick: move |_| choose_ngo(Mode::Ngo),
                    h2 { "NGO Mode" }
                    p { "For organizations managing several stick users" }
                }
            }

            if let Some(message) = error() {
                p { class: "error", "{message}" }
            }
        }
    }
}
