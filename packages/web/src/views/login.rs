//! Login page view with email/password form.

use api::Mode;
use dioxus::prelude::*;
use ui::forms::LoginForm;
use ui::{use_session, use_session_machine};

use crate::Route;

/// Login page component.
#[component]
pub fn Login() -> Element {
    let session = use_session();
    let machine = use_session_machine();
    let nav = use_navigator();
    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut error = use_signal(|| Option::<String>::None);

    // If already logged in, go to the dashboard
    if session().is_authenticated() {
        nav.replace(Route::Dashboard {});
    }

    let subtitle = match session().selected_mode {
        Some(Mode::Personal) => "Access your personal dashboard",
        Some(Mode::Ngo) => "Access your NGO dashboard",
        None => "Select a mode to continue",
    };
    let busy = session().is_busy();

    let handle_login = move |evt: FormEvent| {
        evt.prevent_default();
        let machine = machine.clone();
        spawn(async move {
            error.set(None);

            let form = LoginForm {
                email: email(),
                password: password(),
            };
            if let Err(e) = form.validate() {
                error.set(Some(e.to_string()));
                return;
            }

            match machine.login(&form.email, &form.password).await {
                Ok(user) => {
                    tracing::info!("Logged in as {}", user.display_name());
                    nav.push(Route::Dashboard {});
                }
                Err(e) => error.set(Some(e.to_string())),
            }
        });
    };

    rsx! {
        div {
            class: "screen-center",

            Link { class: "btn btn-ghost", to: Route::ModeSelection {}, "Back to Mode Selection" }

            div {
                class: "card form-card",
                h1 { "Login" }
                p { class: "muted", "{subtitle}" }

                if let Some(err) = error() {
                    div { class: "error", "{err}" }
                }

                form {
                    onsubmit: handle_login,
                    label { r#for: "email", "Email" }
                    input {
                        id: "email",
                        r#type: "email",
                        placeholder: "you@example.com",
                        value: "{email}",
                        oninput: move |e| email.set(e.value()),
                    }
                    label { r#for: "password", "Password" }
                    input {
                        id: "password",
                        r#type: "password",
                        value: "{password}",
                        oninput: move |e| password.set(e.value()),
                    }
                    button {
                        class: "btn btn-primary",
                        r#type: "submit",
                        disabled: busy,
                        if busy { "Logging in..." } else { "Login" }
                    }
                }

                p {
                    class: "muted",
                    "Don't have an account? "
                    Link { to: Route::Register {}, "Create Account" }
                }
            }
        }
    }
}
