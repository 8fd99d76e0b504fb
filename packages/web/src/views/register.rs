//! Registration page view. The fields follow the selected mode.

use api::Mode;
use dioxus::prelude::*;
use ui::forms::RegistrationForm;
use ui::{use_session, use_session_machine};

use super::TextField;
use crate::Route;

/// Register page component.
#[component]
pub fn Register() -> Element {
    let session = use_session();
    let machine = use_session_machine();
    let nav = use_navigator();

    let name = use_signal(String::new);
    let email = use_signal(String::new);
    let password = use_signal(String::new);
    let confirm_password = use_signal(String::new);
    let age = use_signal(String::new);
    let mut gender = use_signal(String::new);
    let stick_sim = use_signal(String::new);
    let caretaker_number = use_signal(String::new);
    let ngo_name = use_signal(String::new);
    let ngo_mobile = use_signal(String::new);
    let mut error = use_signal(|| Option::<String>::None);

    if session().is_authenticated() {
        nav.replace(Route::Dashboard {});
    }

    let Some(mode) = session().selected_mode else {
        // Registration needs a mode; send the user to pick one
        nav.replace(Route::ModeSelection {});
        return rsx! {};
    };
    let busy = session().is_busy();
    let mode_label = mode.label();

    let handle_register = move |evt: FormEvent| {
        evt.prevent_default();
        let machine = machine.clone();
        spawn(async move {
            error.set(None);

            let form = RegistrationForm {
                name: name(),
                email: email(),
                password: password(),
                confirm_password: confirm_password(),
                age: age(),
                gender: gender(),
                stick_sim: stick_sim(),
                caretaker_number: caretaker_number(),
                ngo_name: ngo_name(),
                ngo_mobile: ngo_mobile(),
            };
            let (draft, password) = match form.into_request(mode) {
                Ok(request) => request,
                Err(e) => {
                    error.set(Some(e.to_string()));
                    return;
                }
            };

            match machine.register(draft, &password).await {
                Ok(user) => {
                    tracing::info!("Registered {} in {} mode", user.display_name(), user.mode);
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
                h1 { "Create Account" }
                p { class: "muted", "Register for {mode_label} mode" }

                if let Some(err) = error() {
                    div { class: "error", "{err}" }
                }

                form {
                    onsubmit: handle_register,

                    if mode == Mode::Personal {
                        TextField { label: "Full Name", id: "name", value: name }
                        TextField { label: "Age", id: "age", value: age, kind: "number" }
                        fieldset {
                            legend { "Gender" }
                            for choice in ["Male", "Female", "Other"] {
                                label {
                                    input {
                                        r#type: "radio",
                                        name: "gender",
                                        value: choice,
                                        checked: gender() == choice,
                                        onchange: move |_| gender.set(choice.to_string()),
                                    }
                                    "{choice}"
                                }
                            }
                        }
                        TextField { label: "Stick SIM Number", id: "stick_sim", value: stick_sim }
                        TextField { label: "Caretaker Number", id: "caretaker", value: caretaker_number, kind: "tel" }
                    } else {
                        TextField { label: "NGO Name", id: "ngo_name", value: ngo_name }
                        TextField { label: "NGO Mobile Number", id: "ngo_mobile", value: ngo_mobile, kind: "tel" }
                    }

                    TextField { label: "Email", id: "email", value: email, kind: "email" }
                    TextField { label: "Password", id: "password", value: password, kind: "password" }
                    TextField { label: "Confirm Password", id: "confirm_password", value: confirm_password, kind: "password" }

                    button {
                        class: "btn btn-primary",
                        r#type: "submit",
                        disabled: busy,
                        if busy { "Creating account..." } else { "Create Account" }
                    }
                }

                p {
                    class: "muted",
                    "Already have an account? "
                    Link { to: Route::Login {}, "Login" }
                }
            }
        }
    }
}
