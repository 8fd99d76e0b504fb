use dioxus::prelude::*;
use ui::forms::MemberForm;
use ui::Destination;

use super::{Guarded, Shell, TextField};
use crate::Route;

#[component]
pub fn AddMember() -> Element {
    rsx! {
        Guarded {
            target: Destination::AddMember,
            Shell { AddMemberForm {} }
        }
    }
}

#[component]
fn AddMemberForm() -> Element {
    let nav = use_navigator();
    let name = use_signal(String::new);
    let age = use_signal(String::new);
    let gender = use_signal(String::new);
    let stick_sim = use_signal(String::new);
    let mut error = use_signal(|| Option::<String>::None);

    let submit = move |evt: FormEvent| {
        evt.prevent_default();
        let form = MemberForm {
            name: name(),
            age: age(),
            gender: gender(),
            stick_sim: stick_sim(),
        };
        match form.into_draft() {
            Ok(draft) => {
                // Members are not stored anywhere yet; the roster is demo data
                tracing::info!("Added member {} with stick {}", draft.name, draft.stick_sim);
                nav.push(Route::Dashboard {});
            }
            Err(e) => error.set(Some(e.to_string())),
        }
    };

    rsx! {
        Link { class: "btn btn-ghost", to: Route::Dashboard {}, "Back to Dashboard" }

        div {
            class: "card form-card",
            h2 { "Add New Member" }

            if let Some(err) = error() {
                div { class: "error", "{err}" }
            }

            form {
                onsubmit: submit,
                TextField { label: "Full Name", id: "name", value: name }
                TextField { label: "Age", id: "age", value: age, kind: "number" }
                TextField { label: "Gender", id: "gender", value: gender }
                TextField { label: "Stick SIM Number", id: "stick_sim", value: stick_sim }
                button { class: "btn btn-primary", r#type: "submit", "Add Member" }
            }
        }
    }
}
