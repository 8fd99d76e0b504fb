use api::{Mode, UserProfile};
use dioxus::prelude::*;
use ui::forms::ProfileForm;
use ui::{use_session, use_session_machine, Destination};

use super::{Guarded, Shell, TextField};
use crate::Route;

#[component]
pub fn Profile() -> Element {
    let session = use_session();
    rsx! {
        Guarded {
            target: Destination::Profile,
            Shell {
                if let Some(user) = session().user {
                    ProfileEditor { user: user }
                }
            }
        }
    }
}

#[component]
fn ProfileEditor(user: UserProfile) -> Element {
    let machine = use_session_machine();
    let session = use_session();

    let initial = ProfileForm::from_profile(&user);
    let mut editing = use_signal(|| false);
    let mut name = use_signal(|| initial.name.clone());
    let mut age = use_signal(|| initial.age.clone());
    let mut gender = use_signal(|| initial.gender.clone());
    let mut caretaker_number = use_signal(|| initial.caretaker_number.clone());
    let mut ngo_name = use_signal(|| initial.ngo_name.clone());
    let mut ngo_mobile = use_signal(|| initial.ngo_mobile.clone());
    let mut message = use_signal(|| Option::<(bool, String)>::None);

    // Locked fields are read-only copies; they never reach the form
    let email = use_signal(|| user.email.clone());
    let stick_sim = use_signal(|| user.stick_sim.clone().unwrap_or_default());
    let ngo_email = use_signal(|| user.ngo_email.clone().unwrap_or_default());

    let mode = user.mode;
    let saving = session().is_busy();
    let locked = !editing();

    let reset_from = move |form: ProfileForm| {
        name.set(form.name);
        age.set(form.age);
        gender.set(form.gender);
        caretaker_number.set(form.caretaker_number);
        ngo_name.set(form.ngo_name);
        ngo_mobile.set(form.ngo_mobile);
    };

    let mut reset_on_cancel = reset_from;
    let cancel_user = user.clone();
    let cancel = move |_: MouseEvent| {
        reset_on_cancel(ProfileForm::from_profile(&cancel_user));
        editing.set(false);
        message.set(None);
    };

    let mut reset_on_save = reset_from;
    let save = move |evt: FormEvent| {
        evt.prevent_default();
        let machine = machine.clone();
        spawn(async move {
            let form = ProfileForm {
                name: name(),
                age: age(),
                gender: gender(),
                caretaker_number: caretaker_number(),
                ngo_name: ngo_name(),
                ngo_mobile: ngo_mobile(),
            };
            let patch = match form.into_patch(mode) {
                Ok(patch) => patch,
                Err(e) => {
                    message.set(Some((false, e.to_string())));
                    return;
                }
            };
            match machine.update_profile(patch).await {
                Ok(updated) => {
                    reset_on_save(ProfileForm::from_profile(&updated));
                    editing.set(false);
                    message.set(Some((true, "Profile updated".to_string())));
                }
                Err(e) => message.set(Some((false, e.to_string()))),
            }
        });
    };

    rsx! {
        Link { class: "btn btn-ghost", to: Route::Dashboard {}, "Back to Dashboard" }

        div {
            class: "card form-card",
            div {
                class: "row spread",
                h2 { "Profile" }
                if locked {
                    button {
                        class: "btn btn-ghost",
                        onclick: move |_| editing.set(true),
                        "Edit"
                    }
                }
            }

            if let Some((true, text)) = message() {
                div { class: "notice", "{text}" }
            }
            if let Some((false, text)) = message() {
                div { class: "error", "{text}" }
            }

            form {
                onsubmit: save,
                if mode == Mode::Personal {
                    TextField { label: "Full Name", id: "name", value: name, disabled: locked }
                    TextField { label: "Age", id: "age", value: age, kind: "number", disabled: locked }
                    TextField { label: "Gender", id: "gender", value: gender, disabled: locked }
                    TextField { label: "Stick SIM Number", id: "stick_sim", value: stick_sim, disabled: true }
                    TextField { label: "Caretaker Number", id: "caretaker", value: caretaker_number, kind: "tel", disabled: locked }
                    TextField { label: "Email", id: "email", value: email, kind: "email", disabled: true }
                } else {
                    TextField { label: "NGO Name", id: "ngo_name", value: ngo_name, disabled: locked }
                    TextField { label: "NGO Email", id: "ngo_email", value: ngo_email, kind: "email", disabled: true }
                    TextField { label: "NGO Mobile Number", id: "ngo_mobile", value: ngo_mobile, kind: "tel", disabled: locked }
                }

                if !locked {
                    div {
                        class: "row",
                        button {
                            class: "btn btn-primary",
                            r#type: "submit",
                            disabled: saving,
                            if saving { "Saving..." } else { "Save Changes" }
                        }
                        button {
                            class: "btn btn-ghost",
                            r#type: "button",
                            disabled: saving,
                            onclick: cancel,
                            "Cancel"
                        }
                    }
                }
            }
        }
    }
}
