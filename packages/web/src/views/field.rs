use dioxus::prelude::*;

/// Labelled text input bound to a signal.
#[component]
pub fn TextField(
    label: String,
    id: String,
    value: Signal<String>,
    #[props(default = "text".to_string())] kind: String,
    #[props(default)] disabled: bool,
) -> Element {
    let mut value = value;
    rsx! {
        label { r#for: "{id}", "{label}" }
        input {
            id: "{id}",
            r#type: "{kind}",
            value: "{value}",
            disabled: disabled,
            oninput: move |e| value.set(e.value()),
        }
    }
}
