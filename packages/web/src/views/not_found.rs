use dioxus::prelude::*;

use crate::Route;

#[component]
pub fn NotFound(segments: Vec<String>) -> Element {
    let path = format!("/{}", segments.join("/"));
    tracing::warn!("No route for {}", path);

    rsx! {
        div {
            class: "screen-center",
            h1 { "404" }
            p { class: "muted", "Oops! Page {path} not found" }
            Link { class: "btn btn-primary", to: Route::ModeSelection {}, "Return to Home" }
        }
    }
}
