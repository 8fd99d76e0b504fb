use dioxus::prelude::*;
use ui::{evaluate, use_session, Destination, GuardDecision};

use crate::Route;

/// Renders `children` only when the session may see `target`.
#[component]
pub fn Guarded(target: Destination, children: Element) -> Element {
    let session = use_session();
    let nav = use_navigator();

    match evaluate(&session(), &target) {
        GuardDecision::Allow => rsx! {
            {children}
        },
        GuardDecision::ShowLoading => rsx! {
            div {
                class: "screen-center",
                "Loading..."
            }
        },
        GuardDecision::Redirect(to) => {
            tracing::debug!("Redirecting {} to {}", target.path(), to.path());
            nav.replace(Route::from(to));
            rsx! {}
        }
    }
}
