//! Session context and hooks for the UI.

use dioxus::prelude::*;

use crate::platform::{load_config, make_session, AppSession};
use crate::session::Session;

/// Get the current session snapshot.
/// Returns a signal that updates on every session transition.
pub fn use_session() -> Signal<Session> {
    use_context::<Signal<Session>>()
}

/// Get the session machine to run operations on.
pub fn use_session_machine() -> AppSession {
    use_context::<AppSession>()
}

/// Provider component that owns the session machine.
/// Wrap your app with this component to enable authentication.
#[component]
pub fn AuthProvider(children: Element) -> Element {
    let machine = use_hook(|| make_session(&load_config()));
    let mut session = use_signal(|| machine.snapshot());

    let background = machine.clone();
    use_hook(move || {
        // Mirror machine snapshots into the signal
        let mut snapshots = background.subscribe();
        spawn(async move {
            while snapshots.changed().await.is_ok() {
                let next = snapshots.borrow_and_update().clone();
                session.set(next);
            }
        });

        // Restore a session kept from the last run, then follow ambient changes
        spawn(async move {
            background.resume().await.run().await;
        });
    });

    use_context_provider(|| machine.clone());
    use_context_provider(|| session);

    rsx! {
        {children}
    }
}

/// Button to log out the current user.
#[component]
pub fn LogoutButton(
    #[props(default = "Logout".to_string())] label: String,
    #[props(default = "".to_string())] class: String,
    onlogout: EventHandler<()>,
) -> Element {
    let machine = use_session_machine();
    let session = use_session();

    let onclick = move |_| {
        let machine = machine.clone();
        async move {
            match machine.logout().await {
                Ok(()) => onlogout.call(()),
                Err(e) => tracing::warn!("Logout failed: {}", e),
            }
        }
    };

    rsx! {
        button {
            class: "{class}",
            disabled: session().is_busy(),
            onclick: onclick,
            "{label}"
        }
    }
}
