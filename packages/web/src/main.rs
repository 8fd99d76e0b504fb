use dioxus::prelude::*;

use ui::{AuthProvider, Destination};
use views::{AddMember, Dashboard, Login, MemberDetail, ModeSelection, NotFound, Profile, Register};

mod demo;
mod views;

#[derive(Debug, Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum Route {
    #[route("/")]
    ModeSelection {},
    #[route("/login")]
    Login {},
    #[route("/register")]
    Register {},
    #[route("/dashboard")]
    Dashboard {},
    #[route("/profile")]
    Profile {},
    #[route("/member/:id")]
    MemberDetail { id: String },
    #[route("/add-member")]
    AddMember {},
    #[route("/:..segments")]
    NotFound { segments: Vec<String> },
}

impl From<Destination> for Route {
    fn from(destination: Destination) -> Self {
        match destination {
            Destination::ModeSelection => Route::ModeSelection {},
            Destination::Login => Route::Login {},
            Destination::Register => Route::Register {},
            Destination::Dashboard => Route::Dashboard {},
            Destination::Profile => Route::Profile {},
            Destination::MemberDetail(id) => Route::MemberDetail { id },
            Destination::AddMember => Route::AddMember {},
        }
    }
}

fn main() {
    #[cfg(feature = "desktop")]
    {
        use tracing_subscriber::EnvFilter;
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .init();
    }

    tracing::info!("Starting Smart Blind Stick");
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    rsx! {
        document::Title { "Smart Blind Stick" }
        style { {views::BASE_CSS} }

        AuthProvider {
            Router::<Route> {}
        }
    }
}
