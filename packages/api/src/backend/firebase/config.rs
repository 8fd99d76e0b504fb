//! Firebase project configuration from explicit values or environment variables.

/// Identity Toolkit REST endpoint.
pub const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Secure Token REST endpoint, used to refresh id tokens.
pub const SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";

/// Firestore REST endpoint.
pub const FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";

/// Firebase project configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub project_id: String,
    /// Firestore collection holding one profile document per user id.
    pub profiles_collection: String,
    pub identity_url: String,
    pub token_url: String,
    pub firestore_url: String,
}

impl FirebaseConfig {
    pub fn new(api_key: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            project_id: project_id.into(),
            profiles_collection: "users".to_string(),
            identity_url: IDENTITY_TOOLKIT_URL.to_string(),
            token_url: SECURE_TOKEN_URL.to_string(),
            firestore_url: FIRESTORE_URL.to_string(),
        }
    }

    /// Create config from `FIREBASE_API_KEY` and `FIREBASE_PROJECT_ID`.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let api_key = std::env::var("FIREBASE_API_KEY")
            .map_err(|_| "FIREBASE_API_KEY not set")?;
        let project_id = std::env::var("FIREBASE_PROJECT_ID")
            .map_err(|_| "FIREBASE_PROJECT_ID not set")?;

        let mut config = Self::new(api_key, project_id);
        if let Ok(collection) = std::env::var("FIREBASE_PROFILES_COLLECTION") {
            config.profiles_collection = collection;
        }
        Ok(config)
    }

    /// Identity Toolkit URL for an `accounts:*` method.
    pub fn accounts_url(&self, method: &str) -> String {
        format!(
            "{}/accounts:{}?key={}",
            self.identity_url, method, self.api_key
        )
    }

    /// Secure Token URL for the refresh-token exchange.
    pub fn token_url(&self) -> String {
        format!("{}/token?key={}", self.token_url, self.api_key)
    }

    /// Firestore document URL of the profile for `uid`.
    pub fn profile_url(&self, uid: &str) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/{}/{}",
            self.firestore_url, self.project_id, self.profiles_collection, uid
        )
    }
}
