use std::path::PathBuf;

use url::Url;

use crate::error::ConfigError;

/// Default document store endpoint.
/// Override at build time: CLIPSHARE_FIRESTORE_URL=https://example.com cargo build
pub const FIRESTORE_URL: &str = match option_env!("CLIPSHARE_FIRESTORE_URL") {
    Some(url) => url,
    None => "https://firestore.googleapis.com/v1",
};

pub const DEFAULT_COLLECTION: &str = "devices";
pub const DEFAULT_OWNER_FIELD: &str = "ownerId";

#[derive(Debug, Clone)]
pub struct Config {
    pub firestore_url: Url,
    pub project_id: Option<String>,
    pub api_key: Option<String>,
    /// Bearer token of the signed-in user, if any.
    pub id_token: Option<String>,
    pub collection: String,
    pub owner_field: String,
    /// Raw platform tag; `android` and `ios` select the secure store.
    pub platform: String,
    pub device_name: String,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let firestore_url =
            var("CLIPSHARE_FIRESTORE_URL").unwrap_or_else(|| FIRESTORE_URL.to_string());
        let firestore_url = Url::parse(&firestore_url)?;

        Ok(Self {
            firestore_url,
            project_id: var("CLIPSHARE_PROJECT_ID"),
            api_key: var("CLIPSHARE_API_KEY"),
            id_token: var("CLIPSHARE_ID_TOKEN"),
            collection: var("CLIPSHARE_COLLECTION")
                .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            owner_field: var("CLIPSHARE_OWNER_FIELD")
                .unwrap_or_else(|| DEFAULT_OWNER_FIELD.to_string()),
            platform: var("CLIPSHARE_PLATFORM")
                .unwrap_or_else(|| crate::device::platform::runtime_tag().to_string()),
            device_name: var("CLIPSHARE_DEVICE_NAME").unwrap_or_else(default_device_name),
            data_dir: var("CLIPSHARE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(default_data_dir),
        })
    }

    pub fn require_project(&self) -> Result<&str, ConfigError> {
        self.project_id
            .as_deref()
            .ok_or(ConfigError::Missing("CLIPSHARE_PROJECT_ID"))
    }
}

fn default_device_name() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "Unknown Device".to_string())
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("clipshare")
}
