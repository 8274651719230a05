use async_trait::async_trait;

use super::KeyValueStore;
use crate::error::StorageError;

const SERVICE: &str = "clipshare";

/// Platforms where `keyring` has no persistent backend and would silently
/// fall back to its in-memory mock.
const NO_KEYCHAIN: [&str; 1] = ["android"];

/// Secure store backed by the OS keychain. Each key is a separate keychain entry
/// under the `clipshare` service. On platforms without a keychain every call
/// fails instead of pretending to persist.
#[derive(Debug, Clone)]
pub struct KeychainStore {
    service: String,
    available: bool,
}

impl KeychainStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE)
    }

    pub fn with_service(service: &str) -> Self {
        Self::for_platform(service, std::env::consts::OS)
    }

    pub fn for_platform(service: &str, os: &str) -> Self {
        Self {
            service: service.to_string(),
            available: !NO_KEYCHAIN.contains(&os),
        }
    }

    fn ensure_available(&self) -> Result<(), StorageError> {
        if self.available {
            Ok(())
        } else {
            Err(StorageError::Keychain("no secure store on this platform".to_string()))
        }
    }
}

impl Default for KeychainStore {
    fn default() -> Self {
        Self::new()
    }
}

fn entry(service: &str, key: &str) -> Result<keyring::Entry, StorageError> {
    keyring::Entry::new(service, key)
        .map_err(|e| StorageError::Keychain(format!("entry error: {}", e)))
}

fn read(service: &str, key: &str) -> Result<Option<String>, StorageError> {
    match entry(service, key)?.get_password() {
        Ok(value) => Ok(Some(value)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(StorageError::Keychain(format!("failed to read {}: {}", key, e))),
    }
}

fn write(service: &str, key: &str, value: &str) -> Result<(), StorageError> {
    entry(service, key)?
        .set_password(value)
        .map_err(|e| StorageError::Keychain(format!("failed to store {}: {}", key, e)))
}

#[async_trait]
impl KeyValueStore for KeychainStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.ensure_available()?;
        let service = self.service.clone();
        let key = key.to_string();
        // Keychain calls may block on platform prompts
        tokio::task::spawn_blocking(move || read(&service, &key))
            .await
            .map_err(|e| StorageError::Keychain(format!("keychain task failed: {}", e)))?
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.ensure_available()?;
        let service = self.service.clone();
        let key = key.to_string();
        let value = value.to_string();
        tokio::task::spawn_blocking(move || write(&service, &key, &value))
            .await
            .map_err(|e| StorageError::Keychain(format!("keychain task failed: {}", e)))?
    }
}
