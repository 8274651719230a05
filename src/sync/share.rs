use std::sync::Arc;

use super::types::Document;
use super::DocumentStore;
use crate::clipboard::ClipboardAccess;
use crate::error::ShareError;

/// Publishes this device's clipboard as its document in the store.
pub struct ShareService {
    store: Arc<dyn DocumentStore>,
    clipboard: Arc<dyn ClipboardAccess>,
    collection: String,
    owner_field: String,
}

impl ShareService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        clipboard: Arc<dyn ClipboardAccess>,
        collection: &str,
        owner_field: &str,
    ) -> Self {
        Self {
            store,
            clipboard,
            collection: collection.to_string(),
            owner_field: owner_field.to_string(),
        }
    }

    /// Read the clipboard and write it to `{collection}/{device_id}`.
    /// Returns the shared text.
    pub async fn share_clipboard(
        &self,
        user_id: &str,
        device_id: &str,
        device_name: &str,
    ) -> Result<String, ShareError> {
        let text = self.clipboard.read_text()?;
        if text.is_empty() {
            return Err(ShareError::EmptyClipboard);
        }

        let doc = Document::new(device_id)
            .with_field(self.owner_field.as_str(), user_id)
            .with_field("name", device_name)
            .with_field("latestText", text.as_str());
        self.store.upsert(&self.collection, &doc).await?;

        log::info!(
            "Shared {} chars from {} ({})",
            text.chars().count(),
            device_name,
            device_id
        );
        Ok(text)
    }
}
