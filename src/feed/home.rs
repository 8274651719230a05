use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::loader::ClipboardFeed;
use crate::clipboard::{ClipboardAccess, ClipboardEntry};
use crate::error::ClipboardError;

/// What the "latest copied text" panel shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedClip {
    pub device: String,
    pub text: String,
}

/// View state of the home screen. Owns the shown clip; the feed list is
/// only ever written by the feed itself.
pub struct HomeScreen {
    feed: Arc<ClipboardFeed>,
    clipboard: Arc<dyn ClipboardAccess>,
    shown: Option<SharedClip>,
}

impl HomeScreen {
    pub fn new(feed: Arc<ClipboardFeed>, clipboard: Arc<dyn ClipboardAccess>) -> Self {
        Self {
            feed,
            clipboard,
            shown: None,
        }
    }

    pub async fn is_signed_in(&self) -> bool {
        self.feed.current_user().await.is_some()
    }

    pub async fn entries(&self) -> Vec<ClipboardEntry> {
        self.feed.entries().await
    }

    pub fn show(&mut self, entry: &ClipboardEntry) {
        self.shown = Some(SharedClip {
            device: entry.device.clone(),
            text: entry.copied_text.clone(),
        });
    }

    pub fn shown(&self) -> Option<&SharedClip> {
        self.shown.as_ref()
    }

    /// Copy the shown text to the system clipboard. Returns `false` when
    /// nothing is shown.
    pub fn copy_shown(&self) -> Result<bool, ClipboardError> {
        let Some(clip) = &self.shown else {
            return Ok(false);
        };
        self.clipboard.write_text(&clip.text)?;
        log::info!("Copied text from {} to clipboard", clip.device);
        Ok(true)
    }
}
