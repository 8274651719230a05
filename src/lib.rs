pub mod clipboard;
pub mod config;
pub mod device;
pub mod error;
pub mod feed;
pub mod logging;
pub mod storage;
pub mod sync;

use std::sync::Arc;

use clipboard::{ClipboardAccess, SystemClipboard};
use config::Config;
use device::memory::SystemMemory;
use device::resolver::DeviceIdentityResolver;
use error::{InitError, ShareError, StorageError};
use feed::{ClipboardFeed, FeedLoader, HomeScreen};
use storage::database::Database;
use storage::keychain::KeychainStore;
use sync::{FirestoreClient, Session, ShareService};

/// Device identity over the OS keychain (mobile) or `clipshare.db` (other platforms).
pub fn identity_resolver(config: &Config) -> Result<DeviceIdentityResolver, StorageError> {
    let local = Arc::new(Database::new(&config.data_dir)?);
    Ok(DeviceIdentityResolver::new(
        &config.platform,
        Arc::new(KeychainStore::new()),
        local,
        Arc::new(SystemMemory),
    ))
}

/// The wired-up client: device identity, the feed and sharing against one store.
pub struct ClipShare {
    config: Config,
    identity: DeviceIdentityResolver,
    store: Arc<FirestoreClient>,
    feed: Arc<ClipboardFeed>,
    share: ShareService,
    clipboard: Arc<dyn ClipboardAccess>,
}

impl ClipShare {
    pub fn new(config: Config) -> Result<Self, InitError> {
        let store = Arc::new(
            FirestoreClient::new(&config.firestore_url, config.require_project()?)?
                .with_api_key(config.api_key.clone()),
        );
        let identity = identity_resolver(&config)?;
        let clipboard: Arc<dyn ClipboardAccess> = Arc::new(SystemClipboard::new());

        let feed = Arc::new(ClipboardFeed::new(FeedLoader::new(
            store.clone(),
            &config.collection,
            &config.owner_field,
        )));
        let share = ShareService::new(
            store.clone(),
            clipboard.clone(),
            &config.collection,
            &config.owner_field,
        );

        log::info!(
            "Store: {} (collection {})",
            store.documents_url(),
            config.collection
        );

        Ok(Self {
            config,
            identity,
            store,
            feed,
            share,
            clipboard,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn identity(&self) -> &DeviceIdentityResolver {
        &self.identity
    }

    pub fn home(&self) -> HomeScreen {
        HomeScreen::new(self.feed.clone(), self.clipboard.clone())
    }

    /// Use `token` for store calls without touching the feed.
    pub async fn set_session_token(&self, token: Option<String>) {
        self.store.set_id_token(token).await;
    }

    /// Switch the store credentials to `session` and reload the feed.
    pub async fn sign_in(&self, session: Session) -> bool {
        self.set_session_token(session.id_token).await;
        self.feed.on_session_change(Some(session.user_id)).await
    }

    pub async fn sign_out(&self) -> bool {
        self.store.set_id_token(None).await;
        self.feed.on_session_change(None).await
    }

    /// Share this device's clipboard under its resolved device id.
    pub async fn share_clipboard(&self, user_id: &str) -> Result<String, ShareError> {
        let identity = self.identity.resolve().await.ok_or(ShareError::Unidentified)?;
        self.share
            .share_clipboard(user_id, &identity.id, &self.config.device_name)
            .await
    }
}
