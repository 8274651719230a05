use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use super::memory::MemoryProbe;
use super::{DeviceIdentity, PlatformClass, DEVICE_ID_KEY};
use crate::error::StorageError;
use crate::storage::KeyValueStore;

/// Per-platform policy for finding and saving the device id.
#[async_trait]
pub trait IdentityStrategy: Send + Sync {
    fn platform_class(&self) -> PlatformClass;

    async fn resolve(&self) -> Result<String, StorageError>;

    async fn persist(&self, id: &str) -> Result<(), StorageError>;
}

/// Secure store, with a random v4 UUID when nothing is stored yet.
///
/// A generated id is written back so the next resolve returns the same value.
/// If that write fails the fresh id is still returned.
pub struct MobileIdentity {
    store: Arc<dyn KeyValueStore>,
}

impl MobileIdentity {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl IdentityStrategy for MobileIdentity {
    fn platform_class(&self) -> PlatformClass {
        PlatformClass::Mobile
    }

    async fn resolve(&self) -> Result<String, StorageError> {
        if let Some(id) = self.store.get(DEVICE_ID_KEY).await? {
            log::debug!("App device id loaded from secure store");
            return Ok(id);
        }

        let id = Uuid::new_v4().to_string();
        match self.store.set(DEVICE_ID_KEY, &id).await {
            Ok(()) => log::info!("New app device id generated and stored: {}", id),
            Err(e) => log::warn!("Generated app device id {} but could not store it: {}", id, e),
        }
        Ok(id)
    }

    async fn persist(&self, id: &str) -> Result<(), StorageError> {
        self.store.set(DEVICE_ID_KEY, id).await
    }
}

/// Local store, falling back to the total memory size. The fallback is not
/// written anywhere and collides across identical hardware.
pub struct OtherIdentity {
    store: Arc<dyn KeyValueStore>,
    memory: Arc<dyn MemoryProbe>,
}

impl OtherIdentity {
    pub fn new(store: Arc<dyn KeyValueStore>, memory: Arc<dyn MemoryProbe>) -> Self {
        Self { store, memory }
    }
}

#[async_trait]
impl IdentityStrategy for OtherIdentity {
    fn platform_class(&self) -> PlatformClass {
        PlatformClass::Other
    }

    async fn resolve(&self) -> Result<String, StorageError> {
        if let Some(id) = self.store.get(DEVICE_ID_KEY).await? {
            log::debug!("Device id loaded from local store");
            return Ok(id);
        }

        let bytes = self.memory.total_memory().await?;
        log::debug!("No stored device id, using total memory {}", bytes);
        Ok(bytes.to_string())
    }

    async fn persist(&self, id: &str) -> Result<(), StorageError> {
        self.store.set(DEVICE_ID_KEY, id).await
    }
}

pub struct DeviceIdentityResolver {
    platform_tag: String,
    strategy: Box<dyn IdentityStrategy>,
}

impl DeviceIdentityResolver {
    /// Pick the strategy for `platform_tag`: the secure store on mobile tags,
    /// the local store everywhere else.
    pub fn new(
        platform_tag: &str,
        secure: Arc<dyn KeyValueStore>,
        local: Arc<dyn KeyValueStore>,
        memory: Arc<dyn MemoryProbe>,
    ) -> Self {
        let strategy: Box<dyn IdentityStrategy> = match PlatformClass::from_tag(platform_tag) {
            PlatformClass::Mobile => Box::new(MobileIdentity::new(secure)),
            PlatformClass::Other => Box::new(OtherIdentity::new(local, memory)),
        };
        Self::with_strategy(platform_tag, strategy)
    }

    pub fn with_strategy(platform_tag: &str, strategy: Box<dyn IdentityStrategy>) -> Self {
        Self {
            platform_tag: platform_tag.to_string(),
            strategy,
        }
    }

    pub fn current_platform_tag(&self) -> &str {
        &self.platform_tag
    }

    pub async fn try_resolve(&self) -> Result<DeviceIdentity, StorageError> {
        let id = self.strategy.resolve().await?;
        Ok(DeviceIdentity {
            platform_class: self.strategy.platform_class(),
            id,
        })
    }

    /// Resolve the device id. Storage failures are logged and yield `None`.
    pub async fn resolve(&self) -> Option<DeviceIdentity> {
        match self.try_resolve().await {
            Ok(identity) => {
                log::info!(
                    "Device id ({:?}, {}): {}",
                    identity.platform_class,
                    self.platform_tag,
                    identity.id
                );
                Some(identity)
            }
            Err(e) => {
                log::error!("Error getting device id: {}", e);
                None
            }
        }
    }

    /// Store `id` as this device's id. Failures are logged, never returned.
    pub async fn persist(&self, id: &str) {
        match self.strategy.persist(id).await {
            Ok(()) => log::info!(
                "Device id set ({:?}): {}",
                self.strategy.platform_class(),
                id
            ),
            Err(e) => log::error!("Error setting device id: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        reads: AtomicUsize,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl KeyValueStore for CountingStore {
        async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.set(key, value).await
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Keychain("locked".to_string()))
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Keychain("locked".to_string()))
        }
    }

    /// Reads succeed, writes fail.
    struct ReadOnlyStore;

    #[async_trait]
    impl KeyValueStore for ReadOnlyStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Poisoned)
        }
    }

    struct FixedMemory(u64);

    #[async_trait]
    impl MemoryProbe for FixedMemory {
        async fn total_memory(&self) -> Result<u64, StorageError> {
            Ok(self.0)
        }
    }

    struct Backends {
        secure: Arc<CountingStore>,
        local: Arc<CountingStore>,
    }

    fn resolver(tag: &str) -> (DeviceIdentityResolver, Backends) {
        let secure = Arc::new(CountingStore::default());
        let local = Arc::new(CountingStore::default());
        let resolver = DeviceIdentityResolver::new(
            tag,
            secure.clone(),
            local.clone(),
            Arc::new(FixedMemory(8_589_934_592)),
        );
        (resolver, Backends { secure, local })
    }

    #[tokio::test]
    async fn mobile_tags_use_secure_store() {
        for tag in ["android", "ios"] {
            let (resolver, backends) = resolver(tag);
            resolver.resolve().await.unwrap();
            resolver.persist("set-by-caller").await;

            assert!(backends.secure.reads.load(Ordering::SeqCst) > 0);
            assert!(backends.secure.writes.load(Ordering::SeqCst) > 0);
            assert_eq!(backends.local.reads.load(Ordering::SeqCst), 0);
            assert_eq!(backends.local.writes.load(Ordering::SeqCst), 0);
            assert_eq!(
                backends.secure.inner.get(DEVICE_ID_KEY).await.unwrap().as_deref(),
                Some("set-by-caller")
            );
        }
    }

    #[tokio::test]
    async fn other_tags_use_local_store() {
        for tag in ["web", "macos", "linux", "windows"] {
            let (resolver, backends) = resolver(tag);
            resolver.resolve().await.unwrap();
            resolver.persist("set-by-caller").await;

            assert_eq!(backends.local.reads.load(Ordering::SeqCst), 1);
            assert_eq!(backends.local.writes.load(Ordering::SeqCst), 1);
            assert_eq!(backends.secure.reads.load(Ordering::SeqCst), 0);
            assert_eq!(backends.secure.writes.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn mobile_generates_uuid_when_absent() {
        let (resolver, _) = resolver("ios");
        let identity = resolver.resolve().await.unwrap();

        assert_eq!(identity.platform_class, PlatformClass::Mobile);
        let parsed = Uuid::parse_str(&identity.id).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[tokio::test]
    async fn mobile_resolve_is_stable_across_calls() {
        let (resolver, backends) = resolver("android");
        let first = resolver.resolve().await.unwrap();
        let second = resolver.resolve().await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(backends.secure.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn mobile_returns_stored_id_unchanged() {
        let (resolver, backends) = resolver("android");
        backends.secure.inner.set(DEVICE_ID_KEY, "not-a-uuid").await.unwrap();

        let identity = resolver.resolve().await.unwrap();
        assert_eq!(identity.id, "not-a-uuid");
        assert_eq!(backends.secure.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn mobile_still_returns_id_when_store_rejects_write() {
        let resolver = DeviceIdentityResolver::with_strategy(
            "ios",
            Box::new(MobileIdentity::new(Arc::new(ReadOnlyStore))),
        );
        let identity = resolver.resolve().await.unwrap();
        assert!(Uuid::parse_str(&identity.id).is_ok());
    }

    #[tokio::test]
    async fn other_falls_back_to_total_memory() {
        let (resolver, backends) = resolver("web");
        let identity = resolver.resolve().await.unwrap();

        assert_eq!(identity.platform_class, PlatformClass::Other);
        assert_eq!(identity.id, "8589934592");
        // the fallback is not persisted
        assert_eq!(backends.local.writes.load(Ordering::SeqCst), 0);
        assert_eq!(backends.local.inner.get(DEVICE_ID_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn other_prefers_stored_id() {
        let (resolver, backends) = resolver("macos");
        backends.local.inner.set(DEVICE_ID_KEY, "stored").await.unwrap();
        assert_eq!(resolver.resolve().await.unwrap().id, "stored");
    }

    #[tokio::test]
    async fn storage_failure_resolves_to_none() {
        let resolver = DeviceIdentityResolver::new(
            "android",
            Arc::new(BrokenStore),
            Arc::new(MemoryStore::new()),
            Arc::new(FixedMemory(1)),
        );
        assert!(resolver.resolve().await.is_none());
        assert!(matches!(
            resolver.try_resolve().await,
            Err(StorageError::Keychain(_))
        ));
    }

    #[tokio::test]
    async fn persist_swallows_storage_failure() {
        let resolver = DeviceIdentityResolver::new(
            "web",
            Arc::new(MemoryStore::new()),
            Arc::new(BrokenStore),
            Arc::new(FixedMemory(1)),
        );
        resolver.persist("abc").await;
    }

    #[test]
    fn platform_tag_is_passed_through() {
        let (resolver, _) = resolver("Web-Chrome");
        assert_eq!(resolver.current_platform_tag(), "Web-Chrome");
    }
}
