use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::clipboard::ClipboardEntry;
use crate::error::FetchError;
use crate::sync::types::Document;
use crate::sync::DocumentStore;

/// Fetches a collection and keeps the documents owned by one user.
pub struct FeedLoader {
    store: Arc<dyn DocumentStore>,
    collection: String,
    owner_field: String,
}

impl FeedLoader {
    pub fn new(store: Arc<dyn DocumentStore>, collection: &str, owner_field: &str) -> Self {
        Self {
            store,
            collection: collection.to_string(),
            owner_field: owner_field.to_string(),
        }
    }

    /// Entries shared by `user_id`'s devices, in store order.
    ///
    /// With no user the result is empty and the store is not touched. The whole
    /// collection is fetched and filtered here; the store applies no predicate.
    pub async fn load(&self, user_id: Option<&str>) -> Result<Vec<ClipboardEntry>, FetchError> {
        let Some(user_id) = user_id else {
            return Ok(Vec::new());
        };

        let documents = self.store.list(&self.collection).await?;
        let total = documents.len();
        let entries: Vec<ClipboardEntry> = documents
            .iter()
            .filter(|doc| doc.field(&self.owner_field) == Some(user_id))
            .map(project)
            .collect();

        log::debug!(
            "Loaded {} of {} {} documents for {}",
            entries.len(),
            total,
            self.collection,
            user_id
        );
        Ok(entries)
    }
}

fn project(doc: &Document) -> ClipboardEntry {
    ClipboardEntry::new(
        doc.field("name").unwrap_or_default().to_string(),
        doc.field("latestText").unwrap_or_default().to_string(),
    )
}

#[derive(Default)]
struct FeedState {
    user_id: Option<String>,
    entries: Vec<ClipboardEntry>,
}

/// The feed as the home view sees it. Reloads on every session change and
/// never surfaces a fetch error.
pub struct ClipboardFeed {
    loader: FeedLoader,
    generation: AtomicU64,
    state: RwLock<FeedState>,
}

impl ClipboardFeed {
    pub fn new(loader: FeedLoader) -> Self {
        Self {
            loader,
            generation: AtomicU64::new(0),
            state: RwLock::new(FeedState::default()),
        }
    }

    /// Reload for `user_id`, replacing the current list.
    ///
    /// Returns `true` when the result was published. A failed fetch keeps the
    /// previous list but still records the new user. A call overtaken by a
    /// later session change publishes nothing.
    pub async fn on_session_change(&self, user_id: Option<String>) -> bool {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let loaded = self.loader.load(user_id.as_deref()).await;

        let mut state = self.state.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            log::debug!("Dropping stale feed result (generation {})", generation);
            return false;
        }
        state.user_id = user_id;

        match loaded {
            Ok(entries) => {
                state.entries = entries;
                true
            }
            Err(e) => {
                log::error!("Error fetching clipboard feed: {}", e);
                false
            }
        }
    }

    pub async fn entries(&self) -> Vec<ClipboardEntry> {
        self.state.read().await.entries.clone()
    }

    pub async fn current_user(&self) -> Option<String> {
        self.state.read().await.user_id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use tokio::sync::Notify;

    fn device(id: &str, owner: &str, name: &str, text: &str) -> Document {
        Document::new(id)
            .with_field("ownerId", owner)
            .with_field("name", name)
            .with_field("latestText", text)
    }

    fn sample_documents() -> Vec<Document> {
        vec![
            device("a", "u1", "Phone", "abc"),
            device("b", "u2", "Laptop", "xyz"),
        ]
    }

    #[derive(Default)]
    struct FakeStore {
        documents: Vec<Document>,
        lists: AtomicUsize,
        fail: AtomicBool,
        /// When set, the first `list` call waits for `release`.
        gate_first: bool,
        started: Notify,
        release: Notify,
    }

    impl FakeStore {
        fn with(documents: Vec<Document>) -> Self {
            Self {
                documents,
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl DocumentStore for FakeStore {
        async fn list(&self, _collection: &str) -> Result<Vec<Document>, FetchError> {
            let call = self.lists.fetch_add(1, Ordering::SeqCst);
            if self.gate_first && call == 0 {
                self.started.notify_one();
                self.release.notified().await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(FetchError::Status {
                    status: 503,
                    message: "unavailable".to_string(),
                });
            }
            Ok(self.documents.clone())
        }

        async fn upsert(&self, _collection: &str, _document: &Document) -> Result<(), FetchError> {
            Ok(())
        }
    }

    fn loader(store: Arc<FakeStore>) -> FeedLoader {
        FeedLoader::new(store, "devices", "ownerId")
    }

    #[tokio::test]
    async fn load_without_user_is_empty_and_skips_store() {
        let store = Arc::new(FakeStore::with(sample_documents()));
        let entries = loader(store.clone()).load(None).await.unwrap();

        assert!(entries.is_empty());
        assert_eq!(store.lists.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn load_keeps_only_the_users_devices() {
        let store = Arc::new(FakeStore::with(sample_documents()));
        let entries = loader(store).load(Some("u1")).await.unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].device, "Phone");
        assert_eq!(entries[0].copied_text, "abc");
    }

    #[tokio::test]
    async fn load_preserves_store_order() {
        let store = Arc::new(FakeStore::with(vec![
            device("c", "u1", "Tablet", "3"),
            device("a", "u2", "Laptop", "x"),
            device("b", "u1", "Phone", "1"),
            device("d", "u1", "Desktop", "2"),
        ]));
        let entries = loader(store).load(Some("u1")).await.unwrap();

        let devices: Vec<&str> = entries.iter().map(|e| e.device.as_str()).collect();
        assert_eq!(devices, ["Tablet", "Phone", "Desktop"]);
    }

    #[tokio::test]
    async fn documents_without_owner_are_skipped() {
        let store = Arc::new(FakeStore::with(vec![
            Document::new("x").with_field("name", "Orphan"),
            Document::new("y").with_field("ownerId", "u1"),
        ]));
        let entries = loader(store).load(Some("u1")).await.unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].device, "");
        assert_eq!(entries[0].copied_text, "");
    }

    #[tokio::test]
    async fn display_keys_change_between_loads() {
        let store = Arc::new(FakeStore::with(sample_documents()));
        let loader = loader(store);
        let first = loader.load(Some("u1")).await.unwrap();
        let second = loader.load(Some("u1")).await.unwrap();

        assert_eq!(first[0].copied_text, second[0].copied_text);
        assert_eq!(first[0].id.len(), 9);
        assert_eq!(second[0].id.len(), 9);
    }

    #[tokio::test]
    async fn session_change_replaces_the_list() {
        let store = Arc::new(FakeStore::with(sample_documents()));
        let feed = ClipboardFeed::new(loader(store));

        assert!(feed.on_session_change(Some("u1".into())).await);
        assert_eq!(feed.entries().await[0].device, "Phone");

        assert!(feed.on_session_change(Some("u2".into())).await);
        let entries = feed.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].device, "Laptop");

        assert!(feed.on_session_change(None).await);
        assert!(feed.entries().await.is_empty());
        assert_eq!(feed.current_user().await, None);
    }

    #[tokio::test]
    async fn fetch_failure_keeps_previous_list() {
        let store = Arc::new(FakeStore::with(sample_documents()));
        let feed = ClipboardFeed::new(loader(store.clone()));
        feed.on_session_change(Some("u1".into())).await;

        store.fail.store(true, Ordering::SeqCst);
        assert!(!feed.on_session_change(Some("u2".into())).await);

        let entries = feed.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].device, "Phone");
        assert_eq!(feed.current_user().await.as_deref(), Some("u2"));
    }

    #[tokio::test]
    async fn stale_call_does_not_record_its_user() {
        let store = Arc::new(FakeStore {
            documents: sample_documents(),
            gate_first: true,
            ..Default::default()
        });
        let feed = Arc::new(ClipboardFeed::new(loader(store.clone())));

        let slow_feed = feed.clone();
        let slow =
            tokio::spawn(async move { slow_feed.on_session_change(Some("u1".into())).await });
        store.started.notified().await;

        assert!(feed.on_session_change(None).await);
        store.release.notify_one();
        assert!(!slow.await.unwrap());

        assert_eq!(feed.current_user().await, None);
        assert!(feed.entries().await.is_empty());
    }

    #[tokio::test]
    async fn stale_result_does_not_overwrite_newer_one() {
        let store = Arc::new(FakeStore {
            documents: sample_documents(),
            gate_first: true,
            ..Default::default()
        });
        let feed = Arc::new(ClipboardFeed::new(loader(store.clone())));

        let slow_feed = feed.clone();
        let slow =
            tokio::spawn(async move { slow_feed.on_session_change(Some("u1".into())).await });
        store.started.notified().await;

        assert!(feed.on_session_change(Some("u2".into())).await);
        store.release.notify_one();
        assert!(!slow.await.unwrap());

        let entries = feed.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].device, "Laptop");
        assert_eq!(feed.current_user().await.as_deref(), Some("u2"));
    }
}
