pub mod firestore;
pub mod share;
pub mod types;

use async_trait::async_trait;

use crate::error::FetchError;
use types::Document;

/// A collection-oriented document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document of `collection`, in the store's iteration order.
    async fn list(&self, collection: &str) -> Result<Vec<Document>, FetchError>;

    /// Create or update `document` in place, keyed by its id.
    async fn upsert(&self, collection: &str, document: &Document) -> Result<(), FetchError>;
}

pub use firestore::FirestoreClient;
pub use share::ShareService;
pub use types::Session;
