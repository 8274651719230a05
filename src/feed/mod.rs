pub mod home;
pub mod loader;

pub use home::{HomeScreen, SharedClip};
pub use loader::{ClipboardFeed, FeedLoader};
