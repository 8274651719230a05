pub mod entry;
pub mod system;

pub use entry::ClipboardEntry;
pub use system::{ClipboardAccess, SystemClipboard};
