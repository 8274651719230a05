use rand::Rng;
use serde::{Deserialize, Serialize};

const KEY_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const KEY_LEN: usize = 9;

/// One row of the clipboard feed: what a device last shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardEntry {
    pub device: String,
    pub copied_text: String,
    /// Display key for list identity. Not stored, and regenerated on every fetch.
    pub id: String,
}

impl ClipboardEntry {
    pub fn new(device: String, copied_text: String) -> Self {
        Self {
            device,
            copied_text,
            id: Self::display_key(),
        }
    }

    /// Nine random lowercase base-36 characters.
    pub fn display_key() -> String {
        let mut rng = rand::thread_rng();
        (0..KEY_LEN)
            .map(|_| KEY_ALPHABET[rng.gen_range(0..KEY_ALPHABET.len())] as char)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_key_shape() {
        let key = ClipboardEntry::display_key();
        assert_eq!(key.len(), 9);
        assert!(key
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn new_assigns_a_key() {
        let entry = ClipboardEntry::new("Phone".into(), "abc".into());
        assert_eq!(entry.device, "Phone");
        assert_eq!(entry.copied_text, "abc");
        assert_eq!(entry.id.len(), 9);
    }
}
