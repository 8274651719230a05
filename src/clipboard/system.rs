use crate::error::ClipboardError;

/// Text access to the platform clipboard.
pub trait ClipboardAccess: Send + Sync {
    fn read_text(&self) -> Result<String, ClipboardError>;

    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// The OS clipboard. A fresh handle is opened per call.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl SystemClipboard {
    pub fn new() -> Self {
        Self
    }

    fn open() -> Result<arboard::Clipboard, ClipboardError> {
        arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))
    }
}

impl ClipboardAccess for SystemClipboard {
    fn read_text(&self) -> Result<String, ClipboardError> {
        match Self::open()?.get_text() {
            Ok(text) => Ok(text),
            Err(arboard::Error::ContentNotAvailable) => Ok(String::new()),
            Err(e) => Err(ClipboardError::Access(e.to_string())),
        }
    }

    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        Self::open()?
            .set_text(text.to_string())
            .map_err(|e| ClipboardError::Access(e.to_string()))
    }
}
