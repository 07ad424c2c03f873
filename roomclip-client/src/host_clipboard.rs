use arboard::Clipboard;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("host clipboard unavailable: {reason}")]
pub struct ClipboardCopyError {
    reason: String,
}

impl ClipboardCopyError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Write access to the operating system clipboard.
pub trait HostClipboard: Send {
    fn copy_text(&mut self, text: &str) -> Result<(), ClipboardCopyError>;
}

/// Opens a fresh arboard handle per copy; headless hosts fail here rather than at startup.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl HostClipboard for SystemClipboard {
    fn copy_text(&mut self, text: &str) -> Result<(), ClipboardCopyError> {
        let mut clipboard =
            Clipboard::new().map_err(|err| ClipboardCopyError::new(err.to_string()))?;
        clipboard
            .set_text(text.to_owned())
            .map_err(|err| ClipboardCopyError::new(err.to_string()))
    }
}
