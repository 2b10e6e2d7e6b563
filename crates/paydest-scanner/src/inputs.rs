use std::path::Path;

use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("clipboard is empty")]
    EmptyClipboard,
    #[error("no code found in image")]
    NoCodeFound,
    #[error("clipboard error: {0}")]
    Clipboard(String),
    #[error("image decode error: {0}")]
    Image(String),
}

#[async_trait]
pub trait ClipboardReader: Send + Sync {
    /// `Ok(None)` when the clipboard holds no text.
    async fn read_text(&self) -> Result<Option<String>, InputError>;
}

#[async_trait]
pub trait ImageDecoder: Send + Sync {
    /// `Ok(None)` when the image contains no recognizable code.
    async fn decode(&self, image: &Path) -> Result<Option<String>, InputError>;
}
