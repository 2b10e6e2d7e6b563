use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Where a raw string came from. Camera frames arrive as a continuous stream
/// and are subject to the re-entrancy guard; the others are discrete actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanSource {
    Camera,
    Clipboard,
    Image,
}

impl ScanSource {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Camera => "camera",
            Self::Clipboard => "clipboard",
            Self::Image => "image",
        }
    }

    #[must_use]
    pub fn is_continuous(&self) -> bool {
        matches!(self, Self::Camera)
    }
}

impl fmt::Display for ScanSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown scan source: {0}")]
pub struct UnknownSource(pub String);

impl FromStr for ScanSource {
    type Err = UnknownSource;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "camera" => Ok(Self::Camera),
            "clipboard" => Ok(Self::Clipboard),
            "image" => Ok(Self::Image),
            other => Err(UnknownSource(other.to_string())),
        }
    }
}

/// One user action's input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInput {
    pub text: String,
    pub source: ScanSource,
}

impl RawInput {
    pub fn new(text: impl Into<String>, source: ScanSource) -> Self {
        Self {
            text: text.into(),
            source,
        }
    }

    pub fn camera(text: impl Into<String>) -> Self {
        Self::new(text, ScanSource::Camera)
    }

    pub fn clipboard(text: impl Into<String>) -> Self {
        Self::new(text, ScanSource::Clipboard)
    }

    pub fn image(text: impl Into<String>) -> Self {
        Self::new(text, ScanSource::Image)
    }
}
