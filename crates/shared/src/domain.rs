use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CHANNEL: &str = "wheel";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Channel(String);

impl Channel {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Self(DEFAULT_CHANNEL.to_string())
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Channel {
    fn default() -> Self {
        Self(DEFAULT_CHANNEL.to_string())
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTone {
    Default,
    Connecting,
    Connected,
    Paused,
    Error,
}

impl StatusTone {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusTone::Default => "default",
            StatusTone::Connecting => "connecting",
            StatusTone::Connected => "connected",
            StatusTone::Paused => "paused",
            StatusTone::Error => "error",
        }
    }
}

/// `alpha` is rotation about the vertical axis in degrees; `absolute` marks
/// a reading anchored to an external reference frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientationSample {
    pub alpha: Option<f64>,
    pub absolute: bool,
}
