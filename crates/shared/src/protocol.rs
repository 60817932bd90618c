use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Channel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleUnit {
    Deg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Connected,
    Paused,
    Resumed,
}

/// Field order is part of the wire contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WheelMessage {
    #[serde(rename = "wheel.rotation")]
    Rotation {
        timestamp: DateTime<Utc>,
        channel: Channel,
        angle: f64,
        unit: AngleUnit,
    },
    #[serde(rename = "wheel.status")]
    Status {
        timestamp: DateTime<Utc>,
        channel: Channel,
        status: StatusKind,
    },
}

impl WheelMessage {
    pub fn rotation(timestamp: DateTime<Utc>, channel: Channel, angle: f64) -> Self {
        Self::Rotation {
            timestamp,
            channel,
            angle,
            unit: AngleUnit::Deg,
        }
    }

    pub fn status(timestamp: DateTime<Utc>, channel: Channel, status: StatusKind) -> Self {
        Self::Status {
            timestamp,
            channel,
            status,
        }
    }
}
