//! WebSocket Message Types
//!
//! Messages exchanged between dashboard clients and the gateway.

use serde::{Deserialize, Serialize};

use crate::readings::Reading;

pub const TOPIC_LATEST: &str = "readings.latest";
pub const TOPIC_SYSTEM: &str = "system";

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe to topics (e.g., "readings.latest", "readings.*")
    Subscribe { topics: Vec<String> },
    Unsubscribe { topics: Vec<String> },
    /// Keepalive
    Ping,
}

/// Kind of system event pushed on the `system` topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemEvent {
    PollFailed,
    PollRecovered,
    ShuttingDown,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The newest reading changed
    Reading {
        reading: Reading,
        /// Poll sequence the reading arrived with
        seq: u64,
    },
    System {
        event: SystemEvent,
        message: String,
    },
    Subscribed { topics: Vec<String> },
    Unsubscribed { topics: Vec<String> },
    Pong,
    Error { message: String },
    Connected { connection_id: String },
}

/// Internal event routed through the hub
#[derive(Debug, Clone)]
pub struct WsEvent {
    pub topic: String,
    pub message: ServerMessage,
}

impl WsEvent {
    /// New latest reading
    pub fn latest_reading(reading: Reading, seq: u64) -> Self {
        Self {
            topic: TOPIC_LATEST.to_string(),
            message: ServerMessage::Reading { reading, seq },
        }
    }

    pub fn system(event: SystemEvent, message: impl Into<String>) -> Self {
        Self {
            topic: TOPIC_SYSTEM.to_string(),
            message: ServerMessage::System {
                event,
                message: message.into(),
            },
        }
    }
}
