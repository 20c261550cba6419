//! Message types exchanged with WebSocket clients

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Client-to-server commands
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Join a room
    #[serde(rename = "join")]
    Join { room: String },

    /// Leave a room
    #[serde(rename = "leave")]
    Leave { room: String },

    /// Emit an event to rooms, or to the whole namespace when `rooms` is empty
    #[serde(rename = "emit")]
    Emit {
        event: String,
        #[serde(default)]
        data: Value,
        #[serde(default)]
        rooms: Vec<String>,
        /// Also deliver to the sender
        #[serde(default)]
        include_self: bool,
        #[serde(default)]
        volatile: bool,
        #[serde(default)]
        compress: bool,
    },

    /// List live clients of rooms
    #[serde(rename = "clients")]
    Clients {
        #[serde(default)]
        rooms: Vec<String>,
    },
}

/// Server-to-client replies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Connection established
    #[serde(rename = "connected")]
    Connected { client_id: String, namespace: String },

    /// Client listing response
    #[serde(rename = "clients")]
    Clients {
        rooms: Vec<String>,
        clients: Vec<String>,
    },

    /// Error message
    #[serde(rename = "error")]
    Error { code: String, message: String },

    /// Success response
    #[serde(rename = "success")]
    Success { message: String },
}

impl ServerMessage {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::Success {
            message: message.into(),
        }
    }
}
