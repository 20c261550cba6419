//! Packets handed to the adapter and the frames they encode into

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacketType {
    Connect,
    Disconnect,
    Event,
    Ack,
    Error,
    BinaryEvent,
    BinaryAck,
}

/// A structured message addressed to a namespace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    #[serde(rename = "type")]
    pub kind: PacketType,
    /// Owning namespace, stamped by the adapter before encoding
    #[serde(default)]
    pub nsp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Binary payloads carried alongside the JSON body
    #[serde(skip)]
    pub attachments: Vec<Vec<u8>>,
}

impl Packet {
    pub fn new(kind: PacketType, data: Option<Value>) -> Self {
        Self {
            kind,
            nsp: String::new(),
            data,
            id: None,
            attachments: Vec::new(),
        }
    }

    /// Creates an event packet, `data` becomes `[event, payload]`
    pub fn event(event: &str, payload: Value) -> Self {
        Self::new(
            PacketType::Event,
            Some(Value::Array(vec![Value::String(event.to_string()), payload])),
        )
    }

    /// Attaches a binary payload and upgrades the packet to its binary variant
    pub fn with_attachment(mut self, bytes: Vec<u8>) -> Self {
        self.kind = match self.kind {
            PacketType::Event => PacketType::BinaryEvent,
            PacketType::Ack => PacketType::BinaryAck,
            other => other,
        };
        self.attachments.push(bytes);
        self
    }
}

/// A transport-level unit produced by an encoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

/// Delivery flags set by the broadcaster
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastFlags {
    /// The packet may be dropped if the connection is not ready to write
    pub volatile: bool,
    pub compress: bool,
}

/// Options passed to a connection together with the encoded frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketOptions {
    pub pre_encoded: bool,
    pub volatile: bool,
    pub compress: bool,
}

impl From<BroadcastFlags> for PacketOptions {
    fn from(flags: BroadcastFlags) -> Self {
        Self {
            pre_encoded: true,
            volatile: flags.volatile,
            compress: flags.compress,
        }
    }
}
