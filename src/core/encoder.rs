//! Packet encoding
//!
//! The adapter consumes an encoder through the `PacketEncoder` trait and
//! calls it once per broadcast. `JsonEncoder` is the stateless default used
//! by the bundled server.

use serde_json::Value;

use crate::core::packet::{Frame, Packet};
use crate::error::Result;

/// Turns a packet into one or more transport frames
pub trait PacketEncoder: Send + Sync {
    fn encode(&self, packet: &Packet) -> Result<Vec<Frame>>;
}

/// Renders the packet body as a JSON text frame followed by
/// one binary frame per attachment. Binary packets carry an
/// `attachments` count so the receiver knows how many frames follow.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder;

impl PacketEncoder for JsonEncoder {
    fn encode(&self, packet: &Packet) -> Result<Vec<Frame>> {
        let mut frames = Vec::with_capacity(1 + packet.attachments.len());
        let mut body = serde_json::to_value(packet)?;
        if !packet.attachments.is_empty() {
            if let Value::Object(fields) = &mut body {
                fields.insert(
                    "attachments".to_string(),
                    Value::from(packet.attachments.len()),
                );
            }
        }
        frames.push(Frame::Text(body.to_string()));
        frames.extend(packet.attachments.iter().cloned().map(Frame::Binary));
        Ok(frames)
    }
}
