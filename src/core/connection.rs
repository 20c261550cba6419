//! Live connection handles
//! The adapter only needs to hand pre-encoded frames to a connection

use log::{trace, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::core::packet::{Frame, PacketOptions};
use crate::error::{AdapterError, Result};

/// A handle to a connected client that accepts encoded frames
pub trait Connection: Send + Sync {
    fn id(&self) -> &str;

    /// Queue already-encoded frames for delivery
    fn packet(&self, frames: Arc<[Frame]>, opts: &PacketOptions) -> Result<()>;
}

/// Frames queued for a single client, shared with every other recipient
#[derive(Debug, Clone)]
pub struct OutboundPacket {
    pub frames: Arc<[Frame]>,
    pub options: PacketOptions,
}

/// Connection backed by an unbounded channel drained by the socket writer
pub struct ChannelConnection {
    id: String,
    sender: mpsc::UnboundedSender<OutboundPacket>,
    writable: AtomicBool,
}

impl ChannelConnection {
    pub fn new(id: String, sender: mpsc::UnboundedSender<OutboundPacket>) -> Self {
        Self {
            id,
            sender,
            writable: AtomicBool::new(true),
        }
    }

    /// Create a connection together with the receiving end of its queue
    pub fn channel(id: String) -> (Self, mpsc::UnboundedReceiver<OutboundPacket>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(id, tx), rx)
    }

    /// Mark the underlying transport as (not) ready to accept writes
    pub fn set_writable(&self, writable: bool) {
        self.writable.store(writable, Ordering::Relaxed);
    }

    pub fn is_writable(&self) -> bool {
        self.writable.load(Ordering::Relaxed) && !self.sender.is_closed()
    }
}

impl Connection for ChannelConnection {
    fn id(&self) -> &str {
        &self.id
    }

    fn packet(&self, frames: Arc<[Frame]>, opts: &PacketOptions) -> Result<()> {
        if opts.volatile && !self.is_writable() {
            trace!("Dropping volatile packet for client {}", self.id);
            return Ok(());
        }

        self.sender
            .send(OutboundPacket {
                frames,
                options: *opts,
            })
            .map_err(|_| {
                warn!("Failed to queue packet for client {}", self.id);
                AdapterError::ConnectionClosed
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::packet::BroadcastFlags;

    fn frames() -> Arc<[Frame]> {
        Arc::from(vec![Frame::Text("{}".to_string())])
    }

    #[test]
    fn test_packet_is_queued() {
        let (conn, mut rx) = ChannelConnection::channel("a".to_string());
        let opts = PacketOptions::from(BroadcastFlags::default());

        conn.packet(frames(), &opts).unwrap();

        let queued = rx.try_recv().unwrap();
        assert_eq!(queued.frames.len(), 1);
        assert!(queued.options.pre_encoded);
    }

    #[test]
    fn test_volatile_packet_dropped_when_not_writable() {
        let (conn, mut rx) = ChannelConnection::channel("a".to_string());
        conn.set_writable(false);
        let opts = PacketOptions::from(BroadcastFlags {
            volatile: true,
            compress: false,
        });

        assert!(conn.packet(frames(), &opts).is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_closed_channel_reports_error() {
        let (conn, rx) = ChannelConnection::channel("a".to_string());
        drop(rx);
        let opts = PacketOptions::from(BroadcastFlags::default());

        let result = conn.packet(frames(), &opts);
        assert!(matches!(result, Err(AdapterError::ConnectionClosed)));
    }
}
