//! The adapter seam
//!
//! An adapter tracks which rooms each client belongs to and fans packets
//! out to the matching clients. `MemoryAdapter` is the single-process
//! implementation; a distributed replacement implements the same trait.
//!
//! Every operation is asynchronous so that callers treat all adapters the
//! same way, including ones that need network round-trips. A returned
//! future only resolves after the operation's effects are committed.

use async_trait::async_trait;
use std::collections::HashSet;
use tokio::sync::broadcast;

use crate::core::events::AdapterEvent;
use crate::core::packet::Packet;
pub use crate::core::packet::BroadcastFlags;
use crate::core::room::{ClientId, RoomName};
use crate::error::Result;

/// Targeting and delivery options of a single broadcast
#[derive(Debug, Clone, Default)]
pub struct BroadcastOptions {
    /// Target rooms, empty means every known client
    pub rooms: Vec<RoomName>,
    /// Clients that must not receive the packet
    pub except: HashSet<ClientId>,
    pub flags: BroadcastFlags,
}

impl BroadcastOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a target room
    pub fn to(mut self, room: impl Into<RoomName>) -> Self {
        self.rooms.push(room.into());
        self
    }

    /// Exclude a client from the recipients
    pub fn except(mut self, client_id: impl Into<ClientId>) -> Self {
        self.except.insert(client_id.into());
        self
    }

    pub fn volatile(mut self) -> Self {
        self.flags.volatile = true;
        self
    }

    pub fn compress(mut self, compress: bool) -> Self {
        self.flags.compress = compress;
        self
    }
}

#[async_trait]
pub trait Adapter: Send + Sync {
    /// Add a client to a room
    async fn join(&self, client_id: &str, room: &str) -> Result<()>;

    /// Add a client to several rooms at once
    async fn join_all(&self, client_id: &str, rooms: &[RoomName]) -> Result<()>;

    /// Remove a client from a room
    async fn leave(&self, client_id: &str, room: &str) -> Result<()>;

    /// Remove a client from every room and forget it
    async fn leave_all(&self, client_id: &str) -> Result<()>;

    /// Encode a packet once and deliver it to every targeted live client
    async fn broadcast(&self, packet: Packet, opts: &BroadcastOptions) -> Result<()>;

    /// Live clients of the given rooms, or of the whole namespace if empty
    async fn clients(&self, rooms: &[RoomName]) -> Result<Vec<ClientId>>;

    /// Rooms a client currently belongs to
    async fn client_rooms(&self, client_id: &str) -> Result<Vec<RoomName>>;

    /// Names of all existing rooms
    async fn rooms(&self) -> Result<Vec<RoomName>>;

    /// Observe room lifecycle notifications
    fn subscribe(&self) -> broadcast::Receiver<AdapterEvent>;
}
