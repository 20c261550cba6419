//! In-memory adapter
//!
//! Keeps the room map and the reverse client index behind a single lock so
//! that membership mutations and recipient computation never interleave.
//! Broadcast snapshots recipients under the lock, then resolves and
//! delivers outside of it.

use async_trait::async_trait;
use log::{debug, error, trace};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use crate::constants::DEFAULT_EVENT_CAPACITY;
use crate::core::adapter::{Adapter, BroadcastOptions};
use crate::core::encoder::PacketEncoder;
use crate::core::events::{AdapterEvent, EventBus};
use crate::core::namespace::Namespace;
use crate::core::packet::{Frame, Packet, PacketOptions};
use crate::core::room::{ClientId, Room, RoomName};
use crate::error::Result;

/// Room map plus reverse index
///
/// Invariants: every room in `rooms` has at least one member, and
/// `room ∈ index[id]` exactly when `id ∈ rooms[room]`.
#[derive(Debug, Default)]
struct Membership {
    rooms: HashMap<RoomName, Room>,
    index: HashMap<ClientId, HashSet<RoomName>>,
}

impl Membership {
    fn join(&mut self, client_id: &str, room: &str, events: &mut Vec<AdapterEvent>) {
        self.index
            .entry(client_id.to_string())
            .or_default()
            .insert(room.to_string());

        let entry = self.rooms.entry(room.to_string()).or_insert_with(|| {
            events.push(AdapterEvent::RoomCreated {
                room: room.to_string(),
            });
            Room::new()
        });

        if entry.add(client_id) {
            events.push(AdapterEvent::JoinedRoom {
                room: room.to_string(),
                client_id: client_id.to_string(),
            });
        }
    }

    fn leave(&mut self, client_id: &str, room: &str, events: &mut Vec<AdapterEvent>) {
        if let Some(rooms) = self.index.get_mut(client_id) {
            rooms.remove(room);
        }
        self.remove_member(client_id, room, events);
    }

    fn leave_all(&mut self, client_id: &str, events: &mut Vec<AdapterEvent>) {
        if let Some(rooms) = self.index.remove(client_id) {
            for room in rooms {
                self.remove_member(client_id, &room, events);
            }
        }
    }

    // Drops the room entry as soon as its last member is gone
    fn remove_member(&mut self, client_id: &str, room: &str, events: &mut Vec<AdapterEvent>) {
        let Some(entry) = self.rooms.get_mut(room) else {
            return;
        };

        if entry.remove(client_id) {
            events.push(AdapterEvent::LeftRoom {
                room: room.to_string(),
                client_id: client_id.to_string(),
            });
        }

        if entry.is_empty() {
            self.rooms.remove(room);
            events.push(AdapterEvent::RoomDeleted {
                room: room.to_string(),
            });
        }
    }

    /// Union of the members of existing target rooms, or every known
    /// client when no room is given, minus the excluded ids
    fn recipients(&self, rooms: &[RoomName], except: &HashSet<ClientId>) -> Vec<ClientId> {
        if rooms.is_empty() {
            return self
                .index
                .keys()
                .filter(|id| !except.contains(*id))
                .cloned()
                .collect();
        }

        let mut ids: HashSet<&ClientId> = HashSet::new();
        for room in rooms.iter().filter_map(|name| self.rooms.get(name)) {
            ids.extend(room.members().filter(|id| !except.contains(*id)));
        }
        ids.into_iter().cloned().collect()
    }

    #[cfg(test)]
    fn is_consistent(&self) -> bool {
        let forward = self.index.iter().all(|(id, rooms)| {
            rooms
                .iter()
                .all(|room| self.rooms.get(room).map_or(false, |r| r.contains(id)))
        });
        let backward = self.rooms.iter().all(|(name, room)| {
            !room.is_empty()
                && room.len() == room.members().count()
                && room
                    .members()
                    .all(|id| self.index.get(id).map_or(false, |rooms| rooms.contains(name)))
        });
        forward && backward
    }
}

/// Counters describing the adapter's fan-out activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdapterStats {
    pub broadcasts: u64,
    pub encodes: u64,
    pub deliveries: u64,
    /// Recipients that no longer resolved to a live connection
    pub stale_skipped: u64,
}

#[derive(Debug, Default)]
struct StatCounters {
    broadcasts: AtomicU64,
    encodes: AtomicU64,
    deliveries: AtomicU64,
    stale_skipped: AtomicU64,
}

/// Single-process adapter, the reference implementation of `Adapter`
pub struct MemoryAdapter {
    membership: RwLock<Membership>,
    namespace: Arc<dyn Namespace>,
    encoder: Arc<dyn PacketEncoder>,
    events: EventBus,
    stats: StatCounters,
}

impl MemoryAdapter {
    pub fn new(namespace: Arc<dyn Namespace>, encoder: Arc<dyn PacketEncoder>) -> Self {
        Self::with_event_capacity(namespace, encoder, DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_event_capacity(
        namespace: Arc<dyn Namespace>,
        encoder: Arc<dyn PacketEncoder>,
        event_capacity: usize,
    ) -> Self {
        Self {
            membership: RwLock::new(Membership::default()),
            namespace,
            encoder,
            events: EventBus::new(event_capacity),
            stats: StatCounters::default(),
        }
    }

    /// Members of a room, whether or not they are still connected
    pub async fn room_members(&self, room: &str) -> Vec<ClientId> {
        self.membership
            .read()
            .await
            .rooms
            .get(room)
            .map(|r| r.members().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of clients tracked in the reverse index
    pub async fn client_count(&self) -> usize {
        self.membership.read().await.index.len()
    }

    /// Whether the client has an entry in the reverse index
    pub async fn is_tracked(&self, client_id: &str) -> bool {
        self.membership.read().await.index.contains_key(client_id)
    }

    pub fn stats(&self) -> AdapterStats {
        AdapterStats {
            broadcasts: self.stats.broadcasts.load(Ordering::Relaxed),
            encodes: self.stats.encodes.load(Ordering::Relaxed),
            deliveries: self.stats.deliveries.load(Ordering::Relaxed),
            stale_skipped: self.stats.stale_skipped.load(Ordering::Relaxed),
        }
    }

    // Applies a mutation under the write lock and publishes its events
    // once the lock is released
    async fn mutate<F>(&self, apply: F)
    where
        F: FnOnce(&mut Membership, &mut Vec<AdapterEvent>),
    {
        let mut events = Vec::new();
        {
            let mut membership = self.membership.write().await;
            apply(&mut membership, &mut events);
        }
        self.events.publish_all(events);
    }
}

#[async_trait]
impl Adapter for MemoryAdapter {
    async fn join(&self, client_id: &str, room: &str) -> Result<()> {
        trace!("Client {} joining room {}", client_id, room);
        self.mutate(|m, events| m.join(client_id, room, events)).await;
        Ok(())
    }

    async fn join_all(&self, client_id: &str, rooms: &[RoomName]) -> Result<()> {
        trace!("Client {} joining rooms {:?}", client_id, rooms);
        self.mutate(|m, events| {
            for room in rooms {
                m.join(client_id, room, events);
            }
        })
        .await;
        Ok(())
    }

    async fn leave(&self, client_id: &str, room: &str) -> Result<()> {
        trace!("Client {} leaving room {}", client_id, room);
        self.mutate(|m, events| m.leave(client_id, room, events)).await;
        Ok(())
    }

    async fn leave_all(&self, client_id: &str) -> Result<()> {
        trace!("Client {} leaving all rooms", client_id);
        self.mutate(|m, events| m.leave_all(client_id, events)).await;
        Ok(())
    }

    async fn broadcast(&self, mut packet: Packet, opts: &BroadcastOptions) -> Result<()> {
        self.stats.broadcasts.fetch_add(1, Ordering::Relaxed);
        packet.nsp = self.namespace.name().to_string();

        // Encoded once, shared by every recipient
        let frames: Arc<[Frame]> = match self.encoder.encode(&packet) {
            Ok(frames) => frames.into(),
            Err(e) => {
                error!("Failed to encode packet for {}: {}", packet.nsp, e);
                return Err(e);
            }
        };
        self.stats.encodes.fetch_add(1, Ordering::Relaxed);

        let recipients = {
            let membership = self.membership.read().await;
            membership.recipients(&opts.rooms, &opts.except)
        };

        let connections = self.namespace.resolve(&recipients).await;
        let stale = recipients.len().saturating_sub(connections.len());

        let packet_opts = PacketOptions::from(opts.flags);
        let mut delivered = 0u64;
        for connection in &connections {
            match connection.packet(frames.clone(), &packet_opts) {
                Ok(()) => delivered += 1,
                Err(e) => debug!("Delivery to {} failed: {}", connection.id(), e),
            }
        }

        self.stats.deliveries.fetch_add(delivered, Ordering::Relaxed);
        self.stats
            .stale_skipped
            .fetch_add(stale as u64, Ordering::Relaxed);

        debug!(
            "Broadcast on {} to rooms {:?}: {} recipients, {} delivered, {} stale",
            packet.nsp,
            opts.rooms,
            recipients.len(),
            delivered,
            stale
        );

        Ok(())
    }

    async fn clients(&self, rooms: &[RoomName]) -> Result<Vec<ClientId>> {
        let candidates = {
            let membership = self.membership.read().await;
            membership.recipients(rooms, &HashSet::new())
        };

        Ok(self
            .namespace
            .resolve(&candidates)
            .await
            .iter()
            .map(|conn| conn.id().to_string())
            .collect())
    }

    async fn client_rooms(&self, client_id: &str) -> Result<Vec<RoomName>> {
        Ok(self
            .membership
            .read()
            .await
            .index
            .get(client_id)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn rooms(&self) -> Result<Vec<RoomName>> {
        Ok(self.membership.read().await.rooms.keys().cloned().collect())
    }

    fn subscribe(&self) -> broadcast::Receiver<AdapterEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::encoder::JsonEncoder;
    use crate::core::namespace::ConnectionRegistry;

    fn adapter() -> MemoryAdapter {
        MemoryAdapter::new(
            Arc::new(ConnectionRegistry::new("/")),
            Arc::new(JsonEncoder),
        )
    }

    #[test]
    fn test_membership_stays_consistent() {
        let mut m = Membership::default();
        let mut events = Vec::new();

        m.join("a", "r1", &mut events);
        m.join("a", "r2", &mut events);
        m.join("b", "r1", &mut events);
        assert!(m.is_consistent());

        m.leave("a", "r1", &mut events);
        assert!(m.is_consistent());
        m.leave("b", "r1", &mut events);
        assert!(m.is_consistent());
        assert!(!m.rooms.contains_key("r1"));

        m.leave_all("a", &mut events);
        assert!(m.is_consistent());
        assert!(m.rooms.is_empty());
        assert!(m.index.contains_key("b"));
        assert!(!m.index.contains_key("a"));
    }

    #[test]
    fn test_join_twice_is_idempotent() {
        let mut once = Membership::default();
        let mut twice = Membership::default();
        let mut events = Vec::new();

        once.join("a", "r", &mut events);
        twice.join("a", "r", &mut events);
        twice.join("a", "r", &mut events);

        assert_eq!(once.rooms, twice.rooms);
        assert_eq!(once.index, twice.index);
    }

    #[test]
    fn test_leave_unknown_does_not_create_index_entry() {
        let mut m = Membership::default();
        let mut events = Vec::new();

        m.leave("ghost", "r", &mut events);
        m.leave_all("ghost", &mut events);

        assert!(m.index.is_empty());
        assert!(events.is_empty());
    }

    #[test]
    fn test_recipients_union_without_duplicates() {
        let mut m = Membership::default();
        let mut events = Vec::new();
        m.join("a", "r1", &mut events);
        m.join("b", "r1", &mut events);
        m.join("b", "r2", &mut events);
        m.join("c", "r2", &mut events);

        let mut ids = m.recipients(
            &["r1".to_string(), "r2".to_string(), "missing".to_string()],
            &HashSet::new(),
        );
        ids.sort();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_events_describe_room_lifecycle() {
        let mut m = Membership::default();
        let mut events = Vec::new();

        m.join("a", "r", &mut events);
        m.leave("a", "r", &mut events);

        assert_eq!(
            events,
            vec![
                AdapterEvent::RoomCreated { room: "r".into() },
                AdapterEvent::JoinedRoom {
                    room: "r".into(),
                    client_id: "a".into()
                },
                AdapterEvent::LeftRoom {
                    room: "r".into(),
                    client_id: "a".into()
                },
                AdapterEvent::RoomDeleted { room: "r".into() },
            ]
        );
    }

    #[tokio::test]
    async fn test_join_all_tracks_every_room() {
        let adapter = adapter();
        adapter
            .join_all("a", &["r1".to_string(), "r2".to_string()])
            .await
            .unwrap();

        let mut rooms = adapter.client_rooms("a").await.unwrap();
        rooms.sort();
        assert_eq!(rooms, vec!["r1", "r2"]);
        assert!(adapter.membership.read().await.is_consistent());
    }

    #[tokio::test]
    async fn test_subscriber_sees_committed_state() {
        let adapter = adapter();
        let mut rx = adapter.subscribe();

        adapter.join("a", "r").await.unwrap();

        assert_eq!(
            rx.recv().await.unwrap(),
            AdapterEvent::RoomCreated { room: "r".into() }
        );
        assert_eq!(adapter.room_members("r").await, vec!["a".to_string()]);
    }
}
