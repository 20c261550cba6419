//! Adapter lifecycle notifications
//!
//! Observers subscribe to a broadcast channel. Publishing never blocks and
//! never fails the mutation that produced the event: events sent while
//! nobody listens are discarded, and slow subscribers observe a lag.

use log::trace;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::core::room::{ClientId, RoomName};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdapterEvent {
    RoomCreated { room: RoomName },
    RoomDeleted { room: RoomName },
    JoinedRoom { room: RoomName, client_id: ClientId },
    LeftRoom { room: RoomName, client_id: ClientId },
}

#[derive(Debug)]
pub struct EventBus {
    sender: broadcast::Sender<AdapterEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AdapterEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: AdapterEvent) {
        if self.sender.receiver_count() == 0 {
            return;
        }
        trace!("Publishing adapter event {:?}", event);
        let _ = self.sender.send(event);
    }

    pub fn publish_all(&self, events: impl IntoIterator<Item = AdapterEvent>) {
        for event in events {
            self.publish(event);
        }
    }
}
