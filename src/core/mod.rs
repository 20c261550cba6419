//! Core functionality: room membership and broadcast fan-out

pub mod adapter;
pub mod connection;
pub mod encoder;
pub mod events;
pub mod memory_adapter;
pub mod message_types;
pub mod namespace;
pub mod packet;
pub mod room;
pub mod server;

// Re-export main components for convenience
pub use adapter::{Adapter, BroadcastFlags, BroadcastOptions};
pub use connection::{ChannelConnection, Connection, OutboundPacket};
pub use encoder::{JsonEncoder, PacketEncoder};
pub use events::{AdapterEvent, EventBus};
pub use memory_adapter::{AdapterStats, MemoryAdapter};
pub use namespace::{ConnectionRegistry, Namespace, SharedConnection};
pub use packet::{Frame, Packet, PacketOptions, PacketType};
pub use room::{ClientId, Room, RoomName};
pub use server::NamespaceServer;
