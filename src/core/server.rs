//! Namespace service that coordinates live connections and the adapter

use log::{debug, info};
use serde_json::Value;
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::core::adapter::{Adapter, BroadcastOptions};
use crate::core::encoder::{JsonEncoder, PacketEncoder};
use crate::core::memory_adapter::MemoryAdapter;
use crate::core::namespace::{ConnectionRegistry, Namespace, SharedConnection};
use crate::core::packet::Packet;
use crate::core::room::{ClientId, RoomName};
use crate::error::Result;

/// Owns the connection registry of one namespace and drives its adapter
pub struct NamespaceServer {
    registry: Arc<ConnectionRegistry>,
    adapter: Arc<dyn Adapter>,
    join_own_room: bool,
}

impl NamespaceServer {
    /// Create a namespace backed by the in-memory adapter
    pub fn new(config: &ServerConfig) -> Self {
        Self::with_encoder(config, Arc::new(JsonEncoder))
    }

    pub fn with_encoder(config: &ServerConfig, encoder: Arc<dyn PacketEncoder>) -> Self {
        let registry = Arc::new(ConnectionRegistry::new(config.namespace.clone()));
        let namespace: Arc<dyn Namespace> = registry.clone();
        let adapter = Arc::new(MemoryAdapter::with_event_capacity(
            namespace,
            encoder,
            config.event_capacity,
        ));
        Self::with_adapter(registry, adapter, config.join_own_room)
    }

    /// Plug in any adapter implementation over an existing registry
    pub fn with_adapter(
        registry: Arc<ConnectionRegistry>,
        adapter: Arc<dyn Adapter>,
        join_own_room: bool,
    ) -> Self {
        Self {
            registry,
            adapter,
            join_own_room,
        }
    }

    pub fn name(&self) -> &str {
        self.registry.name()
    }

    pub fn adapter(&self) -> &Arc<dyn Adapter> {
        &self.adapter
    }

    /// Register a live connection, optionally joining its private room
    pub async fn connect(&self, connection: SharedConnection) -> Result<()> {
        let client_id = connection.id().to_string();
        self.registry.register(connection).await;

        if self.join_own_room {
            self.adapter.join(&client_id, &client_id).await?;
        }

        info!("Client {} connected to namespace {}", client_id, self.name());
        Ok(())
    }

    /// Forget a connection and prune its memberships right away
    pub async fn disconnect(&self, client_id: &str) -> Result<()> {
        let was_connected = self.registry.unregister(client_id).await;
        self.adapter.leave_all(client_id).await?;

        if was_connected {
            info!("Client {} disconnected from namespace {}", client_id, self.name());
        }
        Ok(())
    }

    pub async fn join(&self, client_id: &str, room: &str) -> Result<()> {
        self.adapter.join(client_id, room).await
    }

    pub async fn leave(&self, client_id: &str, room: &str) -> Result<()> {
        self.adapter.leave(client_id, room).await
    }

    /// Emit an event to the targets described by `opts`
    pub async fn emit(&self, event: &str, data: Value, opts: &BroadcastOptions) -> Result<()> {
        debug!("Emitting '{}' on {} to {:?}", event, self.name(), opts.rooms);
        self.adapter.broadcast(Packet::event(event, data), opts).await
    }

    /// Send an event to a single client through its private room
    pub async fn emit_to(&self, client_id: &str, event: &str, data: Value) -> Result<()> {
        let opts = BroadcastOptions::new().to(client_id);
        self.emit(event, data, &opts).await
    }

    pub async fn clients(&self, rooms: &[RoomName]) -> Result<Vec<ClientId>> {
        self.adapter.clients(rooms).await
    }

    pub async fn client_rooms(&self, client_id: &str) -> Result<Vec<RoomName>> {
        self.adapter.client_rooms(client_id).await
    }

    pub async fn connection_count(&self) -> usize {
        self.registry.len().await
    }
}
