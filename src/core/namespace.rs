//! Namespace seam consumed by the adapter
//!
//! A namespace provides the name stamped into broadcast packets and the
//! lookup from client id to live connection.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::core::connection::Connection;
use crate::core::room::ClientId;

pub type SharedConnection = Arc<dyn Connection>;

#[async_trait]
pub trait Namespace: Send + Sync {
    fn name(&self) -> &str;

    /// Look up the live connection of a client
    async fn connection(&self, client_id: &str) -> Option<SharedConnection>;

    /// Resolve many ids at once, silently skipping the ones that are gone
    async fn resolve(&self, client_ids: &[ClientId]) -> Vec<SharedConnection> {
        let mut resolved = Vec::with_capacity(client_ids.len());
        for id in client_ids {
            if let Some(conn) = self.connection(id).await {
                resolved.push(conn);
            }
        }
        resolved
    }
}

/// In-memory registry of the live connections of one namespace
pub struct ConnectionRegistry {
    name: String,
    connections: RwLock<HashMap<ClientId, SharedConnection>>,
}

impl ConnectionRegistry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            connections: RwLock::new(HashMap::new()),
        }
    }

    // Register a new client connection
    pub async fn register(&self, connection: SharedConnection) {
        let id = connection.id().to_string();
        self.connections.write().await.insert(id, connection);
    }

    // Remove a client connection, returns whether it was registered
    pub async fn unregister(&self, client_id: &str) -> bool {
        self.connections.write().await.remove(client_id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }
}

#[async_trait]
impl Namespace for ConnectionRegistry {
    fn name(&self) -> &str {
        &self.name
    }

    async fn connection(&self, client_id: &str) -> Option<SharedConnection> {
        self.connections.read().await.get(client_id).cloned()
    }

    // Single lock acquisition for the whole batch
    async fn resolve(&self, client_ids: &[ClientId]) -> Vec<SharedConnection> {
        let connections = self.connections.read().await;
        client_ids
            .iter()
            .filter_map(|id| connections.get(id).cloned())
            .collect()
    }
}
