//! Server configuration module
//! Handles runtime configuration of the namespace server and its adapter

use crate::constants::{DEFAULT_EVENT_CAPACITY, DEFAULT_HOST, DEFAULT_NAMESPACE, DEFAULT_PORT};
use crate::error::{AdapterError, Result};
use std::env;

/// Server configuration parameters
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Name stamped into every packet broadcast by this namespace
    pub namespace: String,
    /// Buffer size of the adapter lifecycle event channel
    pub event_capacity: usize,
    /// Join each client to a room named after its own id on connect
    pub join_own_room: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            namespace: DEFAULT_NAMESPACE.to_string(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            join_own_room: true,
        }
    }
}

impl ServerConfig {
    /// Create a test configuration bound to localhost
    pub fn for_testing() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            namespace: DEFAULT_NAMESPACE.to_string(),
            event_capacity: 64,
            join_own_room: true,
        }
    }

    /// Namespace names are absolute, like paths
    fn validate_namespace(namespace: &str) -> Result<()> {
        if !namespace.starts_with('/') {
            return Err(AdapterError::Config(format!(
                "Namespace '{}' must start with '/'",
                namespace
            )));
        }
        Ok(())
    }

    fn parse_flag(value: &str) -> bool {
        value.to_lowercase() == "true" || value == "1"
    }

    /// Load configuration from environment variables if available
    pub fn from_env() -> Result<Self> {
        let host = env::var("ROOMCAST_HOST").unwrap_or(DEFAULT_HOST.to_string());

        let port = match env::var("ROOMCAST_PORT") {
            Ok(p) => p.parse().map_err(|_| {
                AdapterError::Config(format!("ROOMCAST_PORT is not a valid port: {}", p))
            })?,
            Err(_) => DEFAULT_PORT,
        };

        let namespace =
            env::var("ROOMCAST_NAMESPACE").unwrap_or(DEFAULT_NAMESPACE.to_string());
        Self::validate_namespace(&namespace)?;

        let event_capacity = match env::var("ROOMCAST_EVENT_CAPACITY") {
            Ok(c) => c.parse().map_err(|_| {
                AdapterError::Config(format!(
                    "ROOMCAST_EVENT_CAPACITY is not a valid number: {}",
                    c
                ))
            })?,
            Err(_) => DEFAULT_EVENT_CAPACITY,
        };

        if event_capacity == 0 {
            return Err(AdapterError::Config(
                "ROOMCAST_EVENT_CAPACITY must be greater than zero".to_string(),
            ));
        }

        let join_own_room = env::var("ROOMCAST_JOIN_OWN_ROOM")
            .map(|v| Self::parse_flag(&v))
            .unwrap_or(true);

        Ok(Self {
            host,
            port,
            namespace,
            event_capacity,
            join_own_room,
        })
    }
}
