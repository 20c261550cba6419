//! Roomcast - room membership tracking and broadcast fan-out
//!
//! This library provides the in-memory adapter that maps clients to
//! rooms and delivers one encoded packet to every matching client,
//! together with a small WebSocket namespace server built on top of it.

pub mod config;
pub mod constants;
pub mod core;
pub mod error;
pub mod handlers;

// Re-export main components
pub use config::*;
pub use constants::*;
