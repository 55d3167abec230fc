//! Core WebSocket infrastructure.
//!
//! This module provides generic connection management that is specialized
//! for a concrete channel through a codec implementing the traits below.
//!
//! # Architecture
//!
//! - [`ConnectionManager`]: Generic WebSocket connection handler with heartbeat and reconnection
//! - [`MessageParser`]: Trait for parsing incoming WebSocket messages
//! - [`Heartbeat`]: Trait for building keep-alive frames
//!
//! # Example
//!
//! ```ignore
//! // Define your message type
//! #[derive(Clone, Debug, Deserialize)]
//! enum MyMessage { /* ... */ }
//!
//! let (connection, events) = ConnectionManager::new(endpoint, config, MyCodec)?;
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod traits;

pub use connection::{ConnectionManager, ConnectionState, Event};
#[expect(
    clippy::module_name_repetitions,
    reason = "WsError includes module name for clarity when used outside this module"
)]
pub use error::WsError;
pub use traits::*;
