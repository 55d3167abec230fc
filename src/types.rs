//! Re-exported types from external crates for convenience.
//!
//! These types are commonly used in this crate and are re-exported here
//! so users don't need to add these dependencies to their `Cargo.toml`.

/// Date and time types for timestamps in envelopes and API responses.
pub use chrono::{DateTime, Utc};
/// Secret string type used for bearer tokens.
pub use secrecy::SecretString;
