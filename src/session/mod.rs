//! SARVIS session lifecycle API.
//!
//! **Feature flag:** `session` (required to use this module)
//!
//! A session brackets one period of device control. It is started over REST,
//! its identifier is then used to open the realtime channel, and it is
//! ended once the app is done. Commands issued during the session can be
//! appended to its log.
//!
//! ## Available Endpoints
//!
//! | Endpoint | Method | Description |
//! |----------|--------|-------------|
//! | `/api/session/start/` | POST | Start a session |
//! | `/api/session/end/` | POST | End a session |
//! | `/api/session/command-log/` | POST | Log a command issued during a session |

pub mod client;
pub mod types;

pub use client::Client;
