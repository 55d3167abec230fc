#![expect(
    clippy::module_name_repetitions,
    reason = "Error types include the module name to indicate their scope"
)]

use std::error::Error as StdError;
use std::fmt;

/// Fallback reason when the transport reports an error without a usable message.
pub const DEFAULT_TRANSPORT_ERROR: &str = "WebSocket connection error";

/// WebSocket error variants.
#[non_exhaustive]
#[derive(Debug)]
pub enum WsError {
    /// Error connecting to or communicating with the WebSocket server
    Connection(tokio_tungstenite::tungstenite::Error),
    /// Error parsing a WebSocket message
    MessageParse(serde_json::Error),
    /// Transport failure reported through the event channel
    Transport {
        /// Human-readable reason
        reason: String,
    },
    /// WebSocket connection was closed
    ConnectionClosed,
}

impl WsError {
    /// Build a transport error, substituting [`DEFAULT_TRANSPORT_ERROR`] for a blank reason.
    #[must_use]
    pub fn transport(reason: &str) -> Self {
        let reason = reason.trim();
        Self::Transport {
            reason: if reason.is_empty() {
                DEFAULT_TRANSPORT_ERROR.to_owned()
            } else {
                reason.to_owned()
            },
        }
    }
}

impl fmt::Display for WsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection(e) => write!(f, "WebSocket connection error: {e}"),
            Self::MessageParse(e) => write!(f, "Failed to parse WebSocket message: {e}"),
            Self::Transport { reason } => write!(f, "WebSocket transport error: {reason}"),
            Self::ConnectionClosed => write!(f, "WebSocket connection closed"),
        }
    }
}

impl StdError for WsError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Connection(e) => Some(e),
            Self::MessageParse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<WsError> for crate::error::Error {
    fn from(e: WsError) -> Self {
        crate::error::Error::with_source(crate::error::Kind::WebSocket, e)
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for crate::error::Error {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        crate::error::Error::with_source(crate::error::Kind::WebSocket, WsError::Connection(e))
    }
}
