use bon::Builder;
use serde::Deserialize;
use serde_json::Value;
use strum_macros::Display;

use crate::Result;
use crate::serde_helpers::deserialize_with_warnings;
use crate::ws::WsError;

/// Top-level message pushed by the server on the app channel.
///
/// Dispatch is keyed on the `type` field. Types this client does not know
/// decode to [`ServerMessage::Unknown`] so that new server messages never
/// break an existing client.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Handshake confirming the server accepted the session
    #[serde(rename = "connection_established")]
    ConnectionEstablished(ConnectionEstablished),
    /// Wake-word or voice command relayed from the device
    #[serde(rename = "voice_command")]
    VoiceCommand(VoiceCommand),
    /// Playback command relayed from the device
    #[serde(rename = "youtube_command")]
    YouTubeCommand(YouTubeCommand),
    /// Server acknowledged a `voice_call_confirmation`
    #[serde(rename = "voice_call_confirmation_ack")]
    VoiceCallConfirmationAck(VoiceCallConfirmationAck),
    /// Server acknowledged a `youtube_command_ack`
    #[serde(rename = "youtube_command_confirmation_ack")]
    YouTubeCommandConfirmationAck(YouTubeCommandConfirmationAck),
    /// Server acknowledged a `youtube_command_report`
    #[serde(rename = "youtube_command_report_ack")]
    YouTubeCommandReportAck(YouTubeCommandReportAck),
    /// Reply to a keep-alive `ping`
    #[serde(rename = "pong")]
    Pong(Pong),
    /// Any `type` this client does not recognize
    #[serde(other)]
    Unknown,
}

/// Handshake payload.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Builder)]
pub struct ConnectionEstablished {
    /// Server greeting
    #[serde(default)]
    #[builder(default)]
    pub message: String,
    /// Session the server bound this connection to
    pub session_id: String,
    /// Account owning the session
    pub user: UserProfile,
}

/// Account summary included in the handshake.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Builder)]
pub struct UserProfile {
    pub uid: String,
    pub login_id: String,
    pub nickname: String,
}

/// Voice command payload, e.g. the wake word `SARVIS`.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Builder)]
pub struct VoiceCommand {
    pub command: String,
    /// Timestamp as forwarded by the server
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Playback command payload.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Builder)]
pub struct YouTubeCommand {
    pub command: YouTubeAction,
    /// Timestamp as forwarded by the server
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Playback actions the server may request.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Display)]
pub enum YouTubeAction {
    #[serde(rename = "YOUTUBE_OPEN")]
    #[strum(serialize = "YOUTUBE_OPEN")]
    Open,
    #[serde(rename = "YOUTUBE_SEEK_FORWARD")]
    #[strum(serialize = "YOUTUBE_SEEK_FORWARD")]
    SeekForward,
    #[serde(rename = "YOUTUBE_SEEK_BACKWARD")]
    #[strum(serialize = "YOUTUBE_SEEK_BACKWARD")]
    SeekBackward,
    #[serde(rename = "YOUTUBE_PAUSE")]
    #[strum(serialize = "YOUTUBE_PAUSE")]
    Pause,
    #[serde(rename = "YOUTUBE_PLAY")]
    #[strum(serialize = "YOUTUBE_PLAY")]
    Play,
    /// An action this client does not know
    #[serde(other)]
    #[strum(serialize = "UNKNOWN")]
    Unknown,
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VoiceCallConfirmationAck {
    /// Whether a voice call was pending on the server
    pub confirmed: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub session_id: String,
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct YouTubeCommandConfirmationAck {
    /// Whether a playback command was pending on the server
    pub confirmed: bool,
    /// Execution result recorded by the server; absent when nothing was pending
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub session_id: String,
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct YouTubeCommandReportAck {
    pub confirmed: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub session_id: String,
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Pong {
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Parse one text frame into a [`ServerMessage`].
///
/// Malformed JSON and frames without a string `type` are errors. Unknown
/// types are logged and yield `None`.
pub fn parse_message(bytes: &[u8]) -> Result<Option<ServerMessage>> {
    let value: Value = serde_json::from_slice(bytes).map_err(WsError::MessageParse)?;

    let Some(kind) = value.get("type").and_then(Value::as_str).map(str::to_owned) else {
        return Err(crate::error::Error::validation(
            "frame is missing a string `type` field",
        ));
    };

    let message: ServerMessage = deserialize_with_warnings(value)?;

    if matches!(message, ServerMessage::Unknown) {
        #[cfg(feature = "tracing")]
        tracing::info!(%kind, "ignoring unknown message type");
        #[cfg(not(feature = "tracing"))]
        let _ = &kind;
        return Ok(None);
    }

    Ok(Some(message))
}
