use bon::Builder;
use serde::Serialize;
use strum_macros::Display;

/// Body of the session start and end calls.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Builder)]
#[builder(on(String, into))]
pub struct SessionRequest {
    pub session_id: String,
}

/// Where a logged command came from.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum CommandType {
    /// Pressed in the app
    Button,
    /// Spoken to the device
    Voice,
}

/// Append one command to the session's audit log.
///
/// # Example
///
/// ```
/// use sarvis_client::session::types::{CommandLogRequest, CommandType};
///
/// let request = CommandLogRequest::builder()
///     .session_id("sess-123")
///     .command_type(CommandType::Voice)
///     .command_content("YOUTUBE_PAUSE")
///     .build();
///
/// assert!(request.is_success);
/// ```
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Builder)]
#[builder(on(String, into))]
pub struct CommandLogRequest {
    pub session_id: String,
    pub command_type: CommandType,
    pub command_content: String,
    #[builder(default = true)]
    pub is_success: bool,
}
