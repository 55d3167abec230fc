use chrono::{DateTime, Utc};
use serde::Serialize;
use strum_macros::Display;

use crate::serde_helpers::iso8601_millis;

/// Messages the client sends on the app channel.
///
/// Every variant carries a timestamp taken when the message is built.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// The user acknowledged a voice-triggered interaction
    #[serde(rename = "voice_call_confirmation")]
    VoiceCallConfirmation {
        #[serde(serialize_with = "iso8601_millis")]
        timestamp: DateTime<Utc>,
    },
    /// Result of a playback command the server issued
    #[serde(rename = "youtube_command_ack")]
    YouTubeCommandAck { data: CommandResult },
    /// Result of a playback command the client ran on its own
    #[serde(rename = "youtube_command_report")]
    YouTubeCommandReport {
        command: String,
        status: CommandStatus,
        #[serde(serialize_with = "iso8601_millis")]
        timestamp: DateTime<Utc>,
    },
    /// Keep-alive
    #[serde(rename = "ping")]
    Ping {
        #[serde(serialize_with = "iso8601_millis")]
        timestamp: DateTime<Utc>,
    },
}

impl ClientMessage {
    #[must_use]
    pub fn voice_call_confirmation() -> Self {
        Self::VoiceCallConfirmation {
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn youtube_command_ack(status: CommandStatus) -> Self {
        Self::YouTubeCommandAck {
            data: CommandResult {
                status,
                timestamp: Utc::now(),
            },
        }
    }

    #[must_use]
    pub fn youtube_command_report<S: Into<String>>(command: S, status: CommandStatus) -> Self {
        Self::YouTubeCommandReport {
            command: command.into(),
            status,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn ping() -> Self {
        Self::Ping {
            timestamp: Utc::now(),
        }
    }
}

/// Nested payload of [`ClientMessage::YouTubeCommandAck`].
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResult {
    pub status: CommandStatus,
    #[serde(serialize_with = "iso8601_millis")]
    pub timestamp: DateTime<Utc>,
}

/// Outcome of running a command on the device.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CommandStatus {
    Success,
    Failed,
}

impl From<bool> for CommandStatus {
    fn from(success: bool) -> Self {
        if success { Self::Success } else { Self::Failed }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;
    use serde_json::{Value, json};

    use super::*;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).single().unwrap()
    }

    #[test]
    fn youtube_command_ack_nests_result_under_data() {
        let message = ClientMessage::YouTubeCommandAck {
            data: CommandResult {
                status: CommandStatus::Failed,
                timestamp: at(),
            },
        };

        let value = serde_json::to_value(&message).unwrap();

        assert_eq!(
            value,
            json!({
                "type": "youtube_command_ack",
                "data": { "status": "failed", "timestamp": "2024-05-01T09:30:00.000Z" }
            })
        );
    }

    #[test]
    fn youtube_command_report_is_flat() {
        let message = ClientMessage::YouTubeCommandReport {
            command: "YOUTUBE_PAUSE".to_owned(),
            status: CommandStatus::Success,
            timestamp: at(),
        };

        let value = serde_json::to_value(&message).unwrap();

        assert_eq!(
            value,
            json!({
                "type": "youtube_command_report",
                "command": "YOUTUBE_PAUSE",
                "status": "success",
                "timestamp": "2024-05-01T09:30:00.000Z"
            })
        );
    }

    #[test]
    fn constructors_stamp_current_time() {
        let before = Utc::now();
        let value = serde_json::to_value(ClientMessage::ping()).unwrap();

        assert_eq!(value["type"], "ping");
        let stamped = value["timestamp"].as_str().unwrap();
        let parsed = DateTime::parse_from_rfc3339(stamped)
            .unwrap()
            .with_timezone(&Utc);
        assert!(parsed >= before - chrono::Duration::milliseconds(1));
        assert!(stamped.ends_with('Z'), "UTC designator");

        let value = serde_json::to_value(ClientMessage::voice_call_confirmation()).unwrap();
        assert_eq!(value["type"], "voice_call_confirmation");
        assert!(matches!(value["timestamp"], Value::String(_)));
    }

    #[test]
    fn status_from_bool() {
        assert_eq!(CommandStatus::from(true), CommandStatus::Success);
        assert_eq!(CommandStatus::from(false).to_string(), "failed");
    }
}
