use bon::Builder;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::serde_helpers::string_or_number;

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Builder)]
#[builder(on(String, into))]
pub struct SessionStartResponse {
    pub success: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub session_id: String,
    pub started_at: DateTime<Utc>,
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Builder)]
#[builder(on(String, into))]
pub struct SessionEndResponse {
    pub success: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub session_id: String,
    pub ended_at: DateTime<Utc>,
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Builder)]
#[builder(on(String, into))]
pub struct CommandLogResponse {
    pub success: bool,
    /// Identifier of the created log entry
    #[serde(deserialize_with = "string_or_number")]
    pub command_log_id: String,
    pub occurred_at: DateTime<Utc>,
}
