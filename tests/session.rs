#![cfg(feature = "session")]
#![allow(clippy::unwrap_used, reason = "tests can panic on unwrap")]

use chrono::TimeZone as _;
use httpmock::{Method::POST, MockServer};
use reqwest::StatusCode;
use sarvis_client::error::{Kind, Status};
use sarvis_client::session::{
    Client,
    types::{
        CommandLogRequest, CommandLogResponse, CommandType, SessionEndResponse,
        SessionStartResponse,
    },
};
use sarvis_client::types::{DateTime, SecretString, Utc};
use serde_json::json;

fn at(hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, hour, min, 0).single().unwrap()
}

mod start {
    use super::*;

    #[tokio::test]
    async fn start_should_succeed() -> anyhow::Result<()> {
        let server = MockServer::start();
        let client = Client::new(&server.base_url())?;

        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/session/start/")
                .header("Content-Type", "application/json")
                .json_body(json!({ "session_id": "sess-123" }));
            then.status(StatusCode::CREATED).json_body(json!({
                "success": true,
                "session_id": "sess-123",
                "started_at": "2024-05-01T09:30:00Z"
            }));
        });

        let response = client.start("sess-123").await?;

        let expected = SessionStartResponse::builder()
            .success(true)
            .session_id("sess-123")
            .started_at(at(9, 30))
            .build();

        assert_eq!(response, expected);
        mock.assert();

        Ok(())
    }

    #[tokio::test]
    async fn bearer_token_should_be_sent() -> anyhow::Result<()> {
        let server = MockServer::start();
        let client = Client::new(&server.base_url())?.with_token(SecretString::from("token-1"));

        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/session/start/")
                .header("authorization", "Bearer token-1")
                .header("Content-Type", "application/json");
            then.status(StatusCode::CREATED).json_body(json!({
                "success": true,
                "session_id": 42,
                "started_at": "2024-05-01T09:30:00.000000Z"
            }));
        });

        let response = client.start("42").await?;

        assert_eq!(response.session_id, "42");
        mock.assert();

        Ok(())
    }

    #[tokio::test]
    async fn unknown_fields_should_be_tolerated() -> anyhow::Result<()> {
        let server = MockServer::start();
        let client = Client::new(&server.base_url())?;

        let mock = server.mock(|when, then| {
            when.method(POST).path("/api/session/start/");
            then.status(StatusCode::CREATED).json_body(json!({
                "success": true,
                "session_id": "sess-123",
                "started_at": "2024-05-01T09:30:00Z",
                "connection_uuid": "8f14e45f-ceea-467f-a0e6-1b8c8d5a7c11"
            }));
        });

        let response = client.start("sess-123").await?;

        assert!(response.success);
        mock.assert();

        Ok(())
    }
}

mod end {
    use super::*;

    #[tokio::test]
    async fn end_should_succeed() -> anyhow::Result<()> {
        let server = MockServer::start();
        let client = Client::new(&server.base_url())?;

        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/session/end/")
                .json_body(json!({ "session_id": "sess-123" }));
            then.status(StatusCode::OK).json_body(json!({
                "success": true,
                "session_id": "sess-123",
                "ended_at": "2024-05-01T10:15:00Z"
            }));
        });

        let response = client.end("sess-123").await?;

        let expected = SessionEndResponse::builder()
            .success(true)
            .session_id("sess-123")
            .ended_at(at(10, 15))
            .build();

        assert_eq!(response, expected);
        mock.assert();

        Ok(())
    }

    #[tokio::test]
    async fn missing_session_should_fail_with_status() -> anyhow::Result<()> {
        let server = MockServer::start();
        let client = Client::new(&server.base_url())?;

        let mock = server.mock(|when, then| {
            when.method(POST).path("/api/session/end/");
            then.status(StatusCode::NOT_FOUND).json_body(json!({
                "success": false,
                "message": "session not found"
            }));
        });

        let err = client.end("missing").await.unwrap_err();

        assert_eq!(err.kind(), Kind::Status);
        let status = err.downcast_ref::<Status>().unwrap();
        assert_eq!(status.status_code, StatusCode::NOT_FOUND);
        assert_eq!(status.path, "/api/session/end/");
        assert!(status.message.contains("session not found"));
        mock.assert();

        Ok(())
    }
}

mod command_log {
    use super::*;

    #[tokio::test]
    async fn command_log_should_succeed() -> anyhow::Result<()> {
        let server = MockServer::start();
        let client = Client::new(&server.base_url())?;

        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/session/command-log/")
                .json_body(json!({
                    "session_id": "sess-123",
                    "command_type": "VOICE",
                    "command_content": "YOUTUBE_PAUSE",
                    "is_success": true
                }));
            then.status(StatusCode::CREATED).json_body(json!({
                "success": true,
                "command_log_id": 9,
                "occurred_at": "2024-05-01T09:45:00Z"
            }));
        });

        let request = CommandLogRequest::builder()
            .session_id("sess-123")
            .command_type(CommandType::Voice)
            .command_content("YOUTUBE_PAUSE")
            .build();

        let response = client.command_log(&request).await?;

        let expected = CommandLogResponse::builder()
            .success(true)
            .command_log_id("9")
            .occurred_at(at(9, 45))
            .build();

        assert_eq!(response, expected);
        mock.assert();

        Ok(())
    }

    #[tokio::test]
    async fn invalid_payload_should_fail_with_status() -> anyhow::Result<()> {
        let server = MockServer::start();
        let client = Client::new(&server.base_url())?;

        let mock = server.mock(|when, then| {
            when.method(POST).path("/api/session/command-log/");
            then.status(StatusCode::BAD_REQUEST).json_body(json!({
                "success": false,
                "errors": { "command_type": ["not a valid choice"] }
            }));
        });

        let request = CommandLogRequest::builder()
            .session_id("sess-123")
            .command_type(CommandType::Button)
            .command_content("HOME")
            .is_success(false)
            .build();

        let err = client.command_log(&request).await.unwrap_err();

        assert_eq!(err.kind(), Kind::Status);
        assert!(err.to_string().contains("400"));
        mock.assert();

        Ok(())
    }
}
