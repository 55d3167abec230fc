//! Realtime channel walkthrough: start a session, listen for device commands
//! for a minute, acknowledge them, then end the session.
//!
//! Run with tracing enabled:
//! ```sh
//! SARVIS_HOST=http://localhost:8000 SARVIS_TOKEN=... \
//!     RUST_LOG=info,hyper_util=off,hyper=off,reqwest=off,rustls=off \
//!     cargo run --example realtime --features tracing
//! ```

use std::time::Duration;

use sarvis_client::HOST_VAR;
use sarvis_client::realtime::{self, CommandStatus, Handlers, YouTubeAction};
use sarvis_client::session::{self, types::CommandLogRequest, types::CommandType};
use sarvis_client::types::SecretString;
use sarvis_client::ws::config::Config;
use tracing::{info, warn};

const TOKEN_VAR: &str = "SARVIS_TOKEN";
const SESSION_VAR: &str = "SARVIS_SESSION_ID";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let host = std::env::var(HOST_VAR).unwrap_or_else(|_| "http://localhost:8000".to_owned());
    let session_id = std::env::var(SESSION_VAR).unwrap_or_else(|_| "demo-session".to_owned());

    let mut sessions = session::Client::new(&host)?;
    if let Ok(token) = std::env::var(TOKEN_VAR) {
        sessions = sessions.with_token(SecretString::from(token));
    }

    match sessions.start(&session_id).await {
        Ok(started) => info!(endpoint = "session_start", started_at = %started.started_at),
        Err(e) => warn!(endpoint = "session_start", error = %e),
    }

    let client = realtime::Client::new(&host, Config::default())?;
    let endpoint = client.endpoint(&session_id)?;
    info!(%endpoint, "opening realtime channel");

    let acks = client.clone();
    let log = sessions.clone();
    let log_session = session_id.clone();
    let handlers = Handlers::default()
        .on_connected(|established| {
            info!(
                event = "connected",
                session_id = %established.session_id,
                nickname = %established.user.nickname
            );
        })
        .on_voice_command(|voice| info!(event = "voice_command", command = %voice.command))
        .on_youtube_command(move |youtube| {
            let supported = youtube.command != YouTubeAction::Unknown;
            info!(event = "youtube_command", command = %youtube.command, supported);
            acks.send_youtube_command_ack(CommandStatus::from(supported));

            let request = CommandLogRequest::builder()
                .session_id(log_session.as_str())
                .command_type(CommandType::Voice)
                .command_content(youtube.command.to_string())
                .is_success(supported)
                .build();
            let log = log.clone();
            tokio::spawn(async move {
                if let Err(e) = log.command_log(&request).await {
                    warn!(endpoint = "command_log", error = %e);
                }
            });
        })
        .on_error(|e| warn!(event = "error", error = %e))
        .on_disconnected(|| info!(event = "disconnected"));

    client.connect(&session_id, handlers).await?;

    tokio::time::sleep(Duration::from_secs(60)).await;
    info!(state = ?client.state(), connected = client.is_connected());

    client.disconnect().await;

    match sessions.end(&session_id).await {
        Ok(ended) => info!(endpoint = "session_end", ended_at = %ended.ended_at),
        Err(e) => warn!(endpoint = "session_end", error = %e),
    }

    Ok(())
}
