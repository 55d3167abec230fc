//! Realtime app channel between the SARVIS backend and the mobile client.
//!
//! **Feature flag:** `realtime` (required to use this module)
//!
//! The backend relays voice and playback commands from the device to the app
//! over a WebSocket bound to a session. [`Client`] keeps that channel open for
//! as long as the session lasts and turns inbound frames into [`Handlers`]
//! callbacks.
//!
//! # Messages
//!
//! - **Inbound**: handshake, voice commands, YouTube commands, acknowledgements, pong
//! - **Outbound**: voice call confirmation, YouTube command ack and report, ping
//!
//! Inbound types this client does not recognize are logged and dropped.
//!
//! # Example
//!
//! ```rust, no_run
//! use sarvis_client::realtime::{Client, CommandStatus, Handlers};
//! use sarvis_client::ws::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = Client::new("http://localhost:8000", Config::default())?;
//!
//!     let acks = client.clone();
//!     let handlers = Handlers::default().on_youtube_command(move |youtube| {
//!         println!("playback: {}", youtube.command);
//!         acks.send_youtube_command_ack(CommandStatus::Success);
//!     });
//!
//!     client.connect("sess-123", handlers).await?;
//!     tokio::time::sleep(std::time::Duration::from_secs(60)).await;
//!     client.disconnect().await;
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod handlers;
pub mod notifier;
pub mod types;

pub use client::{Client, Codec};
pub use handlers::Handlers;
pub use notifier::{NoopNotifier, Notifier};
pub use types::request::{ClientMessage, CommandResult, CommandStatus};
pub use types::response::{
    ConnectionEstablished, Pong, ServerMessage, UserProfile, VoiceCallConfirmationAck,
    VoiceCommand, YouTubeAction, YouTubeCommand, YouTubeCommandConfirmationAck,
    YouTubeCommandReportAck, parse_message,
};
