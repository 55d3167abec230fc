use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::handlers::Handlers;
use super::notifier::{
    BestEffort, CONNECTING, LISTENING, NoopNotifier, Notifier, PROCESSING_VOICE_COMMAND,
    PROCESSING_YOUTUBE_COMMAND, RECONNECTING, TRANSIENT_TEXT_DURATION,
};
use super::types::request::{ClientMessage, CommandStatus};
use super::types::response::{ServerMessage, parse_message};
use crate::Result;
use crate::error::Error;
use crate::ws::config::Config;
use crate::ws::connection::{ConnectionManager, ConnectionState, Event};
use crate::ws::error::WsError;
use crate::ws::traits::{Heartbeat, MessageParser};

/// Frame codec for the app channel.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default)]
pub struct Codec;

impl MessageParser<ServerMessage> for Codec {
    fn parse(&self, bytes: &[u8]) -> Result<Vec<ServerMessage>> {
        Ok(parse_message(bytes)?.into_iter().collect())
    }
}

impl Heartbeat for Codec {
    fn ping(&self) -> Result<String> {
        Ok(serde_json::to_string(&ClientMessage::ping())?)
    }
}

/// Persistent connection to the SARVIS app channel.
///
/// Holds at most one live transport. Once [`Client::connect`] succeeds the
/// connection is kept open until [`Client::disconnect`], reconnecting after a
/// fixed delay whenever the transport drops. Inbound frames are dispatched to
/// the [`Handlers`] supplied at connect time, in the order they arrive.
///
/// The client is cheap to clone and every clone drives the same connection,
/// so create one at startup and hand it to whatever needs it.
///
/// # Example
///
/// ```rust, no_run
/// use sarvis_client::realtime::{Client, Handlers};
/// use sarvis_client::ws::config::Config;
///
/// #[tokio::main]
/// async fn main() -> sarvis_client::Result<()> {
///     let client = Client::new("http://localhost:8000", Config::default())?;
///
///     let handlers = Handlers::default()
///         .on_connected(|established| println!("session {}", established.session_id))
///         .on_voice_command(|voice| println!("voice command: {}", voice.command));
///     client.connect("sess-123", handlers).await?;
///
///     client.send_voice_command_ack();
///     client.disconnect().await;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    /// Base HTTP origin of the backend
    host: Url,
    config: Config,
    notifier: BestEffort,
    /// The live session, if any
    session: Mutex<Option<Session>>,
}

/// One logical `connect()` session spanning any number of reconnects.
struct Session {
    connection: ConnectionManager<ServerMessage, Codec>,
    /// Cancelled on `disconnect()`; silences every handler but `on_disconnected`
    dispatch: CancellationToken,
    /// Ends once the connection loop has stopped and its events are handled
    dispatcher: JoinHandle<()>,
}

impl Client {
    /// Create a client for the backend at `host`, e.g. `http://10.0.0.5:8000`.
    pub fn new(host: &str, config: Config) -> Result<Self> {
        Self::with_notifier(host, config, Arc::new(NoopNotifier))
    }

    /// Create a client that drives `notifier` across the connection lifetime.
    pub fn with_notifier(host: &str, config: Config, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let host = Url::parse(host)?;
        if !matches!(host.scheme(), "http" | "https" | "ws" | "wss") {
            return Err(Error::validation(format!(
                "host must be an http(s) or ws(s) origin, got {}",
                host.scheme()
            )));
        }

        Ok(Self {
            inner: Arc::new(ClientInner {
                host,
                config,
                notifier: BestEffort::new(notifier),
                session: Mutex::new(None),
            }),
        })
    }

    /// WebSocket target for `session_id`: `ws(s)://<host>/ws/app/<session_id>/`.
    pub fn endpoint(&self, session_id: &str) -> Result<Url> {
        if session_id.trim().is_empty() {
            return Err(Error::validation("session id must not be empty"));
        }

        let mut url = self.inner.host.clone();
        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            _ => "ws",
        };
        url.set_scheme(scheme)
            .map_err(|()| Error::validation(format!("cannot derive a {scheme} URL from {url}")))?;
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut()
            .map_err(|()| Error::validation("host cannot carry a path"))?
            .clear()
            .extend(["ws", "app", session_id, ""]);

        Ok(url)
    }

    /// Open the channel for `session_id` and keep it open until
    /// [`Client::disconnect`].
    ///
    /// Returns once the connection loop is started, with the state already
    /// `Connecting`; `on_connected` fires when the server's handshake frame
    /// arrives. Calling this while a session is already live is a no-op. The
    /// only error is a blank `session_id`.
    pub async fn connect(&self, session_id: &str, handlers: Handlers) -> Result<()> {
        let endpoint = self.endpoint(session_id)?;

        let spent = {
            let mut session = self
                .inner
                .session
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if session
                .as_ref()
                .is_some_and(|live| !live.connection.is_closed())
            {
                #[cfg(feature = "tracing")]
                tracing::debug!(%session_id, "already connected, ignoring connect");
                return Ok(());
            }
            session.take()
        };

        // A session that gave up queues its notifier stop from the dispatcher;
        // let that land before the new session starts the notifier.
        if let Some(spent) = spent {
            _ = spent.dispatcher.await;
        }

        let mut session = self
            .inner
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if session.is_some() {
            #[cfg(feature = "tracing")]
            tracing::debug!(%session_id, "connected concurrently, ignoring connect");
            return Ok(());
        }

        let (connection, events) =
            ConnectionManager::new(endpoint.to_string(), self.inner.config.clone(), Codec)?;
        let dispatch = CancellationToken::new();

        self.inner.notifier.start();
        self.inner.notifier.update(CONNECTING);

        let dispatcher = tokio::spawn(dispatch_events(
            events,
            handlers,
            self.inner.notifier.clone(),
            dispatch.clone(),
        ));

        #[cfg(feature = "tracing")]
        tracing::info!(%endpoint, "realtime session started");

        *session = Some(Session {
            connection,
            dispatch,
            dispatcher,
        });

        Ok(())
    }

    /// Close the channel and stop retrying.
    ///
    /// The state is `Disconnected` when this returns; the notifier is stopped
    /// in the background. Safe to call at any time, including repeatedly.
    pub async fn disconnect(&self) {
        let session = self
            .inner
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(session) = session {
            session.dispatch.cancel();
            session.connection.close();

            #[cfg(feature = "tracing")]
            tracing::info!("realtime session ended");
        }

        self.inner.notifier.stop();
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or(ConnectionState::Disconnected, |s| s.connection.state())
    }

    /// Whether a transport is open right now.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|s| s.connection.is_connected())
    }

    /// Tell the server the user acknowledged a voice-triggered interaction.
    pub fn send_voice_command_ack(&self) {
        self.send(&ClientMessage::voice_call_confirmation());
    }

    /// Report the result of a playback command the server issued.
    pub fn send_youtube_command_ack(&self, status: CommandStatus) {
        self.send(&ClientMessage::youtube_command_ack(status));
    }

    /// Report the result of a playback command started on the device.
    pub fn send_youtube_command_report<S: Into<String>>(&self, command: S, status: CommandStatus) {
        self.send(&ClientMessage::youtube_command_report(command, status));
    }

    /// Send on the open transport, or log and drop the message.
    fn send(&self, message: &ClientMessage) {
        let session = self
            .inner
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let Some(live) = session.as_ref().filter(|s| s.connection.is_connected()) else {
            #[cfg(feature = "tracing")]
            tracing::warn!(?message, "not connected, dropping message");
            return;
        };

        if let Err(e) = live.connection.send(message) {
            #[cfg(feature = "tracing")]
            tracing::error!(?message, "Unable to send message: {e:?}");
            #[cfg(not(feature = "tracing"))]
            let _ = &e;
        }
    }
}

/// Turns connection events into handler calls and notification texts until
/// the connection loop stops.
///
/// Notification changes are queued, never awaited, so handlers run as soon
/// as their event arrives.
async fn dispatch_events(
    mut events: mpsc::UnboundedReceiver<Event<ServerMessage>>,
    handlers: Handlers,
    notifier: BestEffort,
    dispatch: CancellationToken,
) {
    while let Some(event) = events.recv().await {
        if dispatch.is_cancelled() {
            if matches!(event, Event::Closed) {
                handlers.disconnected();
            }
            continue;
        }

        match event {
            Event::Opened => notifier.update(LISTENING),
            Event::Message(message) => dispatch_message(message, &handlers, &notifier, &dispatch),
            Event::Error { reason } => handlers.error(WsError::transport(&reason).into()),
            Event::Closed => handlers.disconnected(),
            Event::Reconnecting { attempt, delay } => {
                #[cfg(feature = "tracing")]
                tracing::debug!(attempt, ?delay, "waiting to reconnect");
                #[cfg(not(feature = "tracing"))]
                let _ = (attempt, delay);
                notifier.update(RECONNECTING);
            }
            Event::GaveUp { attempts } => {
                #[cfg(feature = "tracing")]
                tracing::error!(attempts, "giving up on realtime session");
                #[cfg(not(feature = "tracing"))]
                let _ = attempts;
                notifier.stop();
                break;
            }
        }
    }
}

fn dispatch_message(
    message: ServerMessage,
    handlers: &Handlers,
    notifier: &BestEffort,
    dispatch: &CancellationToken,
) {
    match message {
        ServerMessage::ConnectionEstablished(established) => {
            #[cfg(feature = "tracing")]
            tracing::info!(
                session_id = %established.session_id,
                nickname = %established.user.nickname,
                "handshake received"
            );
            handlers.connected(established);
        }
        ServerMessage::VoiceCommand(voice) => {
            show_transient(notifier, PROCESSING_VOICE_COMMAND, dispatch);
            handlers.voice_command(voice);
        }
        ServerMessage::YouTubeCommand(youtube) => {
            show_transient(notifier, PROCESSING_YOUTUBE_COMMAND, dispatch);
            handlers.youtube_command(youtube);
        }
        other => {
            #[cfg(feature = "tracing")]
            tracing::debug!(message = ?other, "received");
            #[cfg(not(feature = "tracing"))]
            let _ = other;
        }
    }
}

/// Show `text`, then revert to the idle text unless the session ended first.
fn show_transient(notifier: &BestEffort, text: &'static str, dispatch: &CancellationToken) {
    notifier.update(text);

    let notifier = notifier.clone();
    let dispatch = dispatch.clone();
    tokio::spawn(async move {
        tokio::select! {
            () = dispatch.cancelled() => {}
            () = sleep(TRANSIENT_TEXT_DURATION) => {
                notifier.update(LISTENING);
            }
        }
    });
}
