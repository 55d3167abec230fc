#![expect(
    clippy::module_name_repetitions,
    reason = "Connection types expose their domain in the name for clarity"
)]

use std::fmt::Debug;
use std::marker::PhantomData;
use std::time::{Duration, Instant};

use backoff::backoff::{Backoff as _, Constant};
use futures::{SinkExt as _, StreamExt as _};
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{interval, sleep};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use url::Url;

use super::config::Config;
use super::error::WsError;
use super::traits::{Heartbeat, MessageParser};
use crate::Result;
use crate::error::Error;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Broadcast channel capacity for secondary event subscribers.
const BROADCAST_CAPACITY: usize = 1024;

/// Connection state tracking.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected, either idle, waiting to retry or shut down
    Disconnected,
    /// Attempting to connect
    Connecting,
    /// Transport is open
    Connected {
        /// When the connection was established
        since: Instant,
    },
    /// The last attempt or transport failed; transitions to `Disconnected` immediately after
    Failed,
}

impl ConnectionState {
    /// Check if the connection is currently active.
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected { .. })
    }
}

/// Lifecycle and inbound traffic of a managed connection, in transport order.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum Event<M> {
    /// Transport opened
    Opened,
    /// Parsed inbound message
    Message(M),
    /// Transport failed; always followed by [`Event::Closed`]
    Error {
        /// Human-readable reason reported by the transport
        reason: String,
    },
    /// Transport closed, or an attempt ended before it opened
    Closed,
    /// Another attempt will be made after `delay`
    Reconnecting {
        /// Consecutive attempt number, starting at 1
        attempt: u32,
        /// Delay before the attempt
        delay: Duration,
    },
    /// Retry budget exhausted; the manager is shut down
    GaveUp {
        /// Consecutive attempts made
        attempts: u32,
    },
}

/// Manages WebSocket connection lifecycle, reconnection, and heartbeat.
///
/// This generic connection manager handles all WebSocket connection concerns:
/// - Establishing and maintaining at most one transport at a time
/// - Automatic reconnection with a fixed delay
/// - Keep-alive frames while connected
/// - Broadcasting lifecycle events and messages, in order, to subscribers
///
/// Dropping the manager or calling [`ConnectionManager::close`] stops the
/// background loop; no reconnection happens afterwards.
///
/// # Type Parameters
///
/// - `M`: Message type produced by the codec
/// - `C`: Codec implementing [`MessageParser<M>`] and [`Heartbeat`]
///
/// # Example
///
/// ```ignore
/// let (connection, mut events) = ConnectionManager::new(
///     "wss://example.com/ws/app/abc/".to_owned(),
///     Config::default(),
///     codec,
/// )?;
///
/// while let Some(event) = events.recv().await {
///     println!("Received: {:?}", event);
/// }
/// ```
pub struct ConnectionManager<M, C>
where
    M: Debug + Clone + Send + 'static,
    C: MessageParser<M> + Heartbeat,
{
    /// Watch channel sender for state changes
    state_tx: watch::Sender<ConnectionState>,
    /// Watch channel receiver for state changes (for use in checking the current state)
    state_rx: watch::Receiver<ConnectionState>,
    /// Sender channel for outgoing messages
    sender_tx: mpsc::UnboundedSender<String>,
    /// Broadcast sender for [`Self::subscribe`]
    broadcast_tx: broadcast::Sender<Event<M>>,
    /// Stops the connection loop
    shutdown: CancellationToken,
    _phantom: PhantomData<C>,
}

impl<M, C> ConnectionManager<M, C>
where
    M: Debug + Clone + Send + 'static,
    C: MessageParser<M> + Heartbeat,
{
    /// Create a new connection manager and start the connection loop.
    ///
    /// The returned receiver observes every event from the first connection
    /// attempt onward and never drops one; it closes once the loop stops. The
    /// state is `Connecting` from the moment this returns. The loop runs in a
    /// background task and reconnects according to the config's
    /// [`ReconnectConfig`](super::config::ReconnectConfig).
    pub fn new(
        endpoint: String,
        config: Config,
        codec: C,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Event<M>>)> {
        let url = Url::parse(&endpoint)?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(Error::validation(format!(
                "WebSocket endpoint must use ws or wss, got {}",
                url.scheme()
            )));
        }

        let (sender_tx, sender_rx) = mpsc::unbounded_channel();
        let (events_tx, events) = mpsc::unbounded_channel();
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let shutdown = CancellationToken::new();

        let connection_loop = ConnectionLoop {
            endpoint,
            config,
            codec,
            events_tx,
            broadcast_tx: broadcast_tx.clone(),
            state_tx: state_tx.clone(),
            shutdown: shutdown.clone(),
        };

        tokio::spawn(async move {
            connection_loop.run(sender_rx).await;
        });

        Ok((
            Self {
                state_tx,
                state_rx,
                sender_tx,
                broadcast_tx,
                shutdown,
                _phantom: PhantomData,
            },
            events,
        ))
    }

    /// Queue a message for the open transport.
    ///
    /// Messages queued while no transport is open are discarded before the
    /// next attempt, so callers that care should check [`Self::is_connected`].
    pub fn send<R: Serialize>(&self, request: &R) -> Result<()> {
        if self.shutdown.is_cancelled() {
            return Err(WsError::ConnectionClosed.into());
        }

        let json = serde_json::to_string(request)?;
        self.sender_tx
            .send(json)
            .map_err(|_e| WsError::ConnectionClosed)?;
        Ok(())
    }

    /// Get the current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Whether a transport is open and the manager has not been closed.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        !self.shutdown.is_cancelled() && self.state().is_connected()
    }

    /// Whether the manager was closed or gave up reconnecting.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Subscribe to connection events.
    ///
    /// Each call returns a new independent receiver that only sees events
    /// published after the call. Unlike the receiver returned by
    /// [`Self::new`], a subscriber that falls more than 1024 events behind
    /// misses the oldest ones.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event<M>> {
        self.broadcast_tx.subscribe()
    }

    /// Subscribe to connection state changes.
    #[must_use]
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Stop the connection loop.
    ///
    /// Any pending reconnect is cancelled, an open transport is sent a close
    /// frame, and the state is `Disconnected` by the time this returns. Safe to
    /// call repeatedly.
    pub fn close(&self) {
        self.shutdown.cancel();
        self.state_tx.send_replace(ConnectionState::Disconnected);
    }
}

impl<M, C> Drop for ConnectionManager<M, C>
where
    M: Debug + Clone + Send + 'static,
    C: MessageParser<M> + Heartbeat,
{
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// State owned by the background task.
struct ConnectionLoop<M, C> {
    endpoint: String,
    config: Config,
    codec: C,
    events_tx: mpsc::UnboundedSender<Event<M>>,
    broadcast_tx: broadcast::Sender<Event<M>>,
    state_tx: watch::Sender<ConnectionState>,
    shutdown: CancellationToken,
}

impl<M, C> ConnectionLoop<M, C>
where
    M: Debug + Clone + Send + 'static,
    C: MessageParser<M> + Heartbeat,
{
    /// Main connection loop with automatic reconnection.
    async fn run(self, mut sender_rx: mpsc::UnboundedReceiver<String>) {
        let mut attempt = 0_u32;
        let mut backoff: Constant = self.config.reconnect.clone().into();

        loop {
            discard_stale(&mut sender_rx);

            if self.shutdown.is_cancelled() {
                break;
            }
            self.set_state(ConnectionState::Connecting);

            #[cfg(feature = "tracing")]
            tracing::debug!(endpoint = %self.endpoint, attempt, "connecting");

            let connected = tokio::select! {
                () = self.shutdown.cancelled() => None,
                result = connect_async(self.endpoint.as_str()) => Some(result),
            };

            match connected {
                None => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(endpoint = %self.endpoint, "connect aborted by shutdown");
                }
                Some(Ok((ws_stream, _))) => {
                    attempt = 0;
                    backoff.reset();
                    self.set_state(ConnectionState::Connected {
                        since: Instant::now(),
                    });
                    self.emit(Event::Opened);

                    #[cfg(feature = "tracing")]
                    tracing::info!(endpoint = %self.endpoint, "connection opened");

                    if let Err(e) = self.handle_connection(ws_stream, &mut sender_rx).await {
                        #[cfg(feature = "tracing")]
                        tracing::warn!("Error handling connection: {e:?}");
                        self.fail(&e);
                    }
                }
                Some(Err(e)) => {
                    let error = Error::from(e);
                    #[cfg(feature = "tracing")]
                    tracing::warn!("Unable to connect: {error:?}");
                    self.fail(&error);
                }
            }

            self.set_state(ConnectionState::Disconnected);
            self.emit(Event::Closed);

            if self.shutdown.is_cancelled() {
                break;
            }

            if !self.config.reconnect.allows(attempt) {
                #[cfg(feature = "tracing")]
                tracing::warn!(attempts = attempt, "retry budget exhausted, giving up");
                self.emit(Event::GaveUp { attempts: attempt });
                self.shutdown.cancel();
                break;
            }

            attempt = attempt.saturating_add(1);
            let delay = backoff
                .next_backoff()
                .unwrap_or(self.config.reconnect.delay);
            self.emit(Event::Reconnecting { attempt, delay });

            #[cfg(feature = "tracing")]
            tracing::info!(attempt, ?delay, "reconnecting");

            tokio::select! {
                () = self.shutdown.cancelled() => break,
                () = sleep(delay) => {}
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(endpoint = %self.endpoint, "connection loop stopped");
    }

    /// Handle an active WebSocket connection until it closes.
    ///
    /// Returns `Ok` for orderly closes (peer close frame, end of stream, or
    /// local shutdown) and `Err` for transport failures.
    async fn handle_connection(
        &self,
        ws_stream: WsStream,
        sender_rx: &mut mpsc::UnboundedReceiver<String>,
    ) -> Result<()> {
        let (mut write, mut read) = ws_stream.split();

        let (ping_tx, mut ping_rx) = mpsc::unbounded_channel();
        let heartbeat_handle = tokio::spawn(heartbeat_loop(
            ping_tx,
            self.state_tx.subscribe(),
            self.config.heartbeat_interval,
        ));

        let result = loop {
            tokio::select! {
                biased;

                () = self.shutdown.cancelled() => {
                    _ = write.send(Message::Close(None)).await;
                    break Ok(());
                }

                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            #[cfg(feature = "tracing")]
                            tracing::trace!(%text, "Received WebSocket text message");

                            match self.codec.parse(text.as_bytes()) {
                                Ok(messages) => {
                                    for message in messages {
                                        self.emit(Event::Message(message));
                                    }
                                }
                                Err(e) => {
                                    #[cfg(feature = "tracing")]
                                    tracing::warn!(%text, error = %e, "Failed to parse WebSocket message");
                                    #[cfg(not(feature = "tracing"))]
                                    let _ = (&text, &e);
                                }
                            }
                        }
                        Some(Ok(Message::Close(frame))) => {
                            #[cfg(feature = "tracing")]
                            tracing::debug!(?frame, "peer closed the connection");
                            #[cfg(not(feature = "tracing"))]
                            let _ = &frame;
                            break Ok(());
                        }
                        Some(Ok(_)) => {
                            // Binary frames are not part of the protocol; control frames are
                            // answered by tungstenite.
                        }
                        Some(Err(e)) => break Err(Error::from(e)),
                        None => break Ok(()),
                    }
                }

                Some(text) = sender_rx.recv() => {
                    if let Err(e) = write.send(Message::Text(text.into())).await {
                        break Err(Error::from(e));
                    }
                }

                Some(()) = ping_rx.recv() => {
                    match self.codec.ping() {
                        Ok(ping) => {
                            if let Err(e) = write.send(Message::Text(ping.into())).await {
                                break Err(Error::from(e));
                            }
                            #[cfg(feature = "tracing")]
                            tracing::trace!("keep-alive sent");
                        }
                        Err(e) => {
                            #[cfg(feature = "tracing")]
                            tracing::error!("Unable to build keep-alive frame: {e:?}");
                            #[cfg(not(feature = "tracing"))]
                            let _ = &e;
                        }
                    }
                }
            }
        };

        heartbeat_handle.abort();

        result
    }

    /// Report a failure: `Failed` state plus an [`Event::Error`].
    fn fail(&self, error: &Error) {
        self.set_state(ConnectionState::Failed);
        let reason = match error.downcast_ref::<WsError>() {
            Some(WsError::Connection(e)) => e.to_string(),
            _ => error.inner().map(|e| e.to_string()).unwrap_or_default(),
        };
        self.emit(Event::Error { reason });
    }

    /// Publish a state unless the manager has been shut down, in which case
    /// `Disconnected` set by [`ConnectionManager::close`] must stick.
    fn set_state(&self, state: ConnectionState) {
        self.state_tx.send_if_modified(|current| {
            if self.shutdown.is_cancelled() {
                return false;
            }
            *current = state;
            true
        });
    }

    fn emit(&self, event: Event<M>) {
        if self.broadcast_tx.receiver_count() > 0 {
            _ = self.broadcast_tx.send(event.clone());
        }
        _ = self.events_tx.send(event);
    }
}

/// Ticks every `period` and asks the connection task to send a keep-alive
/// frame while the state is `Connected`. A zero period disables the heartbeat.
async fn heartbeat_loop(
    ping_tx: mpsc::UnboundedSender<()>,
    state_rx: watch::Receiver<ConnectionState>,
    period: Duration,
) {
    if period.is_zero() {
        return;
    }

    let mut ticker = interval(period);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        ticker.tick().await;

        if !state_rx.borrow().is_connected() {
            break;
        }

        if ping_tx.send(()).is_err() {
            // Connection task has terminated
            break;
        }
    }
}

/// Drop outbound frames queued while no transport was open.
fn discard_stale(sender_rx: &mut mpsc::UnboundedReceiver<String>) {
    while let Ok(text) = sender_rx.try_recv() {
        #[cfg(feature = "tracing")]
        tracing::warn!(%text, "discarding message queued while disconnected");
        #[cfg(not(feature = "tracing"))]
        let _ = &text;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::config::ReconnectConfig;

    #[derive(Clone)]
    struct EchoCodec;

    impl MessageParser<String> for EchoCodec {
        fn parse(&self, bytes: &[u8]) -> Result<Vec<String>> {
            Ok(vec![String::from_utf8_lossy(bytes).into_owned()])
        }
    }

    impl Heartbeat for EchoCodec {
        fn ping(&self) -> Result<String> {
            Ok("ping".to_owned())
        }
    }

    #[test]
    fn only_connected_is_connected() {
        assert!(
            ConnectionState::Connected {
                since: Instant::now()
            }
            .is_connected()
        );
        assert!(!ConnectionState::Connecting.is_connected());
        assert!(!ConnectionState::Disconnected.is_connected());
        assert!(!ConnectionState::Failed.is_connected());
    }

    #[tokio::test]
    async fn rejects_non_websocket_endpoint() {
        let result =
            ConnectionManager::new("http://127.0.0.1:1/".to_owned(), Config::default(), EchoCodec);

        assert!(result.is_err(), "http endpoints are not WebSocket targets");
    }

    #[tokio::test]
    async fn close_is_idempotent_and_blocks_sends() {
        let (connection, _events) =
            ConnectionManager::new("ws://127.0.0.1:1/".to_owned(), Config::default(), EchoCodec)
                .unwrap();

        connection.close();
        connection.close();

        assert_eq!(connection.state(), ConnectionState::Disconnected);
        assert!(connection.is_closed());
        assert!(!connection.is_connected());
        assert!(connection.send(&"hello").is_err(), "closed managers reject sends");
    }

    #[tokio::test]
    async fn starts_out_connecting() {
        let (connection, _events) =
            ConnectionManager::new("ws://127.0.0.1:1/".to_owned(), Config::default(), EchoCodec)
                .unwrap();

        assert_eq!(connection.state(), ConnectionState::Connecting);

        connection.close();
    }

    #[tokio::test]
    async fn refused_attempt_reports_error_then_closed_then_gives_up() {
        let config = Config::default().with_reconnect(ReconnectConfig::disabled());
        let (connection, mut events) =
            ConnectionManager::new("ws://127.0.0.1:1/".to_owned(), config, EchoCodec).unwrap();
        let mut subscriber = connection.subscribe();

        let mut seen = Vec::new();
        while let Some(event) = events.recv().await {
            seen.push(event);
        }

        assert!(
            matches!(
                seen.as_slice(),
                [Event::Error { reason }, Event::Closed, Event::GaveUp { attempts: 0 }]
                    if !reason.is_empty()
            ),
            "unexpected events: {seen:?}"
        );
        assert!(matches!(subscriber.recv().await, Ok(Event::Error { .. })));
        assert!(matches!(subscriber.recv().await, Ok(Event::Closed)));
        assert!(matches!(subscriber.recv().await, Ok(Event::GaveUp { .. })));
        assert!(connection.is_closed());
        assert_eq!(connection.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn zero_period_disables_heartbeat() {
        let (ping_tx, mut ping_rx) = mpsc::unbounded_channel();
        let (_state_tx, state_rx) = watch::channel(ConnectionState::Connected {
            since: Instant::now(),
        });

        heartbeat_loop(ping_tx, state_rx, Duration::ZERO).await;

        assert!(ping_rx.recv().await.is_none(), "no keep-alive was requested");
    }

    #[tokio::test]
    async fn heartbeat_stops_once_not_connected() {
        let (ping_tx, mut ping_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connected {
            since: Instant::now(),
        });

        let handle = tokio::spawn(heartbeat_loop(ping_tx, state_rx, Duration::from_millis(20)));

        assert_eq!(ping_rx.recv().await, Some(()));
        state_tx.send_replace(ConnectionState::Disconnected);

        handle.await.unwrap();
        while ping_rx.try_recv().is_ok() {}
        assert!(ping_rx.recv().await.is_none(), "heartbeat exited");
    }
}
