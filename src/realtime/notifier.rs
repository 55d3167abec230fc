#![expect(
    clippy::module_name_repetitions,
    reason = "Notifier implementations are named after the trait they implement"
)]

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::Result;

/// Shown while the first transport attempt is in flight.
pub const CONNECTING: &str = "Connecting to server...";
/// Shown while the channel is open and idle.
pub const LISTENING: &str = "Listening for voice commands...";
/// Shown briefly after a voice command arrives.
pub const PROCESSING_VOICE_COMMAND: &str = "Processing voice command...";
/// Shown briefly after a playback command arrives.
pub const PROCESSING_YOUTUBE_COMMAND: &str = "Processing YouTube command...";
/// Shown while waiting to retry a dropped connection.
pub const RECONNECTING: &str = "Reconnecting to server...";

/// How long a per-command text stays up before reverting to [`LISTENING`].
pub const TRANSIENT_TEXT_DURATION: Duration = Duration::from_secs(2);

/// Keeps the host process alive and visible while the channel is active,
/// e.g. an Android foreground-service notification.
///
/// Calls are best effort: [`Client`](super::Client) makes them from a
/// background task, logs failures and never waits on them, so a slow or
/// failing notifier cannot hold up the connection or its handlers.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    /// Post the notification. `Ok(false)` means the platform declined, for
    /// example because permission was denied.
    async fn start(&self) -> Result<bool>;

    async fn stop(&self) -> Result<()>;

    async fn update_notification(&self, text: &str) -> Result<()>;
}

/// Notifier for hosts without a notification surface.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn start(&self) -> Result<bool> {
        Ok(true)
    }

    async fn stop(&self) -> Result<()> {
        Ok(())
    }

    async fn update_notification(&self, _text: &str) -> Result<()> {
        Ok(())
    }
}

enum Request {
    Start,
    Stop,
    Update(&'static str),
}

/// Queues [`Notifier`] calls onto a background task that applies them in
/// order, logging and swallowing every failure.
///
/// Callers never wait on the platform. Text updates that arrive while the
/// notification is stopped are dropped.
#[derive(Clone)]
pub(crate) struct BestEffort {
    requests: mpsc::UnboundedSender<Request>,
    /// Taken by the first caller, which spawns the worker
    idle: Arc<Mutex<Option<(Arc<dyn Notifier>, mpsc::UnboundedReceiver<Request>)>>>,
}

impl BestEffort {
    pub(crate) fn new(notifier: Arc<dyn Notifier>) -> Self {
        let (requests, rx) = mpsc::unbounded_channel();
        Self {
            requests,
            idle: Arc::new(Mutex::new(Some((notifier, rx)))),
        }
    }

    pub(crate) fn start(&self) {
        self.enqueue(Request::Start);
    }

    pub(crate) fn stop(&self) {
        self.enqueue(Request::Stop);
    }

    pub(crate) fn update(&self, text: &'static str) {
        self.enqueue(Request::Update(text));
    }

    /// Must be called from within a Tokio runtime.
    fn enqueue(&self, request: Request) {
        let idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some((notifier, rx)) = idle {
            tokio::spawn(apply_requests(notifier, rx));
        }

        // The worker outlives every sender, so this only fails during runtime shutdown.
        _ = self.requests.send(request);
    }
}

async fn apply_requests(notifier: Arc<dyn Notifier>, mut rx: mpsc::UnboundedReceiver<Request>) {
    let mut active = false;

    while let Some(request) = rx.recv().await {
        match request {
            Request::Start => {
                active = true;
                match notifier.start().await {
                    Ok(true) => {}
                    Ok(false) => {
                        #[cfg(feature = "tracing")]
                        tracing::warn!("notification service declined to start");
                    }
                    Err(e) => {
                        #[cfg(feature = "tracing")]
                        tracing::error!("Unable to start notification service: {e:?}");
                        #[cfg(not(feature = "tracing"))]
                        let _ = &e;
                    }
                }
            }
            Request::Stop => {
                active = false;
                if let Err(e) = notifier.stop().await {
                    #[cfg(feature = "tracing")]
                    tracing::error!("Unable to stop notification service: {e:?}");
                    #[cfg(not(feature = "tracing"))]
                    let _ = &e;
                }
            }
            Request::Update(text) if active => {
                if let Err(e) = notifier.update_notification(text).await {
                    #[cfg(feature = "tracing")]
                    tracing::error!(%text, "Unable to update notification: {e:?}");
                    #[cfg(not(feature = "tracing"))]
                    let _ = &e;
                }
            }
            Request::Update(text) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(%text, "notification stopped, dropping update");
                #[cfg(not(feature = "tracing"))]
                let _ = text;
            }
        }
    }
}
