use std::fmt;
use std::sync::Arc;

use super::types::response::{ConnectionEstablished, VoiceCommand, YouTubeCommand};
use crate::error::Error;

type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Callbacks invoked by [`Client`](super::Client) as the channel progresses.
///
/// Every slot is optional; an empty slot is a no-op. The set is captured by
/// [`Client::connect`](super::Client::connect) and reused for every reconnect
/// of that session.
///
/// # Example
///
/// ```
/// use sarvis_client::realtime::Handlers;
///
/// let handlers = Handlers::default()
///     .on_connected(|established| println!("hello {}", established.user.nickname))
///     .on_voice_command(|voice| println!("voice: {}", voice.command))
///     .on_disconnected(|| println!("channel closed"));
/// ```
#[derive(Clone, Default)]
pub struct Handlers {
    connected: Option<Callback<ConnectionEstablished>>,
    voice_command: Option<Callback<VoiceCommand>>,
    youtube_command: Option<Callback<YouTubeCommand>>,
    error: Option<Callback<Error>>,
    disconnected: Option<Arc<dyn Fn() + Send + Sync>>,
}

impl Handlers {
    /// Called when the server's `connection_established` handshake arrives.
    #[must_use]
    pub fn on_connected<F>(mut self, f: F) -> Self
    where
        F: Fn(ConnectionEstablished) + Send + Sync + 'static,
    {
        self.connected = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_voice_command<F>(mut self, f: F) -> Self
    where
        F: Fn(VoiceCommand) + Send + Sync + 'static,
    {
        self.voice_command = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_youtube_command<F>(mut self, f: F) -> Self
    where
        F: Fn(YouTubeCommand) + Send + Sync + 'static,
    {
        self.youtube_command = Some(Arc::new(f));
        self
    }

    /// Called for transport failures. Reconnection proceeds regardless.
    #[must_use]
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(Error) + Send + Sync + 'static,
    {
        self.error = Some(Arc::new(f));
        self
    }

    /// Called every time the transport closes, including failed attempts.
    #[must_use]
    pub fn on_disconnected<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.disconnected = Some(Arc::new(f));
        self
    }

    pub(crate) fn connected(&self, payload: ConnectionEstablished) {
        if let Some(f) = &self.connected {
            f(payload);
        }
    }

    pub(crate) fn voice_command(&self, payload: VoiceCommand) {
        if let Some(f) = &self.voice_command {
            f(payload);
        }
    }

    pub(crate) fn youtube_command(&self, payload: YouTubeCommand) {
        if let Some(f) = &self.youtube_command {
            f(payload);
        }
    }

    pub(crate) fn error(&self, error: Error) {
        if let Some(f) = &self.error {
            f(error);
        }
    }

    pub(crate) fn disconnected(&self) {
        if let Some(f) = &self.disconnected {
            f();
        }
    }
}

impl fmt::Debug for Handlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handlers")
            .field("on_connected", &self.connected.is_some())
            .field("on_voice_command", &self.voice_command.is_some())
            .field("on_youtube_command", &self.youtube_command.is_some())
            .field("on_error", &self.error.is_some())
            .field("on_disconnected", &self.disconnected.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn empty_slots_are_no_ops() {
        let handlers = Handlers::default();

        handlers.disconnected();
        handlers.error(Error::validation("ignored"));
        handlers.voice_command(VoiceCommand::builder().command("SARVIS".to_owned()).build());
    }

    #[test]
    fn registered_slots_are_invoked() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let handlers = Handlers::default().on_disconnected(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        handlers.disconnected();
        handlers.clone().disconnected();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            format!("{handlers:?}"),
            "Handlers { on_connected: false, on_voice_command: false, on_youtube_command: false, \
             on_error: false, on_disconnected: true }"
        );
    }
}
