#![cfg(feature = "realtime")]
#![allow(
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    reason = "Do not need additional syntax for setting up tests"
)]
#![allow(
    unused,
    reason = "Not every test binary uses every helper"
)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use sarvis_client::Result;
use sarvis_client::error::Error;
use sarvis_client::realtime::Notifier;
use tokio::net::TcpListener;
use tokio::time::{sleep, timeout};

/// Poll `condition` until it holds, for at most three seconds.
pub async fn eventually<F: FnMut() -> bool>(mut condition: F) -> bool {
    timeout(Duration::from_secs(3), async {
        while !condition() {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .is_ok()
}

/// An address with nothing listening on it.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Accepts TCP connections but never completes a WebSocket handshake.
///
/// Returns the address and a count of accepted connections.
pub async fn silent_listener() -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let count = Arc::clone(&accepted);

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            count.fetch_add(1, Ordering::SeqCst);
            held.push(stream);
        }
    });

    (addr, accepted)
}

/// Records every notifier call, optionally failing or stalling text updates.
#[derive(Default)]
pub struct RecordingNotifier {
    texts: Mutex<Vec<String>>,
    /// `start` and `stop` calls in order
    lifecycle: Mutex<Vec<&'static str>>,
    starts: AtomicUsize,
    stops: AtomicUsize,
    fail: bool,
    stall: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Every text update hangs for an hour after being recorded.
    pub fn stalled() -> Self {
        Self {
            stall: true,
            ..Self::default()
        }
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }

    pub fn lifecycle(&self) -> Vec<&'static str> {
        self.lifecycle.lock().unwrap().clone()
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    fn outcome(&self) -> Result<()> {
        if self.fail {
            Err(Error::validation("notification permission denied"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn start(&self) -> Result<bool> {
        self.lifecycle.lock().unwrap().push("start");
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.outcome().map(|()| true)
    }

    async fn stop(&self) -> Result<()> {
        self.lifecycle.lock().unwrap().push("stop");
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.outcome()
    }

    async fn update_notification(&self, text: &str) -> Result<()> {
        self.texts.lock().unwrap().push(text.to_owned());
        if self.stall {
            sleep(Duration::from_secs(3600)).await;
        }
        self.outcome()
    }
}
