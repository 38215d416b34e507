// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tracklink Contributors

//! Background reconnection for the telemetry link.
//!
//! Runs connection attempts in a background task so the main loop stays
//! responsive while the link is down. Each successful attempt delivers a
//! freshly-connected transport over a channel; the owner installs it into
//! the [`crate::client::TelemetryLink`] wholesale. A manual disconnect
//! cancels the task deterministically through a `CancellationToken`.

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::{jittered_backoff, LinkConfig};
use crate::transport::{Transport, WebSocketTransport};

/// Connection state values for the atomic state field.
pub const STATE_DISCONNECTED: u8 = 0;
pub const STATE_CONNECTING: u8 = 1;
pub const STATE_CONNECTED: u8 = 2;
pub const STATE_RECONNECTING: u8 = 3;

/// Link state visible to both the reconnect task and the main loop.
///
/// Uses atomic fields for lock-free reads from status reporting paths.
pub struct SharedLinkState {
    state: AtomicU8,
    /// Reconnect attempt count (for status reporting).
    attempt: AtomicU32,
}

impl SharedLinkState {
    /// Create a new shared state initialized to disconnected.
    pub fn new() -> Self {
        SharedLinkState {
            state: AtomicU8::new(STATE_DISCONNECTED),
            attempt: AtomicU32::new(0),
        }
    }

    /// Get the current state.
    pub fn get(&self) -> u8 {
        self.state.load(Ordering::Acquire)
    }

    /// Set the state.
    pub fn set(&self, state: u8) {
        self.state.store(state, Ordering::Release);
    }

    /// Get the current attempt count.
    pub fn attempt(&self) -> u32 {
        self.attempt.load(Ordering::Acquire)
    }

    /// Set the attempt count.
    pub fn set_attempt(&self, attempt: u32) {
        self.attempt.store(attempt, Ordering::Release);
    }

    /// Check if currently connected.
    pub fn is_connected(&self) -> bool {
        self.get() == STATE_CONNECTED
    }

    /// Get a human-readable status string.
    pub fn status_string(&self) -> String {
        match self.get() {
            STATE_DISCONNECTED => "disconnected".to_string(),
            STATE_CONNECTING => "connecting".to_string(),
            STATE_CONNECTED => "connected".to_string(),
            STATE_RECONNECTING => {
                let attempt = self.attempt();
                if attempt > 0 {
                    format!("reconnecting (attempt {})", attempt)
                } else {
                    "reconnecting".to_string()
                }
            }
            _ => "unknown".to_string(),
        }
    }
}

impl Default for SharedLinkState {
    fn default() -> Self {
        Self::new()
    }
}

/// Events sent from the reconnect task to the main loop.
pub enum ReconnectEvent {
    /// A backoff wait has been scheduled before the given attempt.
    Waiting {
        /// 1-based attempt number of the upcoming attempt.
        attempt: u32,
        /// Jittered wait before it.
        wait: Duration,
    },
    /// Successfully connected. Contains the connected transport.
    Connected(WebSocketTransport),
    /// Retry budget exhausted (only with a non-zero `max_retries`).
    GaveUp {
        /// Number of attempts made.
        attempts: u32,
        /// Last connection error.
        error: String,
    },
}

impl std::fmt::Debug for ReconnectEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting { attempt, wait } => f
                .debug_struct("Waiting")
                .field("attempt", attempt)
                .field("wait", wait)
                .finish(),
            Self::Connected(_) => f.debug_tuple("Connected").field(&"<transport>").finish(),
            Self::GaveUp { attempts, error } => f
                .debug_struct("GaveUp")
                .field("attempts", attempts)
                .field("error", error)
                .finish(),
        }
    }
}

/// Manages the background reconnect task.
pub struct Reconnector {
    config: LinkConfig,
    shared: Arc<SharedLinkState>,
    event_tx: mpsc::Sender<ReconnectEvent>,
    cancel: CancellationToken,
}

impl Reconnector {
    /// Create a new reconnector.
    ///
    /// Returns the reconnector and a receiver for reconnect events.
    pub fn new(
        config: LinkConfig,
        shared: Arc<SharedLinkState>,
    ) -> (Self, mpsc::Receiver<ReconnectEvent>) {
        let (event_tx, event_rx) = mpsc::channel(16);
        let reconnector = Reconnector {
            config,
            shared,
            event_tx,
            cancel: CancellationToken::new(),
        };
        (reconnector, event_rx)
    }

    /// Start a reconnect cycle in the background.
    ///
    /// The result arrives through the event channel. Waits out the
    /// backoff before the first attempt; retries are unbounded unless
    /// `max_retries` is non-zero.
    pub fn spawn_reconnect(&self) {
        let config = self.config.clone();
        let shared = Arc::clone(&self.shared);
        let event_tx = self.event_tx.clone();
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            reconnect_with_backoff(config, shared, event_tx, cancel).await;
        });
    }

    /// Cancel any in-flight reconnect cycle.
    ///
    /// Pending backoff timers and connection attempts stop immediately;
    /// the token is replaced so a later `spawn_reconnect` starts fresh.
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.shared.set(STATE_DISCONNECTED);
        self.shared.set_attempt(0);
    }
}

/// Background reconnect loop with exponential backoff and jitter.
async fn reconnect_with_backoff(
    config: LinkConfig,
    shared: Arc<SharedLinkState>,
    event_tx: mpsc::Sender<ReconnectEvent>,
    cancel: CancellationToken,
) {
    let mut attempt = 0u32;

    loop {
        if cancel.is_cancelled() {
            shared.set(STATE_DISCONNECTED);
            return;
        }

        // Wait out the backoff for this cycle. The exponent is the 0-based
        // attempt; the reported number is 1-based.
        let wait = jittered_backoff(&config, attempt);
        attempt = attempt.saturating_add(1);
        shared.set(STATE_RECONNECTING);
        shared.set_attempt(attempt);
        let _ = event_tx.send(ReconnectEvent::Waiting { attempt, wait }).await;

        tokio::select! {
            _ = cancel.cancelled() => {
                shared.set(STATE_DISCONNECTED);
                return;
            }
            _ = tokio::time::sleep(wait) => {}
        }

        shared.set(STATE_CONNECTING);
        let mut transport = WebSocketTransport::new();

        let connect_result = tokio::select! {
            _ = cancel.cancelled() => {
                shared.set(STATE_DISCONNECTED);
                return;
            }
            result = transport.connect(&config.url) => result,
        };

        match connect_result {
            Ok(()) => {
                shared.set(STATE_CONNECTED);
                shared.set_attempt(0);
                let _ = event_tx.send(ReconnectEvent::Connected(transport)).await;
                return;
            }
            Err(e) => {
                debug!("reconnect attempt {attempt} failed: {e}");
                if config.max_retries > 0 && attempt >= config.max_retries {
                    shared.set(STATE_DISCONNECTED);
                    let _ = event_tx
                        .send(ReconnectEvent::GaveUp {
                            attempts: attempt,
                            error: e.to_string(),
                        })
                        .await;
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "reconnect_tests.rs"]
mod tests;
