// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tracklink Contributors

//! Telemetry link client: connection state machine, heartbeat, backoff.
//!
//! A [`TelemetryLink`] owns at most one live transport at a time. It never
//! buffers: a send on a closed link returns `false` and the caller routes
//! the payload to the uplink queue instead. Reconnection scheduling lives
//! in [`crate::reconnect`]; this module supplies the state machine and the
//! backoff arithmetic.

use std::collections::VecDeque;
use std::time::Duration;

use rand::Rng;
use tl_core::protocol::{DownlinkMessage, UplinkMessage};
use tokio::sync::mpsc;
use tracing::debug;

use crate::transport::{Transport, TransportError, WebSocketTransport};

/// Error type for link operations.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Not connected.
    #[error("not connected to telemetry server")]
    NotConnected,
}

/// Result type for link operations.
pub type LinkResult<T> = Result<T, LinkError>;

/// Observable state of the telemetry connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No connection, no reconnect pending.
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// Connected to the telemetry server.
    Connected,
    /// Waiting out a backoff delay before the next attempt.
    Reconnecting {
        /// 1-based attempt number of the upcoming attempt.
        attempt: u32,
        /// The jittered wait before that attempt, in milliseconds.
        wait_ms: u64,
    },
}

/// Configuration for the telemetry link.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// URL of the telemetry server.
    pub url: String,
    /// Initial delay for exponential backoff (milliseconds).
    pub base_backoff_ms: u64,
    /// Cap on the exponential backoff delay (milliseconds).
    pub max_backoff_ms: u64,
    /// Upper bound (exclusive) of the uniform additive jitter
    /// (milliseconds).
    pub jitter_ms: u64,
    /// Heartbeat ping interval (milliseconds).
    pub heartbeat_interval_ms: u64,
    /// Maximum reconnection attempts (0 = unlimited).
    pub max_retries: u32,
    /// Bound on outstanding unanswered pings kept for RTT matching.
    pub max_outstanding_pings: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig {
            url: "ws://localhost:9100/ws".to_string(),
            base_backoff_ms: 500,
            max_backoff_ms: 8000,
            jitter_ms: 200,
            heartbeat_interval_ms: 5000,
            max_retries: 0,
            max_outstanding_pings: 8,
        }
    }
}

/// The backoff delay scheduled for a reconnect cycle, before jitter.
///
/// `min(max_backoff, base * 2^attempt)`; `attempt` is 0-based.
pub fn scheduled_backoff(config: &LinkConfig, attempt: u32) -> Duration {
    let exp = config
        .base_backoff_ms
        .saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(exp.min(config.max_backoff_ms))
}

/// Scheduled backoff plus uniform jitter in `[0, jitter_ms)`.
///
/// The jitter desynchronizes retry storms across clients that lost the
/// same server at the same moment.
pub fn jittered_backoff(config: &LinkConfig, attempt: u32) -> Duration {
    let jitter = if config.jitter_ms == 0 {
        0
    } else {
        rand::thread_rng().gen_range(0..config.jitter_ms)
    };
    scheduled_backoff(config, attempt) + Duration::from_millis(jitter)
}

/// A ping awaiting its pong, keyed by the echoed timestamp.
#[derive(Debug, Clone, Copy)]
struct OutstandingPing {
    /// Bit pattern of the ping's `t`, matched exactly against the pong.
    key: u64,
    /// Monotonic send time in milliseconds.
    sent_ms: u64,
}

/// Sender abstraction used by the uplink queue to flush payloads.
///
/// Returns `true` when the payload was handed to the network, `false`
/// when the link is down (the queue stops flushing on `false`).
pub trait PayloadSender {
    fn send_payload<'a>(
        &'a mut self,
        msg: &'a UplinkMessage,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = bool> + Send + 'a>>;
}

/// Client for the telemetry connection.
///
/// Generic over [`Transport`] so tests can inject a mock.
pub struct TelemetryLink<T: Transport = WebSocketTransport> {
    config: LinkConfig,
    transport: T,
    status: ConnectionStatus,
    /// 0-based backoff attempt for the next reconnect cycle.
    attempt: u32,
    /// Set by `disconnect()`; suppresses the auto-reconnect path.
    manual_close: bool,
    pings: VecDeque<OutstandingPing>,
    last_rtt_ms: Option<u64>,
    status_subscribers: Vec<mpsc::UnboundedSender<ConnectionStatus>>,
}

impl TelemetryLink<WebSocketTransport> {
    /// Create a link with the default WebSocket transport.
    pub fn new(config: LinkConfig) -> Self {
        Self::with_transport(config, WebSocketTransport::new())
    }
}

impl<T: Transport> TelemetryLink<T> {
    /// Create a link with a custom transport (for testing).
    pub fn with_transport(config: LinkConfig, transport: T) -> Self {
        TelemetryLink {
            config,
            transport,
            status: ConnectionStatus::Disconnected,
            attempt: 0,
            manual_close: false,
            pings: VecDeque::new(),
            last_rtt_ms: None,
            status_subscribers: Vec::new(),
        }
    }

    /// The link configuration.
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Current connection status.
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected && self.transport.is_connected()
    }

    /// True after a manual `disconnect()`; auto-reconnect must not run.
    pub fn manually_closed(&self) -> bool {
        self.manual_close
    }

    /// Most recent heartbeat round-trip time, if any pong has matched.
    pub fn last_rtt_ms(&self) -> Option<u64> {
        self.last_rtt_ms
    }

    /// Subscribe to connection status transitions.
    ///
    /// Every transition is delivered in order; a dropped receiver is
    /// pruned on the next emit.
    pub fn subscribe_status(&mut self) -> mpsc::UnboundedReceiver<ConnectionStatus> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.status_subscribers.push(tx);
        rx
    }

    pub(crate) fn set_status(&mut self, status: ConnectionStatus) {
        if self.status == status {
            return;
        }
        self.status = status;
        self.status_subscribers
            .retain(|tx| tx.send(status).is_ok());
    }

    /// Connect to the telemetry server.
    ///
    /// Idempotent against an already-open connection: a second call is a
    /// no-op. Clears the manual-close flag and resets backoff state.
    pub async fn connect(&mut self) -> LinkResult<()> {
        if self.is_connected() {
            return Ok(());
        }
        self.manual_close = false;
        self.attempt = 0;
        self.open().await
    }

    /// One connection attempt against the configured URL.
    ///
    /// Used both by `connect()` and by the reconnect path; does not touch
    /// the manual-close flag or the attempt counter on entry.
    pub(crate) async fn open(&mut self) -> LinkResult<()> {
        self.set_status(ConnectionStatus::Connecting);

        let url = self.config.url.clone();
        match self.transport.connect(&url).await {
            Ok(()) => {
                self.attempt = 0;
                self.pings.clear();
                self.set_status(ConnectionStatus::Connected);
                Ok(())
            }
            Err(e) => {
                self.set_status(ConnectionStatus::Disconnected);
                Err(e.into())
            }
        }
    }

    /// Manually close the connection and suppress auto-reconnect.
    pub async fn disconnect(&mut self) {
        self.manual_close = true;
        self.pings.clear();
        if let Err(e) = self.transport.disconnect().await {
            debug!("error closing transport: {e}");
        }
        self.set_status(ConnectionStatus::Disconnected);
    }

    /// Replace the transport wholesale with a freshly-connected one.
    ///
    /// Used by the reconnect path. Rejected (transport dropped) when a
    /// manual `disconnect()` happened while the reconnect was in flight,
    /// so a late success cannot resurrect a closed session.
    pub fn adopt(&mut self, transport: T) {
        if self.manual_close {
            debug!("dropping late reconnect result after manual close");
            return;
        }
        self.transport = transport;
        self.attempt = 0;
        self.pings.clear();
        self.set_status(ConnectionStatus::Connected);
    }

    /// Send a payload over the live connection.
    ///
    /// Returns `false` without side effects when no connection is open.
    /// Never queues; buffering is the uplink queue's responsibility. A
    /// send failure closes the link (the transport is already broken) and
    /// also returns `false`.
    pub async fn send(&mut self, msg: &UplinkMessage) -> bool {
        if !self.is_connected() {
            return false;
        }
        match self.transport.send(msg).await {
            Ok(()) => true,
            Err(e) => {
                debug!("send failed, marking link down: {e}");
                self.set_status(ConnectionStatus::Disconnected);
                false
            }
        }
    }

    /// Receive the next message from the server.
    ///
    /// `Ok(None)` means the connection closed; the status moves to
    /// `Disconnected` and the caller decides whether to reconnect.
    pub async fn recv(&mut self) -> LinkResult<Option<DownlinkMessage>> {
        if !self.is_connected() {
            return Err(LinkError::NotConnected);
        }
        match self.transport.recv().await {
            Ok(Some(msg)) => Ok(Some(msg)),
            Ok(None) => {
                self.set_status(ConnectionStatus::Disconnected);
                Ok(None)
            }
            Err(e) => {
                self.set_status(ConnectionStatus::Disconnected);
                Err(e.into())
            }
        }
    }

    /// Send a heartbeat ping stamped `epoch_t` at monotonic `now_ms`.
    ///
    /// The ping is tracked in a bounded set keyed by the exact timestamp
    /// the server will echo back; when the set is full the oldest
    /// unanswered entry is evicted. Returns whether the ping was sent.
    pub async fn send_heartbeat(&mut self, epoch_t: f64, now_ms: u64) -> bool {
        let msg = UplinkMessage::ping(epoch_t);
        if !self.send(&msg).await {
            return false;
        }
        if self.pings.len() >= self.config.max_outstanding_pings {
            self.pings.pop_front();
        }
        self.pings.push_back(OutstandingPing {
            key: epoch_t.to_bits(),
            sent_ms: now_ms,
        });
        true
    }

    /// Match a pong's echoed timestamp against outstanding pings.
    ///
    /// On a match, returns the round-trip time in milliseconds and
    /// records it; an unmatched pong (already evicted, or from a previous
    /// connection) returns `None` and is otherwise ignored.
    pub fn note_pong(&mut self, echoed_t: f64, now_ms: u64) -> Option<u64> {
        let key = echoed_t.to_bits();
        let idx = self.pings.iter().position(|p| p.key == key)?;
        let ping = self.pings.remove(idx)?;
        let rtt = now_ms.saturating_sub(ping.sent_ms);
        self.last_rtt_ms = Some(rtt);
        Some(rtt)
    }

    /// Number of pings awaiting a pong.
    pub fn outstanding_pings(&self) -> usize {
        self.pings.len()
    }

    /// Current 0-based backoff attempt counter.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Compute the jittered wait for the next reconnect cycle and advance
    /// the attempt counter.
    ///
    /// Returns the 1-based attempt number and the wait. The counter only
    /// resets on a successful open.
    pub fn next_backoff(&mut self) -> (u32, Duration) {
        let wait = jittered_backoff(&self.config, self.attempt);
        self.attempt = self.attempt.saturating_add(1);
        (self.attempt, wait)
    }
}

impl<T: Transport> PayloadSender for TelemetryLink<T> {
    fn send_payload<'a>(
        &'a mut self,
        msg: &'a UplinkMessage,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = bool> + Send + 'a>> {
        Box::pin(self.send(msg))
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
