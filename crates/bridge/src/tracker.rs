// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tracklink Contributors

//! The tracker event loop: ties location ingestion, the telemetry link,
//! drop accounting, and the uplink queue together.
//!
//! Single-threaded cooperative: one `select!` loop on a current-thread
//! runtime. Every payload takes the same path: try the live link first,
//! fall back to the durable queue, and drain the queue whenever the link
//! comes back.

use std::time::Duration;

use chrono::Utc;
use tl_core::clock::{ClockSource, SystemClock};
use tl_core::fix::Fix;
use tl_core::frame::DropAccounting;
use tl_core::protocol::{DownlinkMessage, UplinkMessage, UplinkMeta};
use tl_core::smooth::{FixSmoother, SmootherConfig};
use tl_link::client::TelemetryLink;
use tl_link::location::LocationUpdate;
use tl_link::queue::{UplinkQueue, DEFAULT_FLUSH_LIMIT};
use tl_link::reconnect::{ReconnectEvent, Reconnector};
use tl_link::transport::{Transport, WebSocketTransport};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Tuning for the tracker loop.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// How often the smoothed position is reported upstream.
    pub report_interval_ms: u64,
    /// Items drained from the queue per flush pass.
    pub flush_limit: usize,
    /// Metadata stamped on GPS payloads.
    pub meta: UplinkMeta,
    /// Smoother tuning.
    pub smoother: SmootherConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            report_interval_ms: 1000,
            flush_limit: DEFAULT_FLUSH_LIMIT,
            meta: UplinkMeta::default(),
            smoother: SmootherConfig::default(),
        }
    }
}

/// Core tracker state, generic over the transport for testing.
pub struct Tracker<T: Transport = WebSocketTransport> {
    link: TelemetryLink<T>,
    queue: UplinkQueue,
    accounting: DropAccounting,
    smoother: FixSmoother,
    meta: UplinkMeta,
    flush_limit: usize,
}

impl<T: Transport> Tracker<T> {
    /// Assemble a tracker from its parts.
    pub fn new(link: TelemetryLink<T>, queue: UplinkQueue, config: TrackerConfig) -> Self {
        Tracker {
            link,
            queue,
            accounting: DropAccounting::new(),
            smoother: FixSmoother::new(config.smoother),
            meta: config.meta,
            flush_limit: config.flush_limit,
        }
    }

    /// The underlying link.
    pub fn link(&self) -> &TelemetryLink<T> {
        &self.link
    }

    /// Mutable access to the underlying link.
    pub fn link_mut(&mut self) -> &mut TelemetryLink<T> {
        &mut self.link
    }

    /// Drop accounting totals for status reporting.
    pub fn accounting(&self) -> &DropAccounting {
        &self.accounting
    }

    /// Current queue depth.
    pub fn queue_depth(&self) -> usize {
        self.queue.depth()
    }

    /// Ingest a validated fix into the smoother.
    pub fn ingest_fix(&mut self, fix: Fix, now_ms: u64) {
        self.smoother.push(fix, now_ms);
    }

    /// Handle one inbound message from the server.
    pub fn handle_downlink(&mut self, msg: &DownlinkMessage, now_ms: u64) {
        match msg {
            DownlinkMessage::Pong(pong) => {
                if let Some(rtt) = self.link.note_pong(pong.t, now_ms) {
                    debug!("heartbeat rtt {rtt}ms");
                }
            }
            DownlinkMessage::Frame(frame) => {
                let before = self.accounting.total_drops();
                self.accounting.observe_status(&frame.status);
                let after = self.accounting.total_drops();
                if after > before {
                    debug!(
                        "frame loss: seq {} total {} (network {})",
                        frame.status.seq,
                        after,
                        self.accounting.local_drop_estimate()
                    );
                }
            }
        }
    }

    /// Report the current smoothed position upstream.
    ///
    /// Sends over the live link when possible; otherwise the payload goes
    /// to the durable queue. Returns whether anything was produced.
    pub async fn report_position(&mut self, epoch_t: f64, now_ms: u64) -> bool {
        let displayed = self.smoother.tick(now_ms);
        let Some(fix) = displayed.fix else {
            return false;
        };
        if displayed.stale {
            debug!("skipping stale fix (age {:?}ms)", displayed.age_ms);
            return false;
        }

        let msg = UplinkMessage::gps(epoch_t, &fix, self.meta.clone());
        if !self.link.send(&msg).await {
            let depth = self.queue.enqueue(msg, epoch_t);
            debug!("link down, queued payload (depth {depth})");
        }
        true
    }

    /// Record an operator mark, queueing it when the link is down.
    pub async fn mark(&mut self, epoch_t: f64, note: impl Into<String>) {
        let msg = UplinkMessage::mark(epoch_t, note);
        if !self.link.send(&msg).await {
            self.queue.enqueue(msg, epoch_t);
        }
    }

    /// Drain queued payloads through the live link.
    pub async fn flush_queue(&mut self) {
        if self.queue.is_empty() {
            return;
        }
        let outcome = self.queue.flush(&mut self.link, self.flush_limit).await;
        if outcome.sent > 0 {
            info!(
                "flushed {} queued payloads ({} remaining)",
                outcome.sent, outcome.remaining
            );
        }
    }
}

/// Epoch time in seconds, as stamped on wire payloads.
pub fn epoch_now() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

/// An operator mark note from a raw stdin line, if the line has one.
///
/// Leading/trailing whitespace is stripped; blank lines produce no mark.
fn mark_note(line: &str) -> Option<&str> {
    let note = line.trim();
    if note.is_empty() {
        None
    } else {
        Some(note)
    }
}

/// Run the tracker loop until the location stream ends and the queue is
/// drained, or ctrl-c.
pub async fn run(
    mut tracker: Tracker<WebSocketTransport>,
    mut updates: mpsc::Receiver<LocationUpdate>,
    mut reconnector: Reconnector,
    mut reconnect_rx: mpsc::Receiver<ReconnectEvent>,
    config: &TrackerConfig,
) {
    let clock = SystemClock;
    let mut report = tokio::time::interval(Duration::from_millis(config.report_interval_ms));
    let heartbeat_ms = tracker.link().config().heartbeat_interval_ms;
    let mut heartbeat = tokio::time::interval(Duration::from_millis(heartbeat_ms));
    let mut reconnect_inflight = false;
    let mut updates_done = false;

    // Operator marks arrive as lines on stdin, one note per line.
    let mut stdin_lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_done = false;

    loop {
        // Extract connection state before the select so guards do not
        // borrow the tracker while the recv future holds it.
        let is_connected = tracker.link().is_connected();

        tokio::select! {
            update = updates.recv(), if !updates_done => {
                match update {
                    Some(LocationUpdate::Fix(fix)) => {
                        tracker.ingest_fix(fix, clock.now_ms());
                    }
                    Some(LocationUpdate::Error(e)) => {
                        warn!("location source: {e}");
                    }
                    None => {
                        info!("location stream ended");
                        updates_done = true;
                    }
                }
            }

            _ = report.tick() => {
                tracker.report_position(epoch_now(), clock.now_ms()).await;
                if updates_done && tracker.queue_depth() == 0 {
                    break;
                }
            }

            _ = heartbeat.tick(), if is_connected => {
                tracker.link_mut().send_heartbeat(epoch_now(), clock.now_ms()).await;
            }

            msg = tracker.link_mut().recv(), if is_connected => {
                match msg {
                    Ok(Some(inbound)) => {
                        tracker.handle_downlink(&inbound, clock.now_ms());
                    }
                    Ok(None) => {
                        warn!("connection closed by server");
                    }
                    Err(e) => {
                        warn!("connection lost: {e}");
                    }
                }
            }

            line = stdin_lines.next_line(), if !stdin_done => {
                match line {
                    Ok(Some(line)) => {
                        if let Some(note) = mark_note(&line) {
                            info!("mark: {note}");
                            tracker.mark(epoch_now(), note).await;
                        }
                    }
                    Ok(None) | Err(_) => {
                        stdin_done = true;
                    }
                }
            }

            event = reconnect_rx.recv() => {
                match event {
                    Some(ReconnectEvent::Waiting { attempt, wait }) => {
                        info!("reconnecting: attempt {attempt} in {}ms", wait.as_millis());
                    }
                    Some(ReconnectEvent::Connected(transport)) => {
                        reconnect_inflight = false;
                        tracker.link_mut().adopt(transport);
                        if tracker.link().is_connected() {
                            info!("reconnected");
                            tracker.flush_queue().await;
                        }
                    }
                    Some(ReconnectEvent::GaveUp { attempts, error }) => {
                        warn!("giving up after {attempts} attempts: {error}");
                        break;
                    }
                    None => break,
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }

        if !tracker.link().is_connected()
            && !tracker.link().manually_closed()
            && !reconnect_inflight
        {
            reconnector.spawn_reconnect();
            reconnect_inflight = true;
        }
    }

    reconnector.cancel();
    tracker.link_mut().disconnect().await;
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;
