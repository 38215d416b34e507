// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tracklink Contributors

//! Durable bounded store-and-forward queue for uplink payloads.
//!
//! Payloads the link could not send are appended here and replayed in
//! order once the link recovers. The queue is capacity-bounded with
//! oldest-first eviction, and persisted best-effort as a single JSON
//! array file: a persistence failure degrades the queue to memory-only
//! operation, it never propagates as a fatal error.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tl_core::protocol::UplinkMessage;
use tracing::{debug, warn};

use crate::client::PayloadSender;

/// Storage key the persisted queue derives its file name from.
pub const STORAGE_KEY: &str = "telemetry:gps:queue:v1";

/// Default capacity bound.
pub const DEFAULT_MAX_ITEMS: usize = 1000;

/// Default per-flush item limit.
pub const DEFAULT_FLUSH_LIMIT: usize = 200;

/// One queued uplink payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    /// The payload to replay.
    pub payload: UplinkMessage,
    /// When it was queued, in epoch seconds.
    pub queued_at: f64,
}

/// Outcome of a flush pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushOutcome {
    /// Items sent and removed from the head.
    pub sent: usize,
    /// Items still queued.
    pub remaining: usize,
}

/// Durable bounded FIFO of pending uplink payloads.
pub struct UplinkQueue {
    /// Backing file; `None` runs memory-only.
    path: Option<PathBuf>,
    max_items: usize,
    items: VecDeque<QueueItem>,
    /// Lazy-load guard: storage is read exactly once.
    loaded: bool,
    /// Total items ever evicted by overflow.
    overflow_count: u64,
    /// Single-flight guard: a second flush is rejected, not deferred.
    flushing: bool,
}

impl UplinkQueue {
    /// Create a queue persisted at `path` with the default capacity.
    ///
    /// No I/O happens here; persisted state is loaded lazily by
    /// [`UplinkQueue::init`] or on first use.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::with_capacity(Some(path.into()), DEFAULT_MAX_ITEMS)
    }

    /// Create a memory-only queue (nothing survives a restart).
    pub fn in_memory() -> Self {
        Self::with_capacity(None, DEFAULT_MAX_ITEMS)
    }

    /// Create a queue with an explicit capacity bound.
    pub fn with_capacity(path: Option<PathBuf>, max_items: usize) -> Self {
        UplinkQueue {
            path,
            max_items,
            items: VecDeque::new(),
            loaded: false,
            overflow_count: 0,
            flushing: false,
        }
    }

    /// The default queue file name under `dir`, derived from
    /// [`STORAGE_KEY`].
    pub fn default_path(dir: &Path) -> PathBuf {
        dir.join(format!("{}.json", STORAGE_KEY.replace(':', "_")))
    }

    /// Load persisted state, exactly once.
    ///
    /// A second call is a no-op that does not re-read storage. Missing,
    /// unreadable, or corrupt state is treated as an empty queue; the
    /// queue stays usable either way. Returns the current depth.
    pub fn init(&mut self) -> usize {
        if self.loaded {
            return self.items.len();
        }
        self.loaded = true;

        let Some(ref path) = self.path else {
            return 0;
        };

        match fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<Vec<QueueItem>>(&raw) {
                Ok(items) => {
                    self.items = items.into();
                }
                Err(e) => {
                    warn!("discarding corrupt queue state at {}: {e}", path.display());
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!("could not read queue state at {}: {e}", path.display());
            }
        }

        self.items.len()
    }

    /// Current number of queued items.
    pub fn depth(&self) -> usize {
        self.items.len()
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total items ever evicted because the queue was full.
    pub fn overflow_count(&self) -> u64 {
        self.overflow_count
    }

    /// Append a payload at the tail; returns the new depth.
    ///
    /// When the depth exceeds the capacity bound, the exact excess is
    /// evicted from the head (oldest first) and counted in
    /// `overflow_count`. The result is persisted best-effort; a
    /// persistence failure does not roll back the in-memory change.
    pub fn enqueue(&mut self, payload: UplinkMessage, queued_at: f64) -> usize {
        self.init();

        self.items.push_back(QueueItem { payload, queued_at });
        while self.items.len() > self.max_items {
            self.items.pop_front();
            self.overflow_count += 1;
        }

        self.persist();
        self.items.len()
    }

    /// Replay queued payloads head-to-tail through `sender`.
    ///
    /// Pops an item only after `sender` accepts it; the first refusal
    /// stops the pass immediately, leaving that item and everything
    /// behind it in original order. Also stops at `limit` items or when
    /// the queue empties. The queue is persisted unconditionally before
    /// returning.
    ///
    /// Single-flight: if a flush is already in progress the call returns
    /// `{sent: 0, remaining: depth}` without touching the queue.
    pub async fn flush<S: PayloadSender>(&mut self, sender: &mut S, limit: usize) -> FlushOutcome {
        if self.flushing {
            debug!("flush already in progress, rejecting");
            return FlushOutcome {
                sent: 0,
                remaining: self.items.len(),
            };
        }
        self.flushing = true;
        self.init();

        let mut sent = 0;
        while sent < limit {
            let Some(item) = self.items.front() else {
                break;
            };
            if !sender.send_payload(&item.payload).await {
                break;
            }
            self.items.pop_front();
            sent += 1;
        }

        self.persist();
        self.flushing = false;

        FlushOutcome {
            sent,
            remaining: self.items.len(),
        }
    }

    /// Write the queue to its backing file, best-effort.
    fn persist(&self) {
        let Some(ref path) = self.path else {
            return;
        };

        let items: Vec<&QueueItem> = self.items.iter().collect();
        let result = serde_json::to_string(&items)
            .map_err(std::io::Error::other)
            .and_then(|json| fs::write(path, json));

        if let Err(e) = result {
            // Keep the memory queue even if persistence fails.
            warn!("could not persist queue to {}: {e}", path.display());
        }
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
