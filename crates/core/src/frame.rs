// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tracklink Contributors

//! Inbound signal frames and drop accounting.
//!
//! The telemetry source stamps every frame with a per-connection sequence
//! number and a cumulative count of frames it dropped before transmission
//! (e.g. its internal buffer overflowing). Sequence gaps the server's own
//! counter does not explain are attributed to loss in transit.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Per-frame status reported by the telemetry source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameStatus {
    /// Sequence number, monotonically non-decreasing per connection.
    ///
    /// Not guaranteed gapless: gaps may originate at the source (reported
    /// via `drop`) or in transit (inferred by [`DropAccounting`]).
    pub seq: u64,
    /// Cumulative count of frames the source itself dropped.
    pub drop: u64,
}

/// One inbound frame of named numeric signals.
///
/// Created per inbound message and consumed immediately; not retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalFrame {
    /// Named numeric signals (CAN-derived values).
    pub sig: HashMap<String, f64>,
    /// Sequence/drop status for this frame.
    pub status: FrameStatus,
}

/// Tracks frame loss, attributing it between source-side drops and
/// network-side loss.
#[derive(Debug, Default)]
pub struct DropAccounting {
    last_seq: Option<u64>,
    last_server_drop: u64,
    local_drop_estimate: u64,
}

impl DropAccounting {
    /// Creates accounting state for a fresh connection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one frame's sequence number and server drop counter.
    ///
    /// A sequence gap larger than the growth of the server's own drop
    /// counter means frames were lost in transit; that remainder is added
    /// to the local estimate. The estimate never decreases.
    pub fn observe(&mut self, seq: u64, server_drop: u64) {
        if let Some(last) = self.last_seq {
            // Saturating throughout: seq and drop are server-controlled,
            // and a hostile or buggy counter must never panic or wrap the
            // estimate.
            if seq > last.saturating_add(1) {
                let seq_gap = seq.saturating_sub(last).saturating_sub(1);
                let server_drop_delta = server_drop.saturating_sub(self.last_server_drop);
                let network_gap = seq_gap.saturating_sub(server_drop_delta);
                self.local_drop_estimate = self.local_drop_estimate.saturating_add(network_gap);
            }
        }
        self.last_seq = Some(seq);
        self.last_server_drop = server_drop;
    }

    /// Records a frame's status directly.
    pub fn observe_status(&mut self, status: &FrameStatus) {
        self.observe(status.seq, status.drop);
    }

    /// Last sequence number seen, if any frame has arrived.
    pub fn last_seq(&self) -> Option<u64> {
        self.last_seq
    }

    /// Cumulative drops the source reported about itself.
    pub fn server_drops(&self) -> u64 {
        self.last_server_drop
    }

    /// Frames inferred lost in transit. Monotonically non-decreasing.
    pub fn local_drop_estimate(&self) -> u64 {
        self.local_drop_estimate
    }

    /// Total estimated loss: source-reported drops plus inferred
    /// network loss.
    pub fn total_drops(&self) -> u64 {
        self.last_server_drop.saturating_add(self.local_drop_estimate)
    }
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
