// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tracklink Contributors

//! Monotonic clock abstraction.
//!
//! Fix receive times, interpolation transitions, and staleness checks all
//! operate on monotonic milliseconds rather than wall-clock time, so a wall
//! clock step never distorts smoothing or staleness. The trait allows
//! injecting a mock clock for testing.

use std::sync::OnceLock;
use std::time::Instant;

/// Trait for getting the current monotonic time.
pub trait ClockSource: Send + Sync {
    /// Returns milliseconds elapsed on a monotonic clock.
    ///
    /// The origin is arbitrary; only differences are meaningful.
    fn now_ms(&self) -> u64;
}

impl<C: ClockSource> ClockSource for &C {
    fn now_ms(&self) -> u64 {
        (*self).now_ms()
    }
}

/// Monotonic clock implementation anchored at first use.
#[derive(Debug, Default)]
pub struct SystemClock;

static EPOCH: OnceLock<Instant> = OnceLock::new();

impl ClockSource for SystemClock {
    fn now_ms(&self) -> u64 {
        EPOCH.get_or_init(Instant::now).elapsed().as_millis() as u64
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
