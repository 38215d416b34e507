// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tracklink Contributors

//! Location source capability.
//!
//! Platform location bridges (OS watch APIs, foreground services,
//! significant-change monitors) are outside this crate; the core consumes
//! them through the [`LocationSource`] trait, which delivers validated
//! fixes over a channel. Variants are selected by configuration, never by
//! inheritance.
//!
//! Raw readings are validated at this boundary: a reading with
//! out-of-range coordinates is dropped and never reaches the smoother or
//! the uplink path.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use tl_core::clock::{ClockSource, SystemClock};
use tl_core::fix::{Fix, RawFix};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Typed location failure taxonomy.
///
/// All variants are non-fatal to the consumer; a tracker stays usable
/// after reporting one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    /// The user or platform denied location access.
    #[error("location permission denied")]
    Denied,

    /// No location capability is available.
    #[error("location source unavailable")]
    Unavailable,

    /// The source timed out producing a reading.
    #[error("location request timed out")]
    Timeout,

    /// Anything else.
    #[error("location error: {0}")]
    Other(String),
}

/// One delivery from a location source.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationUpdate {
    /// A validated fix.
    Fix(Fix),
    /// A non-fatal source error.
    Error(LocationError),
}

/// A source of location fixes.
///
/// `start` fails synchronously when the capability is missing and at
/// most one subscription may be active until `stop`. `stop` is
/// idempotent, safe to call even if never started, and synchronously
/// guarantees the update channel closes without further deliveries.
pub trait LocationSource {
    /// Begin delivering updates.
    fn start(&mut self) -> Result<mpsc::Receiver<LocationUpdate>, LocationError>;

    /// Stop delivering updates and release the subscription.
    fn stop(&mut self);
}

/// Replays raw fixes from a newline-delimited JSON file at a fixed pace.
///
/// Stands in for a live GPS bridge during development and testing; each
/// line is a [`RawFix`]. Malformed lines and invalid readings are
/// skipped.
pub struct ReplaySource {
    path: PathBuf,
    interval: Duration,
    cancel: Option<CancellationToken>,
}

impl ReplaySource {
    /// Create a replay source over `path`, emitting one fix per
    /// `interval`.
    pub fn new(path: impl Into<PathBuf>, interval: Duration) -> Self {
        ReplaySource {
            path: path.into(),
            interval,
            cancel: None,
        }
    }
}

impl LocationSource for ReplaySource {
    fn start(&mut self) -> Result<mpsc::Receiver<LocationUpdate>, LocationError> {
        if self.cancel.is_some() {
            return Err(LocationError::Other("source already started".to_string()));
        }

        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LocationError::Unavailable
            } else {
                LocationError::Other(e.to_string())
            }
        })?;

        let readings: Vec<RawFix> = raw
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<RawFix>(line) {
                Ok(r) => Some(r),
                Err(e) => {
                    debug!("skipping malformed replay line: {e}");
                    None
                }
            })
            .collect();

        let cancel = CancellationToken::new();
        self.cancel = Some(cancel.clone());

        let (tx, rx) = mpsc::channel(16);
        let interval = self.interval;

        tokio::spawn(async move {
            let clock = SystemClock;
            for reading in readings {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(interval) => {}
                }

                let now_t = Utc::now().timestamp_millis() as f64 / 1000.0;
                match Fix::from_raw(&reading, now_t, clock.now_ms()) {
                    Ok(fix) => {
                        if tx.send(LocationUpdate::Fix(fix)).await.is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        // Rejected at ingestion; never propagated.
                        debug!("dropping invalid replay fix: {e}");
                    }
                }
            }
        });

        Ok(rx)
    }

    fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
    }
}

#[cfg(test)]
#[path = "location_tests.rs"]
mod tests;
