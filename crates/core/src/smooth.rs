// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tracklink Contributors

//! Fix smoothing and interpolation.
//!
//! Converts a stream of raw, possibly noisy or irregular fixes into a
//! continuously-updatable "displayed fix" suitable for live rendering.
//!
//! Two modes, switchable at runtime without restarting ingestion:
//!
//! - `hold`: the smoothing target is always the latest fix.
//! - `lerp`: each new fix opens a timed transition from the previous fix;
//!   the target is interpolated along it.
//!
//! In both modes an EMA blend toward the target is applied on every tick,
//! so in `lerp` mode the already-interpolated target is smoothed a second
//! time. Heading interpolation is circular and always takes the shortest
//! angular path.

use crate::fix::Fix;

/// How the smoothing target is derived from incoming fixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmoothingMode {
    /// Target is the latest fix as-is.
    #[default]
    Hold,
    /// Target is interpolated between the previous and latest fix.
    Lerp,
}

/// Tuning for [`FixSmoother`].
#[derive(Debug, Clone)]
pub struct SmootherConfig {
    /// Initial smoothing mode.
    pub mode: SmoothingMode,
    /// EMA blend weight applied each tick, in `(0, 1]`.
    pub ema_factor: f64,
    /// Age beyond which the displayed fix is reported stale.
    pub stale_after_ms: u64,
}

impl Default for SmootherConfig {
    fn default() -> Self {
        SmootherConfig {
            mode: SmoothingMode::Hold,
            ema_factor: 0.25,
            stale_after_ms: 4000,
        }
    }
}

/// The smoothed fix recomputed on each tick, with staleness.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayedFix {
    /// Smoothed fix, or `None` if no fix has ever been ingested.
    pub fix: Option<Fix>,
    /// True when the latest raw fix is older than the stale threshold.
    pub stale: bool,
    /// Milliseconds since the latest raw fix was received.
    pub age_ms: Option<u64>,
}

/// An open interpolation between two consecutive fixes.
#[derive(Debug, Clone)]
struct Transition {
    from: Fix,
    to: Fix,
    start_ms: u64,
    duration_ms: f64,
}

/// Transition duration bounds: a gap shorter than 250ms or longer than 2s
/// between fix timestamps is clamped so playback never freezes or jumps.
const MIN_TRANSITION_MS: f64 = 250.0;
const MAX_TRANSITION_MS: f64 = 2000.0;
const DEFAULT_TRANSITION_MS: f64 = 500.0;

/// Smooths and interpolates a stream of fixes into a displayed fix.
#[derive(Debug)]
pub struct FixSmoother {
    mode: SmoothingMode,
    ema_factor: f64,
    stale_after_ms: u64,
    prev_fix: Option<Fix>,
    last_fix: Option<Fix>,
    displayed: Option<Fix>,
    transition: Option<Transition>,
}

impl FixSmoother {
    /// Creates a smoother with the given configuration.
    pub fn new(config: SmootherConfig) -> Self {
        FixSmoother {
            mode: config.mode,
            ema_factor: config.ema_factor,
            stale_after_ms: config.stale_after_ms,
            prev_fix: None,
            last_fix: None,
            displayed: None,
            transition: None,
        }
    }

    /// Current smoothing mode.
    pub fn mode(&self) -> SmoothingMode {
        self.mode
    }

    /// Switches the smoothing mode. Ingestion state is untouched.
    pub fn set_mode(&mut self, mode: SmoothingMode) {
        self.mode = mode;
    }

    /// The latest raw fix ingested, if any.
    pub fn last_fix(&self) -> Option<&Fix> {
        self.last_fix.as_ref()
    }

    /// Ingests a validated fix received at `now_ms` (monotonic).
    ///
    /// Opens a transition from the previous fix when one exists. The
    /// transition duration follows the gap between fix timestamps, clamped
    /// to `[250, 2000]`ms, defaulting to 500ms when the gap is not finite.
    pub fn push(&mut self, fix: Fix, now_ms: u64) {
        self.prev_fix = self.last_fix.take();
        self.last_fix = Some(fix.clone());

        if let Some(ref prev) = self.prev_fix {
            let raw_duration = (fix.t - prev.t) * 1000.0;
            let duration_ms = if raw_duration.is_finite() {
                raw_duration.clamp(MIN_TRANSITION_MS, MAX_TRANSITION_MS)
            } else {
                DEFAULT_TRANSITION_MS
            };

            self.transition = Some(Transition {
                from: prev.clone(),
                to: fix.clone(),
                start_ms: now_ms,
                duration_ms,
            });
        }

        // Seed the displayed fix so the first tick has a starting point.
        if self.displayed.is_none() {
            self.displayed = Some(fix);
        }
    }

    /// Recomputes the displayed fix for `now_ms` (monotonic).
    pub fn tick(&mut self, now_ms: u64) -> DisplayedFix {
        let last = match self.last_fix {
            Some(ref fix) => fix.clone(),
            None => {
                return DisplayedFix {
                    fix: None,
                    stale: true,
                    age_ms: None,
                }
            }
        };

        let mut target = last.clone();
        if self.mode == SmoothingMode::Lerp {
            if let Some(ref tr) = self.transition {
                let elapsed = now_ms.saturating_sub(tr.start_ms) as f64;
                let alpha = (elapsed / tr.duration_ms).clamp(0.0, 1.0);
                target = lerp_fix(&tr.from, &tr.to, alpha);
                if alpha >= 1.0 {
                    self.transition = None;
                }
            }
        }

        let displayed = match self.displayed.take() {
            Some(current) => lerp_fix(&current, &target, self.ema_factor),
            None => target,
        };
        self.displayed = Some(displayed.clone());

        let age_ms = now_ms.saturating_sub(last.recv_ms);
        DisplayedFix {
            fix: Some(displayed),
            stale: age_ms > self.stale_after_ms,
            age_ms: Some(age_ms),
        }
    }
}

fn lerp(a: f64, b: f64, alpha: f64) -> f64 {
    a + (b - a) * alpha
}

fn wrap360(deg: f64) -> f64 {
    ((deg % 360.0) + 360.0) % 360.0
}

/// Circular interpolation between two headings in degrees.
///
/// Always takes the shortest angular path: 350° to 10° passes through 0°,
/// not 180°.
pub fn lerp_heading(from: f64, to: f64, alpha: f64) -> f64 {
    let delta = ((to - from + 540.0) % 360.0) - 180.0;
    wrap360(from + delta * alpha)
}

/// Interpolates between two fixes at `alpha` in `[0, 1]`.
///
/// Numeric fields blend linearly; heading blends circularly. Fields the
/// target does not carry come out as the target's value. Timestamps are
/// taken from the target so staleness always reflects the newest reading.
pub fn lerp_fix(from: &Fix, to: &Fix, alpha: f64) -> Fix {
    Fix {
        t: to.t,
        recv_ms: to.recv_ms,
        lat: lerp(from.lat, to.lat, alpha),
        lon: lerp(from.lon, to.lon, alpha),
        spd: lerp(from.spd, to.spd, alpha),
        hdg: match (from.hdg, to.hdg) {
            (Some(a), Some(b)) => Some(lerp_heading(a, b, alpha)),
            _ => to.hdg,
        },
        acc: match (from.acc, to.acc) {
            (Some(a), Some(b)) => Some(lerp(a, b, alpha)),
            _ => to.acc,
        },
        alt: match (from.alt, to.alt) {
            (Some(a), Some(b)) => Some(lerp(a, b, alpha)),
            _ => to.alt,
        },
    }
}

#[cfg(test)]
#[path = "smooth_tests.rs"]
mod tests;
