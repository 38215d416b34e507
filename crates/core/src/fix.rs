// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tracklink Contributors

//! GPS fix data model and ingestion validation.
//!
//! A [`Fix`] is one timestamped GPS reading. Raw readings from a location
//! source arrive as [`RawFix`] values and are validated and normalized at
//! this boundary: out-of-range or non-finite coordinates are rejected and
//! never stored or propagated downstream.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Normalizes a heading in degrees into `[0, 360)`.
///
/// Returns `None` for non-finite input (a source reporting "no heading").
pub fn normalize_heading(deg: f64) -> Option<f64> {
    if !deg.is_finite() {
        return None;
    }
    Some(((deg % 360.0) + 360.0) % 360.0)
}

/// A raw location reading as delivered by a location source.
///
/// Fields mirror the loosely-typed readings platform bridges produce;
/// everything optional except position. Converted into a validated [`Fix`]
/// via [`Fix::from_raw`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFix {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Reading timestamp in epoch seconds, if the source provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<f64>,
    /// Ground speed in m/s.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spd: Option<f64>,
    /// Heading in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hdg: Option<f64>,
    /// Horizontal accuracy in meters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acc: Option<f64>,
    /// Altitude in meters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<f64>,
}

/// One validated, timestamped GPS reading.
///
/// Never mutated after creation; the displayed fix shown to users is a
/// derived value recomputed each tick by the smoother.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    /// Reading timestamp in epoch seconds.
    pub t: f64,
    /// When this fix was received, in monotonic milliseconds.
    pub recv_ms: u64,
    /// Latitude in degrees, guaranteed in `[-90, 90]`.
    pub lat: f64,
    /// Longitude in degrees, guaranteed in `[-180, 180]`.
    pub lon: f64,
    /// Ground speed in m/s, `0.0` when the source reports none.
    pub spd: f64,
    /// Heading in degrees, normalized into `[0, 360)`. `None` when unknown.
    pub hdg: Option<f64>,
    /// Horizontal accuracy in meters. `None` when unknown.
    pub acc: Option<f64>,
    /// Altitude in meters. `None` when unknown.
    pub alt: Option<f64>,
}

impl Fix {
    /// Validates and normalizes a raw reading into a `Fix`.
    ///
    /// - rejects non-finite or out-of-range lat/lon
    /// - negative or unknown speed becomes `0.0`
    /// - heading is normalized into `[0, 360)`, non-finite becomes `None`
    /// - non-finite accuracy/altitude become `None`
    ///
    /// `fallback_t` is used when the reading carries no timestamp (epoch
    /// seconds, typically "now"); `recv_ms` is the monotonic receive time.
    pub fn from_raw(raw: &RawFix, fallback_t: f64, recv_ms: u64) -> Result<Self> {
        if !raw.lat.is_finite() || !raw.lon.is_finite() {
            return Err(Error::NonFiniteCoordinate {
                lat: raw.lat,
                lon: raw.lon,
            });
        }
        if raw.lat.abs() > 90.0 {
            return Err(Error::LatitudeOutOfRange(raw.lat));
        }
        if raw.lon.abs() > 180.0 {
            return Err(Error::LongitudeOutOfRange(raw.lon));
        }

        let spd = match raw.spd {
            Some(s) if s.is_finite() && s >= 0.0 => s,
            _ => 0.0,
        };

        Ok(Fix {
            t: raw.t.filter(|t| t.is_finite()).unwrap_or(fallback_t),
            recv_ms,
            lat: raw.lat,
            lon: raw.lon,
            spd,
            hdg: raw.hdg.and_then(normalize_heading),
            acc: raw.acc.filter(|a| a.is_finite() && *a >= 0.0),
            alt: raw.alt.filter(|a| a.is_finite()),
        })
    }
}

#[cfg(test)]
#[path = "fix_tests.rs"]
mod tests;
