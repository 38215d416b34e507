// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tracklink Contributors

//! Error types for tl-core operations.

use thiserror::Error;

/// All possible errors that can occur in tl-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("latitude out of range: {0} (expected [-90, 90])")]
    LatitudeOutOfRange(f64),

    #[error("longitude out of range: {0} (expected [-180, 180])")]
    LongitudeOutOfRange(f64),

    #[error("non-finite coordinate: lat={lat}, lon={lon}")]
    NonFiniteCoordinate { lat: f64, lon: f64 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for tl-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
