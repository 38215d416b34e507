// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tracklink Contributors

//! tl-core: Shared library for the tracklink telemetry resilience layer.
//!
//! This crate provides the data model and pure algorithms used by the
//! tl-link transport layer and the tl-bridge binary: GPS fix validation,
//! fix smoothing/interpolation, frame drop accounting, and the wire
//! protocol message types.

pub mod clock;
pub mod error;
pub mod fix;
pub mod frame;
pub mod protocol;
pub mod smooth;

pub use clock::{ClockSource, SystemClock};
pub use error::{Error, Result};
pub use fix::{normalize_heading, Fix, RawFix};
pub use frame::{DropAccounting, FrameStatus, SignalFrame};
pub use protocol::{DownlinkMessage, GpsPoint, UplinkMessage, UplinkMeta};
pub use smooth::{DisplayedFix, FixSmoother, SmootherConfig, SmoothingMode};
