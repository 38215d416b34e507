// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tracklink Contributors

//! tl-link: resilient transport layer for vehicle telemetry.
//!
//! Provides the pieces that keep telemetry flowing over an unreliable
//! network:
//!
//! ```text
//! ┌──────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ TelemetryLink│────►│  Transport  │────►│  Telemetry  │
//! │   (client)   │◄────│   (trait)   │◄────│   Server    │
//! └──────┬───────┘     └─────────────┘     └─────────────┘
//!        │ failed sends
//!        ▼
//! ┌──────────────┐     ┌─────────────┐
//! │ UplinkQueue  │     │ Reconnector │  (backoff + cancellation)
//! │ (durable FIFO)│    └─────────────┘
//! └──────────────┘
//! ```
//!
//! - WebSocket connection to the telemetry server, one live connection at
//!   a time, replaced wholesale on reconnect
//! - Automatic reconnect with exponential backoff and jitter
//! - Heartbeat pings with RTT measurement
//! - Durable bounded store-and-forward queue for uplink payloads
//! - `LocationSource` capability for raw GPS fixes
//! - Injectable transport trait for testing

pub mod client;
pub mod location;
pub mod queue;
pub mod reconnect;
pub mod transport;

pub use client::{ConnectionStatus, LinkConfig, LinkError, PayloadSender, TelemetryLink};
pub use location::{LocationError, LocationSource, LocationUpdate, ReplaySource};
pub use queue::{FlushOutcome, QueueItem, UplinkQueue};
pub use reconnect::{ReconnectEvent, Reconnector, SharedLinkState};
pub use transport::{Transport, TransportError, WebSocketTransport};

#[cfg(test)]
mod test_helpers;
