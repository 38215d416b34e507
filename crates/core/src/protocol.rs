// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tracklink Contributors

//! Wire protocol messages exchanged with the telemetry server.
//!
//! Messages are JSON text frames over a persistent duplex connection.
//! Inbound shapes are discriminated by the `type` literal (pong) or the
//! presence of `sig` + `status` (signal frame) and validated on
//! deserialization; anything else is rejected by serde and discarded by
//! the transport.

use serde::{Deserialize, Serialize};

use crate::fix::Fix;
use crate::frame::SignalFrame;

/// Protocol version stamped on uplink payloads.
pub const PROTOCOL_VERSION: u8 = 1;

/// Literal `"ping"` discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PingTag {
    #[serde(rename = "ping")]
    #[default]
    Ping,
}

/// Literal `"pong"` discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PongTag {
    #[serde(rename = "pong")]
    #[default]
    Pong,
}

/// Literal `"MARK"` discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MarkTag {
    #[serde(rename = "MARK")]
    #[default]
    Mark,
}

/// Heartbeat ping: `{"type":"ping","t":<epoch-seconds>}`.
///
/// The server echoes `t` verbatim in its pong, which is what the client
/// uses to match pongs to outstanding pings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingMessage {
    #[serde(rename = "type")]
    pub tag: PingTag,
    /// Send time in epoch seconds, echoed by the server.
    pub t: f64,
}

/// Heartbeat pong: `{"type":"pong","t":<echoed ping t>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PongMessage {
    #[serde(rename = "type")]
    pub tag: PongTag,
    /// The `t` of the ping being answered.
    pub t: f64,
}

/// GPS coordinates carried by an uplink payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub lat: f64,
    pub lon: f64,
    pub spd: f64,
    pub hdg: Option<f64>,
    pub acc: Option<f64>,
    pub alt: Option<f64>,
}

impl From<&Fix> for GpsPoint {
    fn from(fix: &Fix) -> Self {
        GpsPoint {
            lat: fix.lat,
            lon: fix.lon,
            spd: fix.spd,
            hdg: fix.hdg,
            acc: fix.acc,
            alt: fix.alt,
        }
    }
}

/// Sender metadata attached to GPS uplink payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UplinkMeta {
    /// Where the fix came from (e.g. "bridge", "mobile").
    pub source: String,
    /// Foreground/background state of the sending process.
    pub bg_state: String,
    /// Operating system name.
    pub os: String,
    /// Application version.
    pub app_ver: String,
    /// Device identifier.
    pub device: String,
}

impl Default for UplinkMeta {
    fn default() -> Self {
        UplinkMeta {
            source: "bridge".to_string(),
            bg_state: "foreground".to_string(),
            os: std::env::consts::OS.to_string(),
            app_ver: env!("CARGO_PKG_VERSION").to_string(),
            device: "unknown".to_string(),
        }
    }
}

/// GPS uplink payload:
/// `{"v":1,"t":…,"gps":{…},"meta":{…}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpsMessage {
    pub v: u8,
    /// Payload creation time in epoch seconds.
    pub t: f64,
    pub gps: GpsPoint,
    pub meta: UplinkMeta,
}

/// Operator mark: `{"v":1,"t":…,"type":"MARK","note":…}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkMessage {
    pub v: u8,
    /// Mark time in epoch seconds.
    pub t: f64,
    #[serde(rename = "type")]
    pub tag: MarkTag,
    pub note: String,
}

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UplinkMessage {
    /// Heartbeat ping.
    Ping(PingMessage),
    /// Operator mark annotation.
    Mark(MarkMessage),
    /// GPS position report.
    Gps(GpsMessage),
}

/// Messages received from the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DownlinkMessage {
    /// Heartbeat pong, answering a ping.
    Pong(PongMessage),
    /// A frame of named signals with sequence/drop status.
    Frame(SignalFrame),
}

impl UplinkMessage {
    /// Creates a ping stamped `t` (epoch seconds).
    pub fn ping(t: f64) -> Self {
        UplinkMessage::Ping(PingMessage {
            tag: PingTag::Ping,
            t,
        })
    }

    /// Creates a GPS report from a fix.
    pub fn gps(t: f64, fix: &Fix, meta: UplinkMeta) -> Self {
        UplinkMessage::Gps(GpsMessage {
            v: PROTOCOL_VERSION,
            t,
            gps: GpsPoint::from(fix),
            meta,
        })
    }

    /// Creates an operator mark.
    pub fn mark(t: f64, note: impl Into<String>) -> Self {
        UplinkMessage::Mark(MarkMessage {
            v: PROTOCOL_VERSION,
            t,
            tag: MarkTag::Mark,
            note: note.into(),
        })
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl DownlinkMessage {
    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
