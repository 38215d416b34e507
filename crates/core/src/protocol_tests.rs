// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tracklink Contributors

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use super::*;
use crate::fix::Fix;

fn sample_fix() -> Fix {
    Fix {
        t: 1700000000.0,
        recv_ms: 1000,
        lat: 37.5665,
        lon: 126.978,
        spd: 12.3,
        hdg: Some(45.0),
        acc: Some(5.0),
        alt: Some(38.0),
    }
}

#[test]
fn ping_serializes_with_type_literal() {
    let msg = UplinkMessage::ping(1700000000.5);
    let json = msg.to_json().unwrap();

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["type"], "ping");
    assert_eq!(value["t"], 1700000000.5);
}

#[test]
fn gps_payload_carries_version_position_and_meta() {
    let msg = UplinkMessage::gps(1700000001.0, &sample_fix(), UplinkMeta::default());
    let json = msg.to_json().unwrap();

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["v"], 1);
    assert_eq!(value["gps"]["lat"], 37.5665);
    assert_eq!(value["gps"]["hdg"], 45.0);
    assert_eq!(value["meta"]["source"], "bridge");
    assert!(value["meta"]["app_ver"].is_string());
}

#[test]
fn gps_payload_serializes_unknown_fields_as_null() {
    let mut fix = sample_fix();
    fix.hdg = None;
    fix.alt = None;

    let msg = UplinkMessage::gps(1700000001.0, &fix, UplinkMeta::default());
    let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();

    assert!(value["gps"]["hdg"].is_null());
    assert!(value["gps"]["alt"].is_null());
}

#[test]
fn mark_serializes_with_uppercase_type() {
    let msg = UplinkMessage::mark(1700000002.0, "lap 3 start");
    let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();

    assert_eq!(value["type"], "MARK");
    assert_eq!(value["note"], "lap 3 start");
    assert_eq!(value["v"], 1);
}

#[test]
fn uplink_roundtrips_through_json() {
    let messages = [
        UplinkMessage::ping(1.5),
        UplinkMessage::gps(2.5, &sample_fix(), UplinkMeta::default()),
        UplinkMessage::mark(3.5, "note"),
    ];

    for msg in messages {
        let json = msg.to_json().unwrap();
        let back = UplinkMessage::from_json(&json).unwrap();
        assert_eq!(back, msg);
    }
}

#[test]
fn downlink_pong_is_discriminated_by_type() {
    let msg = DownlinkMessage::from_json(r#"{"type":"pong","t":1700000000.5}"#).unwrap();
    match msg {
        DownlinkMessage::Pong(pong) => assert_eq!(pong.t, 1700000000.5),
        other => panic!("expected pong, got {other:?}"),
    }
}

#[test]
fn downlink_frame_is_discriminated_by_sig_and_status() {
    let msg =
        DownlinkMessage::from_json(r#"{"sig":{"rpm":900.0},"status":{"seq":7,"drop":0}}"#).unwrap();
    match msg {
        DownlinkMessage::Frame(frame) => {
            assert_eq!(frame.status.seq, 7);
            assert_eq!(frame.sig.get("rpm"), Some(&900.0));
        }
        other => panic!("expected frame, got {other:?}"),
    }
}

#[test]
fn downlink_rejects_unknown_shapes() {
    assert!(DownlinkMessage::from_json(r#"{"type":"banana","t":1.0}"#).is_err());
    assert!(DownlinkMessage::from_json(r#"{"sig":{"rpm":900.0}}"#).is_err());
    assert!(DownlinkMessage::from_json("not json").is_err());
}
