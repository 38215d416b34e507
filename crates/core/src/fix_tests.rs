// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tracklink Contributors

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

fn raw(lat: f64, lon: f64) -> RawFix {
    RawFix {
        lat,
        lon,
        t: Some(1000.0),
        spd: None,
        hdg: None,
        acc: None,
        alt: None,
    }
}

#[parameterized(
    zero = { 0.0, 0.0 },
    north_pole = { 90.0, 0.0 },
    south_pole = { -90.0, 0.0 },
    date_line = { 37.5, 180.0 },
    anti_date_line = { 37.5, -180.0 },
)]
fn from_raw_accepts_boundary_coordinates(lat: f64, lon: f64) {
    let fix = Fix::from_raw(&raw(lat, lon), 0.0, 0).unwrap();
    assert_eq!(fix.lat, lat);
    assert_eq!(fix.lon, lon);
}

#[test]
fn from_raw_rejects_latitude_out_of_range() {
    let err = Fix::from_raw(&raw(91.0, 0.0), 0.0, 0).unwrap_err();
    assert!(matches!(err, Error::LatitudeOutOfRange(_)));
}

#[test]
fn from_raw_rejects_longitude_out_of_range() {
    let err = Fix::from_raw(&raw(0.0, -180.5), 0.0, 0).unwrap_err();
    assert!(matches!(err, Error::LongitudeOutOfRange(_)));
}

#[test]
fn from_raw_rejects_non_finite_coordinates() {
    let err = Fix::from_raw(&raw(f64::NAN, 0.0), 0.0, 0).unwrap_err();
    assert!(matches!(err, Error::NonFiniteCoordinate { .. }));

    let err = Fix::from_raw(&raw(0.0, f64::INFINITY), 0.0, 0).unwrap_err();
    assert!(matches!(err, Error::NonFiniteCoordinate { .. }));
}

#[test]
fn from_raw_defaults_missing_speed_to_zero() {
    let fix = Fix::from_raw(&raw(10.0, 20.0), 0.0, 0).unwrap();
    assert_eq!(fix.spd, 0.0);
}

#[test]
fn from_raw_clamps_negative_speed_to_zero() {
    let mut r = raw(10.0, 20.0);
    r.spd = Some(-3.0);
    let fix = Fix::from_raw(&r, 0.0, 0).unwrap();
    assert_eq!(fix.spd, 0.0);
}

#[test]
fn from_raw_uses_fallback_timestamp() {
    let mut r = raw(10.0, 20.0);
    r.t = None;
    let fix = Fix::from_raw(&r, 1234.5, 99).unwrap();
    assert_eq!(fix.t, 1234.5);
    assert_eq!(fix.recv_ms, 99);
}

#[test]
fn from_raw_drops_negative_accuracy() {
    let mut r = raw(10.0, 20.0);
    r.acc = Some(-1.0);
    let fix = Fix::from_raw(&r, 0.0, 0).unwrap();
    assert_eq!(fix.acc, None);
}

#[parameterized(
    in_range = { 45.0, Some(45.0) },
    zero = { 0.0, Some(0.0) },
    wraps_up = { 370.0, Some(10.0) },
    wraps_down = { -10.0, Some(350.0) },
    full_turn = { 360.0, Some(0.0) },
    nan = { f64::NAN, None },
    infinite = { f64::INFINITY, None },
)]
fn heading_normalization(input: f64, expected: Option<f64>) {
    assert_eq!(normalize_heading(input), expected);
}

#[test]
fn from_raw_normalizes_heading() {
    let mut r = raw(10.0, 20.0);
    r.hdg = Some(-90.0);
    let fix = Fix::from_raw(&r, 0.0, 0).unwrap();
    assert_eq!(fix.hdg, Some(270.0));
}

#[test]
fn raw_fix_deserializes_with_missing_optionals() {
    let r: RawFix = serde_json::from_str(r#"{"lat":1.0,"lon":2.0}"#).unwrap();
    assert_eq!(r.lat, 1.0);
    assert_eq!(r.spd, None);
    assert_eq!(r.hdg, None);
}
