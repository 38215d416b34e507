// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tracklink Contributors

#![allow(clippy::unwrap_used)]

use super::*;

#[test]
fn system_clock_is_monotonic() {
    let clock = SystemClock;
    let a = clock.now_ms();
    let b = clock.now_ms();
    assert!(b >= a);
}

#[test]
fn clock_source_works_through_reference() {
    fn read(clock: impl ClockSource) -> u64 {
        clock.now_ms()
    }
    let clock = SystemClock;
    let _ = read(&clock);
}
