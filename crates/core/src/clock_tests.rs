// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fake_clock_advances() {
    let clock = FakeClock::new(1000);
    assert_eq!(clock.now_ms(), 1000);
    clock.advance(500);
    assert_eq!(clock.now_ms(), 1500);
    clock.set(42);
    assert_eq!(clock.now_ms(), 42);
}

#[test]
fn rfc3339_has_millisecond_precision() {
    let s = rfc3339_from_ms(1_767_225_600_123);
    assert_eq!(s, "2026-01-01T00:00:00.123Z");
}

#[test]
fn rfc3339_round_trips() {
    let ms = 1_767_225_600_123;
    assert_eq!(ms_from_rfc3339(&rfc3339_from_ms(ms)), Some(ms));
}

#[test]
fn unparseable_timestamp_yields_none() {
    assert_eq!(ms_from_rfc3339("yesterday"), None);
}

#[test]
fn system_clock_is_current() {
    let clock = SystemClock;
    // Some time in 2024 or later
    assert!(clock.now_ms() > 1_700_000_000_000);
    assert!(clock.now_rfc3339().ends_with('Z'));
}
