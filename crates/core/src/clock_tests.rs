// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fake_clock_only_advances_when_told() {
    let clock = FakeClock::default();
    let t0 = clock.now();
    let t1 = clock.now();
    assert_eq!(t0, t1);

    clock.advance(chrono::Duration::seconds(5));
    let t2 = clock.now();
    assert_eq!((t2 - t0).num_seconds(), 5);
}

#[test]
fn rfc3339_nanos_is_parseable() {
    let clock = FakeClock::default();
    let s = clock.now_rfc3339_nanos();
    let parsed = DateTime::parse_from_rfc3339(&s).expect("round trip");
    assert_eq!(parsed.with_timezone(&Utc), clock.now());
}
