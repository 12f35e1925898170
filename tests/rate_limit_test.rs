// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! RateLimitRegistry public API integration tests.

use expense_ledger_rs::{
    ClientIdentity, Clock, ManualClock, RateLimitConfig, RateLimitRegistry, RouteId, Timestamp,
};
use std::sync::Arc;
use std::time::Duration;

const WINDOW_MS: u64 = 900_000;

fn make_registry() -> (RateLimitRegistry, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(Timestamp(1_700_000_000_000)));
    let registry = RateLimitRegistry::new(RateLimitConfig::default(), clock.clone());
    (registry, clock)
}

fn convert_route() -> RouteId {
    RouteId::new("POST", "/convert")
}

fn expenses_route() -> RouteId {
    RouteId::new("POST", "/expenses")
}

fn client(addr: &str) -> ClientIdentity {
    ClientIdentity::from(addr)
}

#[test]
fn default_config_is_100_per_15_minutes() {
    let config = RateLimitConfig::default();
    assert_eq!(config.limit, 100);
    assert_eq!(config.window, Duration::from_millis(WINDOW_MS));
}

#[test]
fn first_hundred_admitted_with_decreasing_remaining() {
    let (registry, clock) = make_registry();
    let now = clock.now();

    for i in 1..=100u32 {
        let decision = registry.admit(&convert_route(), &client("1.1.1.1"), now);
        assert!(decision.allowed, "request {i} should be admitted");
        assert_eq!(decision.remaining, 100 - i);
        assert_eq!(decision.limit, 100);
        assert_eq!(decision.reset_at, Timestamp(now.0 + WINDOW_MS));
    }

    let rejected = registry.admit(&convert_route(), &client("1.1.1.1"), now);
    assert!(!rejected.allowed, "request 101 should be rejected");
    assert_eq!(rejected.remaining, 0);
    assert_eq!(rejected.reset_at, Timestamp(now.0 + WINDOW_MS));
}

#[test]
fn quotas_are_independent_per_route() {
    let (registry, clock) = make_registry();
    let now = clock.now();
    let ip = client("1.1.1.1");

    for _ in 0..100 {
        registry.admit(&convert_route(), &ip, now);
    }
    assert!(!registry.admit(&convert_route(), &ip, now).allowed);

    let other = registry.admit(&expenses_route(), &ip, now);
    assert!(other.allowed);
    assert_eq!(other.remaining, 99);
}

#[test]
fn quotas_are_independent_per_client() {
    let (registry, clock) = make_registry();
    let now = clock.now();

    for _ in 0..101 {
        registry.admit(&expenses_route(), &client("1.1.1.1"), now);
    }

    let decision = registry.admit(&expenses_route(), &client("2.2.2.2"), now);
    assert!(decision.allowed);
    assert_eq!(decision.remaining, 99);
    assert_eq!(registry.bucket_count(), 2);
}

#[test]
fn window_rollover_starts_fresh_count() {
    let (registry, clock) = make_registry();
    let ip = client("1.1.1.1");

    let first = registry.admit(&convert_route(), &ip, clock.now());
    for _ in 0..100 {
        registry.admit(&convert_route(), &ip, clock.now());
    }

    clock.set(first.reset_at);
    let decision = registry.admit(&convert_route(), &ip, clock.now());
    assert!(decision.allowed);
    assert_eq!(decision.remaining, 99);
    assert_eq!(decision.reset_at, Timestamp(first.reset_at.0 + WINDOW_MS));
}

#[test]
fn one_millisecond_before_reset_is_still_rejected() {
    let (registry, clock) = make_registry();
    let ip = client("1.1.1.1");

    for _ in 0..100 {
        registry.admit(&convert_route(), &ip, clock.now());
    }

    clock.advance(Duration::from_millis(WINDOW_MS - 1));
    let now = clock.now();
    let decision = registry.admit(&convert_route(), &ip, now);
    assert!(!decision.allowed);
    assert_eq!(decision.retry_after_secs(now), 1);
}

#[test]
fn rejected_window_does_not_extend_reset() {
    let (registry, clock) = make_registry();
    let ip = client("1.1.1.1");
    let start = clock.now();

    for _ in 0..100 {
        registry.admit(&expenses_route(), &ip, start);
    }

    clock.advance(Duration::from_secs(600));
    let rejected = registry.admit(&expenses_route(), &ip, clock.now());
    assert_eq!(rejected.reset_at, Timestamp(start.0 + WINDOW_MS));
}

#[test]
fn retry_after_is_ceiling_of_remaining_window() {
    let (registry, clock) = make_registry();
    let ip = client("1.1.1.1");

    for _ in 0..100 {
        registry.admit(&convert_route(), &ip, clock.now());
    }

    let now = clock.now();
    let rejected = registry.admit(&convert_route(), &ip, now);
    assert_eq!(rejected.retry_after_secs(now), 900);

    clock.advance(Duration::from_millis(1_500));
    let now = clock.now();
    let rejected = registry.admit(&convert_route(), &ip, now);
    // 898.5s left rounds up
    assert_eq!(rejected.retry_after_secs(now), 899);
}

#[test]
fn clock_stepping_backwards_keeps_retry_after_within_window() {
    let config = RateLimitConfig::new(1, Duration::from_millis(WINDOW_MS));
    let clock = Arc::new(ManualClock::new(Timestamp(10_000_000)));
    let registry = RateLimitRegistry::new(config, clock.clone());
    let ip = client("1.1.1.1");

    assert!(registry.admit_now(&convert_route(), &ip).0.allowed);

    clock.set(Timestamp(9_000_000));
    let (rejected, now) = registry.admit_now(&convert_route(), &ip);
    assert!(!rejected.allowed, "stepping back must not grant a fresh quota");
    let retry = rejected.retry_after_secs(now);
    assert!(retry > 0 && retry <= 900, "retry_after {retry} outside (0, 900]");
    assert!(rejected.reset_after_secs(now) <= 900);

    // The re-anchored window still expires one full window later.
    clock.set(Timestamp(9_000_000 + WINDOW_MS));
    assert!(registry.admit_now(&convert_route(), &ip).0.allowed);
}

#[test]
fn admit_now_uses_injected_clock() {
    let (registry, clock) = make_registry();
    clock.advance(Duration::from_secs(5));

    let (decision, now) = registry.admit_now(&convert_route(), &client("1.1.1.1"));
    assert_eq!(now, clock.now());
    assert_eq!(decision.reset_at, Timestamp(now.0 + WINDOW_MS));
}

#[test]
fn can_burst_twice_the_limit_across_a_boundary() {
    let (registry, clock) = make_registry();
    let ip = client("1.1.1.1");

    // One request opens the window, the rest arrive just before it closes.
    registry.admit(&convert_route(), &ip, clock.now());
    clock.advance(Duration::from_millis(WINDOW_MS - 1));
    let mut admitted = 1;
    for _ in 0..99 {
        admitted += registry.admit(&convert_route(), &ip, clock.now()).allowed as u32;
    }

    clock.advance(Duration::from_millis(1));
    for _ in 0..100 {
        admitted += registry.admit(&convert_route(), &ip, clock.now()).allowed as u32;
    }

    assert_eq!(admitted, 200);
}

#[test]
fn custom_limit_and_window() {
    let clock = Arc::new(ManualClock::new(Timestamp(0)));
    let registry = RateLimitRegistry::new(
        RateLimitConfig::new(3, Duration::from_secs(10)),
        clock.clone(),
    );
    let ip = client("1.1.1.1");

    let remaining: Vec<_> = (0..4)
        .map(|_| registry.admit(&convert_route(), &ip, clock.now()))
        .map(|d| (d.allowed, d.remaining))
        .collect();
    assert_eq!(remaining, vec![(true, 2), (true, 1), (true, 0), (false, 0)]);

    clock.advance(Duration::from_secs(10));
    assert!(registry.admit(&convert_route(), &ip, clock.now()).allowed);
}
