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

//! Per-route request admission.
//!
//! The [`RateLimitRegistry`] keeps one fixed-window counter per
//! `(route, client)` pair. Windows roll over lazily: a bucket whose window
//! has elapsed is reset on its next access, there is no background timer.
//!
//! ```text
//!  window N                        window N+1
//!  |----- count: 1..=limit -----|  |----- count: 1..=limit -----|
//!  ^ window_start                  ^ first access at/after reset_at
//! ```
//!
//! Fixed windows allow up to `2 * limit` requests around a boundary
//! (a full window's worth at the end of N, another at the start of N+1).
//!
//! # Thread Safety
//!
//! Buckets live in a [`DashMap`]. The entry guard is held across the
//! check-and-increment, so two concurrent calls for the same key never
//! observe the same pre-increment count.

use crate::base::{ClientIdentity, RouteId};
use crate::clock::{Clock, Timestamp};
use dashmap::DashMap;
use serde::Serialize;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Quota applied independently to every `(route, client)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub limit: u32,
    pub window: Duration,
}

impl RateLimitConfig {
    pub const DEFAULT_LIMIT: u32 = 100;
    pub const DEFAULT_WINDOW: Duration = Duration::from_secs(15 * 60);

    pub fn new(limit: u32, window: Duration) -> Self {
        Self { limit, window }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LIMIT, Self::DEFAULT_WINDOW)
    }
}

/// Outcome of a single admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub allowed: bool,
    pub remaining: u32,
    pub limit: u32,
    pub reset_at: Timestamp,
    /// Window the decision was made under; bounds the retry hints.
    #[serde(skip)]
    pub window: Duration,
}

impl Decision {
    /// Seconds until the window resets, rounded up and kept within
    /// `1..=window` seconds.
    ///
    /// This is the `Retry-After` value for a rejected request.
    pub fn retry_after_secs(&self, now: Timestamp) -> u64 {
        self.reset_after_secs(now).max(1)
    }

    /// Seconds until the window resets, rounded up and capped at the window
    /// length. Zero once it has passed.
    pub fn reset_after_secs(&self, now: Timestamp) -> u64 {
        let window_secs = self.window.as_millis().div_ceil(1000);
        let secs = self.reset_at.millis_since(now).div_ceil(1000);
        secs.min(u64::try_from(window_secs).unwrap_or(u64::MAX))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct BucketKey {
    route: RouteId,
    client: ClientIdentity,
}

#[derive(Debug)]
struct Bucket {
    window_start: Timestamp,
    /// Requests admitted in the current window.
    count: u32,
}

impl Bucket {
    fn new(now: Timestamp) -> Self {
        Self {
            window_start: now,
            count: 0,
        }
    }

    /// Starts a fresh window once the current one has elapsed. A clock that
    /// stepped backwards re-anchors the window at `now` but keeps the count.
    fn roll_over(&mut self, now: Timestamp, window: Duration) {
        if now < self.window_start {
            self.window_start = now;
        } else if u128::from(now.millis_since(self.window_start)) >= window.as_millis() {
            self.window_start = now;
            self.count = 0;
        }
    }
}

/// Fixed-window admission registry.
///
/// # Invariants
///
/// - A bucket's count never exceeds the configured limit.
/// - Within one window the first `limit` calls for a key are admitted and
///   every later call is rejected.
/// - Buckets for different routes are independent, even for the same client.
pub struct RateLimitRegistry {
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
    buckets: DashMap<BucketKey, Bucket>,
}

impl RateLimitRegistry {
    pub fn new(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            buckets: DashMap::new(),
        }
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Decides whether a request to `route` from `client` may proceed at `now`.
    ///
    /// Rejections are logged once at info level before the decision is
    /// returned. Never fails.
    pub fn admit(&self, route: &RouteId, client: &ClientIdentity, now: Timestamp) -> Decision {
        let limit = self.config.limit;
        let key = BucketKey {
            route: route.clone(),
            client: client.clone(),
        };

        let decision = {
            let mut bucket = self.buckets.entry(key).or_insert_with(|| Bucket::new(now));
            bucket.roll_over(now, self.config.window);

            let allowed = bucket.count < limit;
            if allowed {
                bucket.count += 1;
            }
            debug_assert!(
                bucket.count <= limit,
                "Invariant violated: bucket count {} exceeds limit {}",
                bucket.count,
                limit
            );

            Decision {
                allowed,
                remaining: if allowed { limit - bucket.count } else { 0 },
                limit,
                reset_at: bucket.window_start.saturating_add(self.config.window),
                window: self.config.window,
            }
        };

        if !decision.allowed {
            info!(
                client = %client,
                route = %route,
                timestamp = now.as_millis(),
                "rate limit exceeded"
            );
        }

        decision
    }

    /// [`RateLimitRegistry::admit`] at the injected clock's current time.
    pub fn admit_now(&self, route: &RouteId, client: &ClientIdentity) -> (Decision, Timestamp) {
        let now = self.clock.now();
        (self.admit(route, client, now), now)
    }

    /// Derives the quota identity for a request.
    ///
    /// With `trust_proxy` the first `X-Forwarded-For` entry wins; otherwise the
    /// header is ignored so callers cannot pick their own bucket.
    pub fn client_identity(
        forwarded_for: Option<&str>,
        peer: Option<IpAddr>,
        trust_proxy: bool,
    ) -> ClientIdentity {
        if trust_proxy {
            let first = forwarded_for
                .and_then(|value| value.split(',').next())
                .map(str::trim)
                .filter(|first| !first.is_empty());
            if let Some(first) = first {
                return ClientIdentity(first.to_string());
            }
        }

        peer.map(|addr| ClientIdentity(addr.to_string()))
            .unwrap_or_else(ClientIdentity::unknown)
    }

    /// Number of `(route, client)` buckets created so far.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

impl std::fmt::Debug for RateLimitRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitRegistry")
            .field("config", &self.config)
            .field("buckets", &self.buckets.len())
            .finish()
    }
}
