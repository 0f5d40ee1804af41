// Lugnut
// Copyright 2025 The Lugnut Authors
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Daily request quotas, enforced per client address and per route.
//!
//! Windows are calendar days in UTC: the counter key embeds the current date
//! from the injected clock, so every counter implicitly resets at midnight
//! UTC.  The expiry on the backing map is only there to garbage-collect the
//! keys of past days.

use crate::clocks::Clock;
use crate::rest::RestError;
use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use futures::lock::Mutex;
use lru_time_cache::LruCache;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use time::Date;

/// How long stale counters stay in memory before eviction.  Must exceed one day for a
/// counter to survive its own window.
const COUNTERS_TTL: Duration = Duration::from_secs(2 * 24 * 60 * 60);

/// Maximum number of live counters.
const COUNTERS_CAPACITY: usize = 10 * 1024;

/// A per-route daily request quota.
#[derive(Clone, Copy)]
pub(crate) struct DailyQuota {
    /// Stable name of the route, used to key the counters.
    route: &'static str,

    /// Maximum number of requests per client address and calendar day.
    max_per_day: u32,
}

/// Quota for customer creation.
pub(crate) const CUSTOMER_CREATE: DailyQuota =
    DailyQuota { route: "customer_create", max_per_day: 5 };

/// Quota for customer updates.
pub(crate) const CUSTOMER_UPDATE: DailyQuota =
    DailyQuota { route: "customer_update", max_per_day: 5 };

/// Quota for customer deletions.
pub(crate) const CUSTOMER_DELETE: DailyQuota =
    DailyQuota { route: "customer_delete", max_per_day: 5 };

/// Quota for mechanic creation.
pub(crate) const MECHANIC_CREATE: DailyQuota =
    DailyQuota { route: "mechanic_create", max_per_day: 5 };

/// Quota for mechanic updates.
pub(crate) const MECHANIC_UPDATE: DailyQuota =
    DailyQuota { route: "mechanic_update", max_per_day: 5 };

/// Quota for mechanic deletions.
pub(crate) const MECHANIC_DELETE: DailyQuota =
    DailyQuota { route: "mechanic_delete", max_per_day: 5 };

/// Quota for ticket creation.  A small shop will not open more than this many tickets in
/// one day.
pub(crate) const TICKET_CREATE: DailyQuota =
    DailyQuota { route: "ticket_create", max_per_day: 100 };

/// Quota for ticket updates.
pub(crate) const TICKET_UPDATE: DailyQuota =
    DailyQuota { route: "ticket_update", max_per_day: 100 };

/// Counts requests per (client address, route, UTC day) and enforces the daily caps.
pub struct RateLimiter {
    /// Clock to obtain the current date from.
    clock: Arc<dyn Clock + Send + Sync>,

    /// Live counters.  Entries for past days are dead weight and eventually expire.
    counts: Mutex<LruCache<(IpAddr, &'static str, Date), u32>>,
}

impl RateLimiter {
    /// Creates a new rate limiter backed by `clock`.
    pub fn new(clock: Arc<dyn Clock + Send + Sync>) -> Self {
        let counts = LruCache::with_expiry_duration_and_capacity(COUNTERS_TTL, COUNTERS_CAPACITY);
        Self { clock, counts: Mutex::from(counts) }
    }

    /// Accounts one request from `addr` against `quota` and tells whether it is allowed.
    ///
    /// Rejected requests are counted too: a client that keeps hammering a closed door does
    /// not get the door reopened any sooner.
    pub(crate) async fn acquire(&self, addr: IpAddr, quota: DailyQuota) -> bool {
        let today = self.clock.now_utc().date();
        let key = (addr, quota.route, today);

        let mut counts = self.counts.lock().await;
        let count = match counts.get_mut(&key) {
            Some(count) => {
                *count += 1;
                *count
            }
            None => {
                counts.insert(key, 1);
                1
            }
        };
        count <= quota.max_per_day
    }
}

/// Returns the network address of the client that sent `request`.
///
/// Requests served through a plain `Router` (as the tests do) carry no connection
/// information; those are all attributed to localhost.
fn client_addr(request: &Request) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

/// Middleware entry point.
pub(crate) async fn handle(
    State((limiter, quota)): State<(Arc<RateLimiter>, DailyQuota)>,
    request: Request,
    next: Next,
) -> Response {
    if !limiter.acquire(client_addr(&request), quota).await {
        return RestError::Throttled("Rate limit exceeded; try again tomorrow".to_owned())
            .into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clocks::testutils::SettableClock;
    use time::macros::datetime;

    /// Quota used throughout these tests.
    const TEST_QUOTA: DailyQuota = DailyQuota { route: "test", max_per_day: 3 };

    /// Creates a limiter with a clock under test control.
    fn setup() -> (RateLimiter, Arc<SettableClock>) {
        let clock = Arc::from(SettableClock::new(datetime!(2025-06-05 12:00:00 UTC)));
        (RateLimiter::new(clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_allows_up_to_the_cap() {
        let (limiter, _clock) = setup();
        let addr = "192.0.2.1".parse().unwrap();

        for _ in 0..3 {
            assert!(limiter.acquire(addr, TEST_QUOTA).await);
        }
        assert!(!limiter.acquire(addr, TEST_QUOTA).await);
        assert!(!limiter.acquire(addr, TEST_QUOTA).await);
    }

    #[tokio::test]
    async fn test_addresses_are_independent() {
        let (limiter, _clock) = setup();
        let addr1: IpAddr = "192.0.2.1".parse().unwrap();
        let addr2: IpAddr = "192.0.2.2".parse().unwrap();

        for _ in 0..3 {
            assert!(limiter.acquire(addr1, TEST_QUOTA).await);
        }
        assert!(!limiter.acquire(addr1, TEST_QUOTA).await);
        assert!(limiter.acquire(addr2, TEST_QUOTA).await);
    }

    #[tokio::test]
    async fn test_routes_are_independent() {
        let (limiter, _clock) = setup();
        let addr = "192.0.2.1".parse().unwrap();

        /// A second quota that shares nothing with `TEST_QUOTA`.
        const OTHER_QUOTA: DailyQuota = DailyQuota { route: "other", max_per_day: 3 };

        for _ in 0..3 {
            assert!(limiter.acquire(addr, TEST_QUOTA).await);
        }
        assert!(!limiter.acquire(addr, TEST_QUOTA).await);
        assert!(limiter.acquire(addr, OTHER_QUOTA).await);
    }

    #[tokio::test]
    async fn test_resets_at_utc_midnight() {
        let (limiter, clock) = setup();
        let addr = "192.0.2.1".parse().unwrap();

        for _ in 0..3 {
            assert!(limiter.acquire(addr, TEST_QUOTA).await);
        }
        assert!(!limiter.acquire(addr, TEST_QUOTA).await);

        // The setup clock starts at noon; this crosses into the next calendar day.
        clock.advance(Duration::from_secs(12 * 60 * 60));
        assert!(limiter.acquire(addr, TEST_QUOTA).await);
    }
}
