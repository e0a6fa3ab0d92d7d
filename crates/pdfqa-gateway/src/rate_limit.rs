use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

const MAX_RATE_LIMIT_ENTRIES: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Limited,
}

/// Sliding-window limiter keyed by client address.
///
/// Each client may make `limit` requests within any `window`. A limit of 0
/// disables limiting.
#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    hits: Mutex<HashMap<IpAddr, VecDeque<Instant>>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Record a request from `key` at `now` unless it would exceed the limit.
    ///
    /// Timestamps older than the window are pruned on every call, including
    /// rejected ones. Rejected requests are not recorded.
    pub async fn check(&self, key: IpAddr, now: Instant) -> RateDecision {
        if self.limit == 0 {
            return RateDecision::Allowed;
        }

        let window = self.window;
        let mut hits = self.hits.lock().await;

        if hits.len() >= MAX_RATE_LIMIT_ENTRIES && !hits.contains_key(&key) {
            hits.retain(|_, ts| {
                ts.retain(|t| now.duration_since(*t) < window);
                !ts.is_empty()
            });
        }

        let timestamps = hits.entry(key).or_default();
        timestamps.retain(|t| now.duration_since(*t) < window);

        if timestamps.len() >= self.limit as usize {
            tracing::debug!(%key, "rate limit exceeded");
            return RateDecision::Limited;
        }
        timestamps.push_back(now);
        RateDecision::Allowed
    }

    #[cfg(test)]
    async fn tracked_identities(&self) -> usize {
        self.hits.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[tokio::test]
    async fn sixth_request_in_window_is_limited() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60));
        let start = Instant::now();
        for i in 0..5 {
            let at = start + Duration::from_secs(i);
            assert_eq!(limiter.check(ip(1), at).await, RateDecision::Allowed);
        }
        let at = start + Duration::from_secs(10);
        assert_eq!(limiter.check(ip(1), at).await, RateDecision::Limited);
    }

    #[tokio::test]
    async fn window_slides_past_earliest_request() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60));
        let start = Instant::now();
        for i in 0..5 {
            limiter.check(ip(1), start + Duration::from_secs(i)).await;
        }
        // Exactly one window after the first request it no longer counts.
        let at = start + Duration::from_secs(60);
        assert_eq!(limiter.check(ip(1), at).await, RateDecision::Allowed);
        assert_eq!(limiter.check(ip(1), at).await, RateDecision::Limited);
    }

    #[tokio::test]
    async fn rejected_requests_are_not_recorded() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();
        assert_eq!(limiter.check(ip(1), start).await, RateDecision::Allowed);
        for i in 1..30 {
            let at = start + Duration::from_secs(i);
            assert_eq!(limiter.check(ip(1), at).await, RateDecision::Limited);
        }
        let at = start + Duration::from_secs(60);
        assert_eq!(limiter.check(ip(1), at).await, RateDecision::Allowed);
    }

    #[tokio::test]
    async fn clients_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();
        assert_eq!(limiter.check(ip(1), now).await, RateDecision::Allowed);
        assert_eq!(limiter.check(ip(1), now).await, RateDecision::Limited);
        assert_eq!(limiter.check(ip(2), now).await, RateDecision::Allowed);
    }

    #[tokio::test]
    async fn zero_limit_disables() {
        let limiter = RateLimiter::new(0, Duration::from_secs(60));
        let now = Instant::now();
        for _ in 0..100 {
            assert_eq!(limiter.check(ip(1), now).await, RateDecision::Allowed);
        }
        assert_eq!(limiter.tracked_identities().await, 0);
    }

    #[tokio::test]
    async fn stale_identities_swept_at_capacity() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60));
        let start = Instant::now();
        for i in 0..MAX_RATE_LIMIT_ENTRIES {
            let octets = u32::try_from(i).unwrap().to_be_bytes();
            let key = IpAddr::V4(Ipv4Addr::from(octets));
            limiter.check(key, start).await;
        }
        assert_eq!(limiter.tracked_identities().await, MAX_RATE_LIMIT_ENTRIES);

        let later = start + Duration::from_secs(61);
        limiter.check(ip(255), later).await;
        assert_eq!(limiter.tracked_identities().await, 1);
    }

    #[tokio::test]
    async fn concurrent_checks_never_exceed_limit() {
        let limiter = std::sync::Arc::new(RateLimiter::new(5, Duration::from_secs(60)));
        let now = Instant::now();
        let handles: Vec<_> = (0..50)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move { limiter.check(ip(7), now).await })
            })
            .collect();

        let mut allowed = 0;
        for h in handles {
            if h.await.unwrap() == RateDecision::Allowed {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 5);
    }

    mod proptest_rate_limit {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn allowed_requests_fit_every_window(
                limit in 1u32..8,
                offsets in proptest::collection::vec(0u64..300, 1..60),
            ) {
                let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
                let mut offsets = offsets;
                offsets.sort_unstable();
                let window = 60u64;

                let allowed: Vec<u64> = rt.block_on(async {
                    let limiter = RateLimiter::new(limit, Duration::from_secs(window));
                    let start = Instant::now();
                    let mut allowed = Vec::new();
                    for &off in &offsets {
                        let at = start + Duration::from_secs(off);
                        if limiter.check(ip(1), at).await == RateDecision::Allowed {
                            allowed.push(off);
                        }
                    }
                    allowed
                });

                for &t in &allowed {
                    let in_window = allowed.iter().filter(|&&a| a <= t && t - a < window).count();
                    prop_assert!(in_window <= limit as usize);
                }
            }

            #[test]
            fn first_requests_up_to_limit_always_allowed(limit in 1u32..20) {
                let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
                let decisions = rt.block_on(async {
                    let limiter = RateLimiter::new(limit, Duration::from_secs(60));
                    let now = Instant::now();
                    let mut out = Vec::new();
                    for _ in 0..=limit {
                        out.push(limiter.check(ip(1), now).await);
                    }
                    out
                });
                let allowed = decisions.iter().filter(|d| **d == RateDecision::Allowed).count();
                prop_assert_eq!(allowed, limit as usize);
                prop_assert_eq!(decisions.last().copied(), Some(RateDecision::Limited));
            }
        }
    }
}
