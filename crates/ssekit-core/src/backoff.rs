//! Jittered retry delays.
//!
//! The retry delay is `min + uniform(0, ceiling)` where the ceiling grows
//! along a Fibonacci sequence in 100 ms steps. Growth stops once
//! `min + ceiling` passes `max`, so the ceiling never exceeds `max` by more
//! than one growth step. Randomising the whole window (rather than adding a
//! small jitter to a fixed delay) keeps many clients from reconnecting in
//! lockstep after a shared outage.
//!
//! ```rust
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use ssekit_core::backoff::{FibonacciBackoff, growth_ceiling};
//! use std::time::Duration;
//!
//! let backoff = FibonacciBackoff::new(Duration::from_millis(500), Duration::from_secs(5));
//! let mut rng = StdRng::seed_from_u64(7);
//!
//! let delay = backoff.delay_for_attempt(3, &mut rng);
//! assert!(delay >= Duration::from_millis(500));
//! assert!(delay <= Duration::from_millis(500) + growth_ceiling(3, backoff.min, backoff.max));
//! ```

use std::time::Duration;

use rand::Rng;

/// Size of one growth step, in milliseconds.
const STEP_MS: u64 = 100;

/// Fibonacci-style backoff bounded by a minimum and maximum interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FibonacciBackoff {
    /// Lower bound of every delay.
    pub min: Duration,
    /// Point past which the jitter window stops growing.
    pub max: Duration,
}

impl FibonacciBackoff {
    /// Create a new backoff with the given bounds.
    #[must_use]
    pub const fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    /// Width of the jitter window for the given attempt (1-indexed).
    #[must_use]
    pub fn ceiling_for_attempt(&self, attempt: u32) -> Duration {
        growth_ceiling(attempt, self.min, self.max)
    }

    /// Draw a delay for the given attempt (1-indexed).
    pub fn delay_for_attempt<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        compute_retry_delay(attempt, self.min, self.max, rng)
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Growth multiplier reached after `attempt` attempts.
fn multiplier(attempt: u32, min_ms: u64, max_ms: u64) -> u64 {
    let (mut prev, mut current) = (1_u64, 1_u64);

    for _ in 1..attempt {
        if min_ms.saturating_add(current.saturating_mul(STEP_MS)) > max_ms {
            break;
        }
        let next = prev.saturating_add(current);
        if next == current {
            // saturated
            break;
        }
        prev = current;
        current = next;
    }

    current
}

/// Width of the jitter window for `attempt`.
///
/// Non-decreasing in `attempt`; constant once `min + ceiling > max`.
/// Attempts `0` and `1` both yield one step (100 ms).
#[must_use]
pub fn growth_ceiling(attempt: u32, min: Duration, max: Duration) -> Duration {
    Duration::from_millis(multiplier(attempt, millis(min), millis(max)).saturating_mul(STEP_MS))
}

/// Compute the delay before retry number `attempt`.
///
/// Returns `min + uniform(0, growth_ceiling(attempt, min, max))`. The random
/// source is injected so callers can seed it.
pub fn compute_retry_delay<R: Rng + ?Sized>(
    attempt: u32,
    min: Duration,
    max: Duration,
    rng: &mut R,
) -> Duration {
    let ceiling_ms = millis(growth_ceiling(attempt, min, max));
    let jitter_ms = rng.gen_range(0..=ceiling_ms);
    min.saturating_add(Duration::from_millis(jitter_ms))
}

/// Delay before reconnecting after the server ended the stream.
///
/// `reconnect_interval + uniform(0, min)`. Independent of the attempt
/// counter: a clean close from the peer is not a failure.
pub fn peer_close_delay<R: Rng + ?Sized>(
    reconnect_interval: Duration,
    min: Duration,
    rng: &mut R,
) -> Duration {
    let jitter_ms = rng.gen_range(0..=millis(min));
    reconnect_interval.saturating_add(Duration::from_millis(jitter_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const MIN: Duration = Duration::from_millis(1_000);
    const MAX: Duration = Duration::from_millis(3_000);

    #[test]
    fn test_first_attempt_uses_single_step() {
        assert_eq!(growth_ceiling(0, MIN, MAX), Duration::from_millis(100));
        assert_eq!(growth_ceiling(1, MIN, MAX), Duration::from_millis(100));

        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            let delay = compute_retry_delay(1, MIN, MAX, &mut rng);
            assert!(delay >= MIN);
            assert!(delay <= MIN + Duration::from_millis(100));
        }
    }

    #[test]
    fn test_ceiling_follows_fibonacci() {
        let max = Duration::from_secs(3600);
        let ceilings: Vec<u64> = (1..=7)
            .map(|a| growth_ceiling(a, MIN, max).as_millis() as u64)
            .collect();
        assert_eq!(ceilings, vec![100, 200, 300, 500, 800, 1300, 2100]);
    }

    #[test]
    fn test_ceiling_stops_growing_past_max() {
        // 1000 + 2100 > 3000, so growth stops at 2100.
        let stable = growth_ceiling(7, MIN, MAX);
        assert_eq!(stable, Duration::from_millis(2100));
        for attempt in 8..50 {
            assert_eq!(growth_ceiling(attempt, MIN, MAX), stable);
        }
    }

    #[test]
    fn test_ceiling_is_non_decreasing() {
        for (min_ms, max_ms) in [(0, 0), (0, 500), (100, 10_000), (5_000, 5_000), (250, 60_000)] {
            let min = Duration::from_millis(min_ms);
            let max = Duration::from_millis(max_ms);
            let mut last = Duration::ZERO;
            for attempt in 1..64 {
                let ceiling = growth_ceiling(attempt, min, max);
                assert!(ceiling >= last, "ceiling shrank at attempt {attempt}");
                last = ceiling;
            }
        }
    }

    #[test]
    fn test_delay_never_below_min() {
        let mut rng = StdRng::seed_from_u64(42);
        for attempt in 1..40 {
            let delay = compute_retry_delay(attempt, MIN, MAX, &mut rng);
            assert!(delay >= MIN);
            assert!(delay <= MIN + growth_ceiling(attempt, MIN, MAX));
        }
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let backoff = FibonacciBackoff::new(MIN, MAX);
        let mut a = StdRng::seed_from_u64(9);
        let mut b = StdRng::seed_from_u64(9);
        for attempt in 1..10 {
            assert_eq!(
                backoff.delay_for_attempt(attempt, &mut a),
                backoff.delay_for_attempt(attempt, &mut b)
            );
        }
    }

    #[test]
    fn test_unbounded_max_does_not_overflow() {
        let ceiling = growth_ceiling(u32::MAX, Duration::ZERO, Duration::MAX);
        assert!(ceiling > Duration::ZERO);
    }

    #[test]
    fn test_peer_close_delay_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        let interval = Duration::from_millis(2_000);
        for _ in 0..100 {
            let delay = peer_close_delay(interval, MIN, &mut rng);
            assert!(delay >= interval);
            assert!(delay <= interval + MIN);
        }
    }
}
