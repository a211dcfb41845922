use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// A gate which enforces a minimum delay between permitted calls.
///
/// The gate is shared by every thread which calls an external provider and
/// so bounds the total call rate regardless of how many threads are used.
#[derive(Debug)]
pub struct RateLimiter {
    delay: Duration,
    last_grant: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a `RateLimiter` with a minimum `delay` between grants.
    ///
    /// A zero `delay` never blocks.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_grant: Mutex::new(None),
        }
    }

    /// The minimum delay between grants.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Block until at least `delay` has elapsed since the previous grant.
    ///
    /// The lock is held while sleeping so that concurrent callers are
    /// granted strictly one after another.
    pub fn acquire(&self) {
        let mut last_grant = self.last_grant.lock();
        if let Some(last) = *last_grant {
            let elapsed = last.elapsed();
            if elapsed < self.delay {
                std::thread::sleep(self.delay - elapsed);
            }
        }
        *last_grant = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use test_case::test_case;

    const DELAY: Duration = Duration::from_millis(20);

    #[test_case(1; "single acquire")]
    #[test_case(2; "two acquires")]
    #[test_case(5; "five acquires")]
    fn test_sequential_acquire(count: u32) {
        let limiter = RateLimiter::new(DELAY);
        let start = Instant::now();
        for _ in 0..count {
            limiter.acquire();
        }
        assert!(start.elapsed() >= DELAY * (count - 1));
    }

    #[test]
    fn test_first_acquire_does_not_wait() {
        let limiter = RateLimiter::new(Duration::from_secs(10));
        let start = Instant::now();
        limiter.acquire();
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_zero_delay() {
        let limiter = RateLimiter::new(Duration::ZERO);
        let start = Instant::now();
        for _ in 0..100 {
            limiter.acquire();
        }
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_concurrent_acquire() {
        const THREADS: u32 = 4;
        const PER_THREAD: u32 = 2;
        let limiter = Arc::new(RateLimiter::new(DELAY));
        let start = Instant::now();
        let handles = (0..THREADS)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || {
                    for _ in 0..PER_THREAD {
                        limiter.acquire();
                    }
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(start.elapsed() >= DELAY * (THREADS * PER_THREAD - 1));
    }
}
