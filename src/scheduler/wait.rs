//! Wait Strategy
//!
//! REDESIGN FLAGS §9's explicit ask: replace ad-hoc spin/sleep combinations
//! with a substitutable wait strategy so the scheduler's pacing loop can run
//! against a deterministic virtual clock in tests. `spec.md` §4.5/§9: a
//! waitable timer for waits >= 0.5 ms, a spin loop below that, yielding once
//! per N spins.

use std::time::{Duration, Instant};

const SPIN_THRESHOLD: Duration = Duration::from_micros(500);
const YIELD_EVERY_N_SPINS: u32 = 64;

/// Abstracts the scheduler's present-time pacing wait so tests can
/// substitute a logical clock instead of sleeping in real time.
pub trait WaitStrategy {
    /// Current time, in the same clock domain this strategy waits against.
    fn now(&self) -> Instant;

    /// Blocks (or, for a virtual strategy, advances the logical clock)
    /// until `deadline`.
    fn wait_until(&mut self, deadline: Instant);
}

/// Real wall-clock wait strategy: sleeps for waits >= 0.5 ms, spins
/// (yielding once every [`YIELD_EVERY_N_SPINS`] spins) below that.
#[derive(Debug, Default)]
pub struct RealtimeWaitStrategy;

impl WaitStrategy for RealtimeWaitStrategy {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wait_until(&mut self, deadline: Instant) {
        loop {
            let now = Instant::now();
            if now >= deadline {
                return;
            }
            let remaining = deadline - now;
            if remaining >= SPIN_THRESHOLD {
                std::thread::sleep(remaining - SPIN_THRESHOLD);
            } else {
                let mut spins = 0u32;
                while Instant::now() < deadline {
                    spins += 1;
                    if spins % YIELD_EVERY_N_SPINS == 0 {
                        std::thread::yield_now();
                    }
                }
                return;
            }
        }
    }
}

/// Deterministic logical-clock wait strategy for tests: `wait_until` jumps
/// the clock straight to the deadline instead of sleeping.
#[derive(Debug)]
pub struct VirtualWaitStrategy {
    now: Instant,
}

impl VirtualWaitStrategy {
    #[must_use]
    pub fn new(start: Instant) -> Self {
        Self { now: start }
    }

    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }
}

impl WaitStrategy for VirtualWaitStrategy {
    fn now(&self) -> Instant {
        self.now
    }

    fn wait_until(&mut self, deadline: Instant) {
        if deadline > self.now {
            self.now = deadline;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn virtual_wait_strategy_never_moves_backward() {
        let mut strategy = VirtualWaitStrategy::new(Instant::now());
        let t0 = strategy.now();
        strategy.wait_until(t0 - Duration::from_millis(5));
        assert_eq!(strategy.now(), t0);
    }

    #[test]
    fn virtual_wait_strategy_advances_to_deadline() {
        let mut strategy = VirtualWaitStrategy::new(Instant::now());
        let deadline = strategy.now() + Duration::from_millis(16);
        strategy.wait_until(deadline);
        assert_eq!(strategy.now(), deadline);
    }
}
