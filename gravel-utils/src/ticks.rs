//! Fixed-rate loops.
use std::{
    num::NonZeroU64,
    time::{Duration, Instant},
};

/// Calls a function at a fixed rate until it returns `false`.
///
/// A tick that overruns its slot is logged and the next one starts
/// immediately.
pub struct TickLoop<F: FnMut() -> bool> {
    interval: Duration,
    func: F,
}

impl<F: FnMut() -> bool> TickLoop<F> {
    pub fn new(per_second: NonZeroU64, func: F) -> Self {
        Self {
            interval: Duration::from_nanos(1_000_000_000 / per_second.get()),
            func,
        }
    }

    /// Time budget of a single tick.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs until the function returns `false`, returning the number
    /// of ticks run.
    pub fn run(mut self) -> u64 {
        let mut ticks = 0;
        loop {
            let start = Instant::now();
            ticks += 1;
            if !(self.func)() {
                return ticks;
            }
            let took = start.elapsed();
            if took < self.interval {
                std::thread::sleep(self.interval - took);
            } else {
                tracing::warn!(
                    "tick {ticks} took {}ms, budget is {}ms",
                    took.as_millis(),
                    self.interval.as_millis()
                );
            }
        }
    }
}
