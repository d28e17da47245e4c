//! Platform capabilities
//!
//! Clock and random-number sources the engine depends on. Each capability is a
//! trait with one real implementation and one deterministic fake for tests.
//! The byte-stream transport lives with the protocol in [`crate::protocol`].

mod clock;
mod random;

pub use clock::{ManualClock, SystemClock};
pub use random::{EntropyRandom, ScriptedRandom, SeededRandom};

/// Monotonic millisecond clock
pub trait TimeProvider {
    /// Milliseconds since an arbitrary fixed origin. Wraps at `u32::MAX`.
    fn millis(&self) -> u32;
}

/// Seedable uniform integer generator
pub trait RandomProvider {
    /// Restart the sequence from `seed`
    fn seed(&mut self, seed: u32);

    /// Uniform value in `[min, max)`. Returns `min` when the range is empty.
    fn random_range(&mut self, min: i32, max: i32) -> i32;

    /// Uniform value in `[0, max)`
    fn random_below(&mut self, max: i32) -> i32 {
        self.random_range(0, max)
    }
}

impl<T: TimeProvider + ?Sized> TimeProvider for &T {
    fn millis(&self) -> u32 {
        (**self).millis()
    }
}

impl<T: TimeProvider + ?Sized> TimeProvider for Box<T> {
    fn millis(&self) -> u32 {
        (**self).millis()
    }
}

impl<R: RandomProvider + ?Sized> RandomProvider for Box<R> {
    fn seed(&mut self, seed: u32) {
        (**self).seed(seed)
    }

    fn random_range(&mut self, min: i32, max: i32) -> i32 {
        (**self).random_range(min, max)
    }
}
