//! Utilities shared by the gravel crates.
pub mod ticks;

pub use ticks::TickLoop;
