pub mod clock;
pub mod join;

pub use clock::SampleClock;
pub use join::join_within;
