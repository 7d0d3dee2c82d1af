//! Nullable infrastructure for deterministic testing.
//!
//! Every external dependency of the settlement layer (time, randomness,
//! persistence, network submission) sits behind a trait. The types here
//! implement those traits in memory with values the test controls, and never
//! touch the filesystem or a real network.

pub mod clock;
pub mod connector;
pub mod random;
pub mod store;

pub use clock::NullClock;
pub use connector::NullConnector;
pub use random::NullRandom;
pub use store::NullStore;
