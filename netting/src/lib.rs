//! Gridlock resolution by multilateral netting.
//!
//! Obligations between participants queue up when a sender lacks the funds
//! to pay gross. A resolution run projects every participant's net position
//! assuming the whole queue clears, defers obligations from insolvent
//! participants until everyone left is solvent, then commits the remainder
//! in one step.
//!
//! The removal order is greedy and does not maximise the cleared value.

pub mod config;
pub mod engine;
pub mod error;
pub mod obligation;
pub mod participant;
pub mod projection;

pub use config::NettingConfig;
pub use engine::{BalanceChange, NettingEngine, Resolution};
pub use error::NettingError;
pub use obligation::{Obligation, ObligationId, Priority};
pub use participant::Participant;
pub use projection::{multilateral_net, NetPosition};
