//! Abstract storage for the settlement orchestrator.
//!
//! The orchestrator depends only on these traits. A persistent backend lives
//! outside the core; `dualnet-nullables` provides the in-memory one.

pub mod error;
pub mod payment;
pub mod settlement;

pub use error::StoreError;
pub use payment::{PaymentRecord, PaymentStore};
pub use settlement::{NewSettlement, Settlement, SettlementStore};
