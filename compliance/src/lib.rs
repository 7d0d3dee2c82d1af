//! Compliance and banking-policy enforcement.
//!
//! - [`ComplianceManager`]: sanctions, freeze status, proof validity and the
//!   suspicious-activity log
//! - [`ComplianceRegistry`]: the in-process manager
//! - [`policy`]: interpreter for per-transaction contract scripts
//! - [`TransactionScreener`]: the full check run before a transaction may be
//!   included in a block

pub mod error;
pub mod freeze;
pub mod manager;
pub mod oracle;
pub mod policy;
pub mod registry;
pub mod screening;

pub use error::PolicyViolation;
pub use freeze::FreezeStatus;
pub use manager::{ComplianceManager, SuspiciousActivityReport};
pub use oracle::{ProofOracle, StaticProofOracle};
pub use policy::{evaluate_script, Instruction, PolicyContext};
pub use registry::ComplianceRegistry;
pub use screening::TransactionScreener;
