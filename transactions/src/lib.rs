//! Payment transactions for both DualNet consensus networks.
//!
//! A [`Transaction`] moves an integer amount between two public keys. It may
//! additionally carry:
//! - a **privacy** flag with a zero-knowledge proof reference
//! - a **compliance proof** attesting the sender's KYC level
//! - a **contract** reference: a banking-policy script evaluated on inclusion
//! - an **escrow** condition
//! - structured **ISO 20022** payment metadata
//!
//! Identity is the content hash over every field except the signature.

pub mod builder;
pub mod error;
pub mod extensions;
pub mod metadata;
pub mod transaction;
pub mod validation;

pub use builder::TransactionBuilder;
pub use error::TransactionError;
pub use extensions::{ComplianceProof, ContractRef, EscrowCondition, PrivacyProof};
pub use metadata::PaymentMetadata;
pub use transaction::Transaction;
pub use validation::validate_transaction;
