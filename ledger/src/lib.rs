//! Ledger structures for both DualNet networks.
//!
//! The single-chain network links [`Block`]s by one parent into a
//! [`ChainState`]; the sharded network links [`MicroBlock`]s by DAG parents
//! into one [`ShardDag`] per shard. Both draw transactions from a
//! fixed-capacity [`Mempool`] and are checked by the same
//! [`BlockValidator`].

pub mod assembly;
pub mod block;
pub mod chain;
pub mod dag;
pub mod error;
pub mod mempool;
pub mod microblock;
pub mod validation;

pub use assembly::assemble;
pub use block::{compute_merkle_root, Block, SealedBlock};
pub use chain::ChainState;
pub use dag::ShardDag;
pub use error::{BlockRejection, LedgerError, MempoolError};
pub use mempool::Mempool;
pub use microblock::MicroBlock;
pub use validation::BlockValidator;
