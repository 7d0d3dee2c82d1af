//! Message transport between DualNet nodes.
//!
//! Peers are named in an explicit [`PeerRegistry`] that is handed to each
//! [`LocalTransport`]; there is no process-wide network table. Envelopes are
//! bincode-encoded on send and decoded by the receiving [`PeerInbox`].

pub mod dedup;
pub mod error;
pub mod message;
pub mod registry;
pub mod transport;

pub use dedup::MessageDedup;
pub use error::NetworkError;
pub use message::{NetworkMessage, Topic};
pub use registry::{PeerInbox, PeerRegistry};
pub use transport::{BroadcastResult, LocalTransport};
