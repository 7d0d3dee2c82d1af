//! Wire envelope.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::NetworkError;

/// What an envelope's payload decodes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    Transaction,
    Block,
    MicroBlock,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkMessage {
    pub from: String,
    pub topic: Topic,
    pub payload: Vec<u8>,
}

impl NetworkMessage {
    /// Encode `body` as the payload of a new envelope.
    pub fn wrap<T: Serialize>(from: impl Into<String>, topic: Topic, body: &T) -> Result<Self, NetworkError> {
        Ok(Self {
            from: from.into(),
            topic,
            payload: bincode::serialize(body)?,
        })
    }

    pub fn open<T: DeserializeOwned>(&self) -> Result<T, NetworkError> {
        Ok(bincode::deserialize(&self.payload)?)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, NetworkError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, NetworkError> {
        Ok(bincode::deserialize(bytes)?)
    }
}
