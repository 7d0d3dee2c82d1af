use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("peer {0} not found")]
    PeerNotFound(String),

    #[error("peer {0} already registered")]
    DuplicatePeer(String),

    #[error("peer {0} inbox closed or full")]
    Unreachable(String),

    #[error("codec error: {0}")]
    Codec(String),
}

impl From<bincode::Error> for NetworkError {
    fn from(e: bincode::Error) -> Self {
        Self::Codec(e.to_string())
    }
}
