use serde::{Deserialize, Serialize};

/// Per-identity account restriction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FreezeStatus {
    #[default]
    Active,
    Frozen,
    SendOnly,
    ReceiveOnly,
}

impl FreezeStatus {
    pub fn can_send(&self) -> bool {
        matches!(self, Self::Active | Self::SendOnly)
    }

    pub fn can_receive(&self) -> bool {
        matches!(self, Self::Active | Self::ReceiveOnly)
    }
}
