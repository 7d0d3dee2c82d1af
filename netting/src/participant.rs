use dualnet_types::{Amount, ParticipantId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    /// Settled balance.
    pub balance: Amount,
    /// Funds held back from netting.
    pub reserved: Amount,
}

impl Participant {
    pub fn new(id: ParticipantId, balance: Amount, reserved: Amount) -> Self {
        Self {
            id,
            balance,
            reserved,
        }
    }

    /// `balance − reserved`, or `None` if more is reserved than held.
    pub fn available(&self) -> Option<Amount> {
        self.balance.checked_sub(self.reserved)
    }
}
