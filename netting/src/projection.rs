//! Net position projection.

use std::collections::BTreeMap;

use dualnet_types::{Amount, ParticipantId};

use crate::{NettingError, Obligation};

/// Gross inflow and outflow for one participant. Kept as two unsigned sides
/// so no signed arithmetic touches money.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NetPosition {
    pub credit: Amount,
    pub debit: Amount,
}

impl NetPosition {
    /// How far `available + credit` falls short of `debit`, if at all.
    pub fn shortfall(&self, available: Amount) -> Option<Amount> {
        let inflow = available.checked_add(self.credit)?;
        self.debit.checked_sub(inflow).filter(|d| !d.is_zero())
    }

    /// Post-settlement balance from a starting balance.
    pub fn apply(&self, balance: Amount) -> Option<Amount> {
        balance.checked_add(self.credit)?.checked_sub(self.debit)
    }
}

/// Positions assuming every obligation in `obligations` settles.
pub fn multilateral_net<'a>(
    obligations: impl IntoIterator<Item = &'a Obligation>,
) -> Result<BTreeMap<ParticipantId, NetPosition>, NettingError> {
    let mut positions: BTreeMap<ParticipantId, NetPosition> = BTreeMap::new();
    for ob in obligations {
        let sender = positions.entry(ob.sender.clone()).or_default();
        sender.debit = sender
            .debit
            .checked_add(ob.amount)
            .ok_or(NettingError::Overflow)?;
        let receiver = positions.entry(ob.receiver.clone()).or_default();
        receiver.credit = receiver
            .credit
            .checked_add(ob.amount)
            .ok_or(NettingError::Overflow)?;
    }
    Ok(positions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ObligationId, Priority};

    fn ob(id: u64, from: &str, to: &str, amount: u128) -> Obligation {
        Obligation {
            id: ObligationId::new(id),
            sender: from.into(),
            receiver: to.into(),
            amount: Amount::new(amount),
            priority: Priority::Normal,
        }
    }

    #[test]
    fn cycle_nets_to_zero() {
        let obs = [ob(1, "A", "B", 100), ob(2, "B", "C", 100), ob(3, "C", "A", 100)];
        let pos = multilateral_net(&obs).unwrap();
        for p in pos.values() {
            assert_eq!(p.credit, p.debit);
            assert_eq!(p.shortfall(Amount::ZERO), None);
        }
    }

    #[test]
    fn shortfall_computed() {
        let pos = multilateral_net(&[ob(1, "A", "B", 100)]).unwrap();
        let a = pos[&ParticipantId::from("A")];
        assert_eq!(a.shortfall(Amount::new(30)), Some(Amount::new(70)));
        assert_eq!(a.shortfall(Amount::new(100)), None);
        assert_eq!(a.apply(Amount::new(100)), Some(Amount::ZERO));
    }

    #[test]
    fn overflow_detected() {
        let obs = [ob(1, "A", "B", u128::MAX), ob(2, "C", "B", 1)];
        assert_eq!(multilateral_net(&obs), Err(NettingError::Overflow));
    }
}
