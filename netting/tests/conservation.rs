use dualnet_netting::{NettingConfig, NettingEngine, NettingError, Priority};
use dualnet_types::{Amount, ParticipantId};
use proptest::prelude::*;

const NAMES: [&str; 5] = ["alpha", "bravo", "charlie", "delta", "echo"];

fn priority(n: u8) -> Priority {
    match n % 3 {
        0 => Priority::Normal,
        1 => Priority::Urgent,
        _ => Priority::Critical,
    }
}

proptest! {
    #[test]
    fn resolution_conserves_money(
        balances in prop::collection::vec(0u128..500, 5),
        obligations in prop::collection::vec((0usize..5, 0usize..5, 1u128..300, any::<u8>()), 0..25),
        defer_critical in any::<bool>(),
    ) {
        let engine = NettingEngine::new(NettingConfig { defer_critical });
        for (name, balance) in NAMES.iter().zip(&balances) {
            engine.add_participant(ParticipantId::from(*name), Amount::new(*balance), Amount::ZERO).unwrap();
        }
        for (from, to, amount, p) in &obligations {
            if from != to {
                engine
                    .enqueue(NAMES[*from].into(), NAMES[*to].into(), Amount::new(*amount), priority(*p))
                    .unwrap();
            }
        }
        let queued_before = engine.queue_len();
        let total_before: u128 = balances.iter().sum();

        match engine.resolve() {
            Ok(resolution) => {
                let total_after: u128 = NAMES
                    .iter()
                    .map(|n| engine.balance(&(*n).into()).unwrap().raw())
                    .sum();
                prop_assert_eq!(total_before, total_after);
                let before: u128 = resolution.changes.iter().map(|c| c.before.raw()).sum();
                let after: u128 = resolution.changes.iter().map(|c| c.after.raw()).sum();
                prop_assert_eq!(before, after);
                prop_assert_eq!(resolution.cleared.len() + resolution.deferred.len(), queued_before);
                prop_assert_eq!(engine.queue_len(), resolution.deferred.len());
            }
            Err(NettingError::Inconsistency { .. }) => {
                prop_assert!(!defer_critical);
                prop_assert_eq!(engine.queue_len(), queued_before);
                for (name, balance) in NAMES.iter().zip(&balances) {
                    prop_assert_eq!(engine.balance(&(*name).into()), Some(Amount::new(*balance)));
                }
            }
            Err(other) => prop_assert!(false, "unexpected error {other}"),
        }
    }
}
