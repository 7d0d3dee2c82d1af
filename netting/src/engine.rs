//! The netting engine: participant balances plus the obligation queue.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use dualnet_types::{Amount, ParticipantId};
use tracing::{info, warn};

use crate::projection::multilateral_net;
use crate::{NettingConfig, NettingError, Obligation, ObligationId, Participant, Priority};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BalanceChange {
    pub participant: ParticipantId,
    pub before: Amount,
    pub after: Amount,
}

/// Outcome of a successful resolution run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Cleared obligations, highest priority first.
    pub cleared: Vec<ObligationId>,
    /// Obligations left queued to restore solvency, in removal order.
    pub deferred: Vec<ObligationId>,
    pub changes: Vec<BalanceChange>,
}

#[derive(Default)]
struct NettingState {
    participants: BTreeMap<ParticipantId, Participant>,
    queue: BTreeMap<ObligationId, Obligation>,
    next_id: u64,
}

pub struct NettingEngine {
    config: NettingConfig,
    state: Mutex<NettingState>,
}

impl Default for NettingEngine {
    fn default() -> Self {
        Self::new(NettingConfig::default())
    }
}

impl NettingEngine {
    pub fn new(config: NettingConfig) -> Self {
        Self {
            config,
            state: Mutex::new(NettingState::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, NettingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_participant(
        &self,
        id: ParticipantId,
        balance: Amount,
        reserved: Amount,
    ) -> Result<(), NettingError> {
        let mut state = self.lock();
        if state.participants.contains_key(&id) {
            return Err(NettingError::DuplicateParticipant(id.to_string()));
        }
        state
            .participants
            .insert(id.clone(), Participant::new(id, balance, reserved));
        Ok(())
    }

    pub fn participant(&self, id: &ParticipantId) -> Option<Participant> {
        self.lock().participants.get(id).cloned()
    }

    pub fn balance(&self, id: &ParticipantId) -> Option<Amount> {
        self.lock().participants.get(id).map(|p| p.balance)
    }

    pub fn set_reserved(&self, id: &ParticipantId, reserved: Amount) -> Result<(), NettingError> {
        let mut state = self.lock();
        let participant = state
            .participants
            .get_mut(id)
            .ok_or_else(|| NettingError::UnknownParticipant(id.to_string()))?;
        participant.reserved = reserved;
        Ok(())
    }

    pub fn enqueue(
        &self,
        sender: ParticipantId,
        receiver: ParticipantId,
        amount: Amount,
        priority: Priority,
    ) -> Result<ObligationId, NettingError> {
        if amount.is_zero() {
            return Err(NettingError::InvalidObligation("amount must be positive".into()));
        }
        if sender == receiver {
            return Err(NettingError::InvalidObligation(format!(
                "{sender} cannot owe itself"
            )));
        }
        let mut state = self.lock();
        for party in [&sender, &receiver] {
            if !state.participants.contains_key(party) {
                return Err(NettingError::UnknownParticipant(party.to_string()));
            }
        }
        let id = ObligationId::new(state.next_id);
        state.next_id += 1;
        state.queue.insert(
            id,
            Obligation {
                id,
                sender,
                receiver,
                amount,
                priority,
            },
        );
        Ok(id)
    }

    pub fn cancel(&self, id: ObligationId) -> Result<Obligation, NettingError> {
        self.lock()
            .queue
            .remove(&id)
            .ok_or(NettingError::UnknownObligation(id))
    }

    /// Queued obligations in id order.
    pub fn queued(&self) -> Vec<Obligation> {
        self.lock().queue.values().cloned().collect()
    }

    pub fn queue_len(&self) -> usize {
        self.lock().queue.len()
    }

    /// Run one resolution. On error nothing is applied.
    pub fn resolve(&self) -> Result<Resolution, NettingError> {
        let mut state = self.lock();

        for p in state.participants.values() {
            if p.available().is_none() {
                warn!(participant = %p.id, "reserved funds exceed balance");
                return Err(NettingError::Inconsistency {
                    participant: p.id.to_string(),
                    reason: format!("reserved {} exceeds balance {}", p.reserved, p.balance),
                });
            }
        }

        let mut active: Vec<&Obligation> = state.queue.values().collect();
        active.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.id.cmp(&b.id)));
        let mut deferred = Vec::new();

        let positions = loop {
            let positions = multilateral_net(active.iter().copied())?;

            // Largest shortfall first, ties to the lowest id (BTreeMap order).
            let mut worst: Option<(&ParticipantId, Amount)> = None;
            for (id, position) in &positions {
                let available = state
                    .participants
                    .get(id)
                    .and_then(Participant::available)
                    .unwrap_or(Amount::ZERO);
                if let Some(short) = position.shortfall(available) {
                    if worst.map_or(true, |(_, w)| short > w) {
                        worst = Some((id, short));
                    }
                }
            }
            let Some((insolvent, shortfall)) = worst else {
                break positions;
            };

            let candidate = active
                .iter()
                .enumerate()
                .filter(|(_, ob)| &ob.sender == insolvent)
                .filter(|(_, ob)| self.config.defer_critical || ob.priority != Priority::Critical)
                .min_by(|(_, a), (_, b)| a.priority.cmp(&b.priority).then(b.id.cmp(&a.id)))
                .map(|(i, _)| i);

            match candidate {
                Some(index) => {
                    let removed = active.remove(index);
                    info!(obligation = %removed.id, participant = %insolvent, shortfall = %shortfall, "obligation deferred");
                    deferred.push(removed.id);
                }
                None => {
                    warn!(participant = %insolvent, shortfall = %shortfall, "insolvent with nothing deferrable");
                    return Err(NettingError::Inconsistency {
                        participant: insolvent.to_string(),
                        reason: format!("short {shortfall} with no deferrable obligation"),
                    });
                }
            }
        };

        // Compute every new balance before touching state.
        let mut changes = Vec::with_capacity(positions.len());
        for (id, position) in &positions {
            let participant = state
                .participants
                .get(id)
                .ok_or_else(|| NettingError::UnknownParticipant(id.to_string()))?;
            let after = position
                .apply(participant.balance)
                .ok_or(NettingError::Overflow)?;
            changes.push(BalanceChange {
                participant: id.clone(),
                before: participant.balance,
                after,
            });
        }
        let cleared: Vec<ObligationId> = active.iter().map(|ob| ob.id).collect();

        for change in &changes {
            if let Some(p) = state.participants.get_mut(&change.participant) {
                p.balance = change.after;
            }
        }
        for id in &cleared {
            state.queue.remove(id);
        }

        info!(
            cleared = cleared.len(),
            deferred = deferred.len(),
            remaining = state.queue.len(),
            "netting run committed"
        );
        Ok(Resolution {
            cleared,
            deferred,
            changes,
        })
    }
}
