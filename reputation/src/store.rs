//! The reputation store: owns every participant record.

use crate::record::{ParticipantRecord, ReputationChange};
use attest_types::{EngineParams, ParticipantId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Bounds and decay configuration of a [`ReputationStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecayPolicy {
    pub min: i64,
    pub max: i64,
    pub initial: i64,
    /// Points removed per whole period. Non-positive values disable decay.
    pub points_per_period: i64,
    pub period_secs: u64,
}

impl DecayPolicy {
    pub fn from_params(params: &EngineParams) -> Self {
        Self {
            min: params.min_reputation,
            max: params.max_reputation,
            initial: params.initial_reputation,
            points_per_period: params.reputation_decay_points,
            period_secs: params.reputation_decay_period_secs,
        }
    }

    fn clamp(&self, score: i128) -> i64 {
        score.clamp(self.min as i128, self.max as i128) as i64
    }

    /// Score after decaying `record` up to `now`, and the new decay origin.
    ///
    /// Only whole periods are consumed; the remainder carries over to the next
    /// call so that frequent reads decay exactly as fast as rare ones.
    fn decayed(&self, record: &ParticipantRecord, now: Timestamp) -> (i64, Timestamp) {
        if self.points_per_period <= 0 || self.period_secs == 0 {
            return (record.reputation, record.last_decay);
        }
        let periods = record.last_decay.elapsed_since(now) / self.period_secs;
        if periods == 0 {
            return (record.reputation, record.last_decay);
        }
        let decay = periods as i128 * self.points_per_period as i128;
        let score = self.clamp(record.reputation as i128 - decay);
        let origin = record
            .last_decay
            .plus_secs(periods.saturating_mul(self.period_secs));
        (score, origin)
    }
}

/// Tracks a bounded, decaying reputation score per participant.
///
/// All operations succeed; participants are created on first touch.
#[derive(Clone, Debug)]
pub struct ReputationStore {
    policy: DecayPolicy,
    records: HashMap<ParticipantId, ParticipantRecord>,
}

impl ReputationStore {
    pub fn new(policy: DecayPolicy) -> Self {
        Self {
            policy,
            records: HashMap::new(),
        }
    }

    pub fn from_params(params: &EngineParams) -> Self {
        Self::new(DecayPolicy::from_params(params))
    }

    pub fn policy(&self) -> &DecayPolicy {
        &self.policy
    }

    fn record_mut(&mut self, participant: &ParticipantId, now: Timestamp) -> &mut ParticipantRecord {
        let initial = self.policy.initial;
        self.records
            .entry(participant.clone())
            .or_insert_with(|| ParticipantRecord::new(participant.clone(), initial, now))
    }

    /// Apply pending decay to a participant's score.
    pub fn apply_decay(&mut self, participant: &ParticipantId, now: Timestamp) -> i64 {
        let policy = self.policy;
        let record = self.record_mut(participant, now);
        let (score, origin) = policy.decayed(record, now);
        if score != record.reputation {
            tracing::trace!(
                participant = %participant,
                from = record.reputation,
                to = score,
                "reputation decayed"
            );
        }
        record.reputation = score;
        record.last_decay = origin;
        score
    }

    /// Current score, with pending decay applied and persisted.
    pub fn get(&mut self, participant: &ParticipantId, now: Timestamp) -> i64 {
        self.apply_decay(participant, now)
    }

    /// Current score without mutating the store.
    pub fn peek(&self, participant: &ParticipantId, now: Timestamp) -> i64 {
        match self.records.get(participant) {
            Some(record) => self.policy.decayed(record, now).0,
            None => self.policy.initial,
        }
    }

    /// Vote weight of a participant: its score, but never below one.
    pub fn weight(&mut self, participant: &ParticipantId, now: Timestamp) -> u128 {
        self.get(participant, now).max(1) as u128
    }

    /// [`Self::weight`] without persisting the pending decay.
    pub fn peek_weight(&self, participant: &ParticipantId, now: Timestamp) -> u128 {
        self.peek(participant, now).max(1) as u128
    }

    /// Add `delta` (after pending decay), clamp to the bounds and restart the
    /// decay timer.
    pub fn adjust(
        &mut self,
        participant: &ParticipantId,
        delta: i64,
        now: Timestamp,
    ) -> ReputationChange {
        let before = self.apply_decay(participant, now);
        let after = self.policy.clamp(before as i128 + delta as i128);
        let record = self.record_mut(participant, now);
        record.reputation = after;
        record.last_decay = now;
        tracing::debug!(participant = %participant, before, after, "reputation adjusted");
        ReputationChange {
            participant: participant.clone(),
            before,
            after,
        }
    }

    /// Overwrite a participant's score (clamped), restarting the decay timer.
    pub fn set(&mut self, participant: &ParticipantId, score: i64, now: Timestamp) -> ReputationChange {
        let before = self.apply_decay(participant, now);
        let after = self.policy.clamp(score as i128);
        let record = self.record_mut(participant, now);
        record.reputation = after;
        record.last_decay = now;
        ReputationChange {
            participant: participant.clone(),
            before,
            after,
        }
    }

    /// Stored record, without pending decay.
    pub fn record(&self, participant: &ParticipantId) -> Option<&ParticipantRecord> {
        self.records.get(participant)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Serializable copy of every record.
    pub fn snapshot(&self) -> ReputationSnapshot {
        let mut records: Vec<ParticipantRecord> = self.records.values().cloned().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        ReputationSnapshot {
            policy: self.policy,
            records,
        }
    }

    /// Rebuild a store from a snapshot.
    pub fn restore(snapshot: ReputationSnapshot) -> Self {
        Self {
            policy: snapshot.policy,
            records: snapshot
                .records
                .into_iter()
                .map(|r| (r.id.clone(), r))
                .collect(),
        }
    }
}

/// Persisted form of a [`ReputationStore`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationSnapshot {
    pub policy: DecayPolicy,
    pub records: Vec<ParticipantRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: u64 = 86_400;

    fn policy() -> DecayPolicy {
        DecayPolicy {
            min: 0,
            max: 1_000,
            initial: 100,
            points_per_period: 5,
            period_secs: DAY,
        }
    }

    fn alice() -> ParticipantId {
        ParticipantId::new("alice")
    }

    #[test]
    fn unknown_participant_starts_at_initial() {
        let mut store = ReputationStore::new(policy());
        assert_eq!(store.peek(&alice(), Timestamp::new(0)), 100);
        assert!(store.is_empty());
        assert_eq!(store.get(&alice(), Timestamp::new(0)), 100);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn decay_counts_whole_periods_only() {
        let mut store = ReputationStore::new(policy());
        store.get(&alice(), Timestamp::new(0));

        assert_eq!(store.get(&alice(), Timestamp::new(DAY - 1)), 100);
        assert_eq!(store.get(&alice(), Timestamp::new(DAY)), 95);
        // Half a day later nothing more is due, but the half day is kept.
        assert_eq!(store.get(&alice(), Timestamp::new(DAY + DAY / 2)), 95);
        assert_eq!(store.get(&alice(), Timestamp::new(2 * DAY)), 90);
    }

    #[test]
    fn decay_floors_at_minimum() {
        let mut store = ReputationStore::new(policy());
        store.get(&alice(), Timestamp::new(0));
        assert_eq!(store.get(&alice(), Timestamp::new(u64::MAX)), 0);
    }

    #[test]
    fn peek_matches_get_without_mutating() {
        let mut store = ReputationStore::new(policy());
        store.get(&alice(), Timestamp::new(0));
        let now = Timestamp::new(3 * DAY);
        assert_eq!(store.peek(&alice(), now), 85);
        assert_eq!(store.record(&alice()).unwrap().reputation, 100);
        assert_eq!(store.get(&alice(), now), 85);
    }

    #[test]
    fn adjust_clamps_and_resets_timer() {
        let mut store = ReputationStore::new(policy());
        store.get(&alice(), Timestamp::new(0));

        let change = store.adjust(&alice(), 5_000, Timestamp::new(DAY + 10));
        assert_eq!(change.before, 95);
        assert_eq!(change.after, 1_000);
        assert_eq!(change.applied_delta(), 905);
        assert_eq!(store.record(&alice()).unwrap().last_decay, Timestamp::new(DAY + 10));

        let change = store.adjust(&alice(), -5_000, Timestamp::new(DAY + 10));
        assert_eq!(change.after, 0);
    }

    #[test]
    fn weight_is_at_least_one() {
        let mut store = ReputationStore::new(policy());
        store.set(&alice(), 0, Timestamp::new(0));
        assert_eq!(store.weight(&alice(), Timestamp::new(0)), 1);
        store.set(&alice(), 800, Timestamp::new(0));
        assert_eq!(store.weight(&alice(), Timestamp::new(0)), 800);
    }

    #[test]
    fn disabled_decay_keeps_score() {
        let mut store = ReputationStore::new(DecayPolicy {
            points_per_period: 0,
            ..policy()
        });
        store.set(&alice(), 700, Timestamp::new(0));
        assert_eq!(store.get(&alice(), Timestamp::new(100 * DAY)), 700);
    }

    #[test]
    fn snapshot_restores_records() {
        let mut store = ReputationStore::new(policy());
        store.set(&alice(), 640, Timestamp::new(5));
        store.get(&ParticipantId::new("bob"), Timestamp::new(5));

        let restored = ReputationStore::restore(store.snapshot());
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.peek(&alice(), Timestamp::new(5)), 640);
        assert_eq!(restored.policy(), store.policy());
    }
}
