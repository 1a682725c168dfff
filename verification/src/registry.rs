//! Claim registry: owns claims, their verifications and disputes, and
//! enforces the lifecycle state machine.
//!
//! Every mutating method validates completely before it touches state, so a
//! returned error always means nothing changed. Phase finalization is split
//! into a read-only `preview_*` that decides the outcome and a `commit_*`
//! that records it, which lets the engine move escrowed funds in between.

use crate::claim::{Claim, ClaimStatus, Resolution, Verification};
use crate::consensus::{dispute_majority, passes_threshold, Direction, Ratio};
use crate::dispute::{Dispute, DisputeResult, DisputeVote};
use crate::error::VerificationError;
use attest_types::{ClaimId, EngineParams, ParticipantId, Timestamp, MAX_WINDOW_SECS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What finalizing the verification phase would do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerificationDecision {
    /// The phase was finalized earlier; nothing more to do.
    AlreadyFinal(Resolution),
    /// The phase can be finalized with this resolution.
    Finalize { resolution: Resolution, score: Ratio },
}

impl VerificationDecision {
    pub fn resolution(&self) -> Resolution {
        match self {
            Self::AlreadyFinal(resolution) | Self::Finalize { resolution, .. } => *resolution,
        }
    }
}

/// What finalizing a dispute would do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisputeDecision {
    AlreadyFinal { result: DisputeResult, final_outcome: bool },
    Finalize { result: DisputeResult, final_outcome: bool },
}

impl DisputeDecision {
    pub fn result(&self) -> DisputeResult {
        match self {
            Self::AlreadyFinal { result, .. } | Self::Finalize { result, .. } => *result,
        }
    }

    pub fn final_outcome(&self) -> bool {
        match self {
            Self::AlreadyFinal { final_outcome, .. } | Self::Finalize { final_outcome, .. } => {
                *final_outcome
            }
        }
    }
}

/// Holds every claim and drives its state machine.
#[derive(Clone, Debug)]
pub struct ClaimRegistry {
    claims: BTreeMap<ClaimId, Claim>,
    next_id: ClaimId,
}

impl Default for ClaimRegistry {
    fn default() -> Self {
        Self {
            claims: BTreeMap::new(),
            next_id: ClaimId::new(1),
        }
    }
}

impl ClaimRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ClaimId) -> Result<&Claim, VerificationError> {
        self.claims.get(&id).ok_or(VerificationError::ClaimNotFound(id))
    }

    fn get_mut(&mut self, id: ClaimId) -> Result<&mut Claim, VerificationError> {
        self.claims
            .get_mut(&id)
            .ok_or(VerificationError::ClaimNotFound(id))
    }

    pub fn claims(&self) -> impl Iterator<Item = &Claim> {
        self.claims.values()
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// The id the next submitted claim will receive.
    pub fn next_id(&self) -> ClaimId {
        self.next_id
    }

    // ── Submission ───────────────────────────────────────────────────────

    /// Validate a submission made at `now` and return the verification
    /// window it will use.
    ///
    /// The window must be non-zero, at most [`MAX_WINDOW_SECS`], and its
    /// deadline must stay below the clock's maximum so it can pass.
    pub fn check_submission(
        &self,
        bond: u128,
        window_secs: Option<u64>,
        now: Timestamp,
        params: &EngineParams,
    ) -> Result<u64, VerificationError> {
        if bond < params.min_bond {
            return Err(VerificationError::InsufficientBond {
                needed: params.min_bond,
                provided: bond,
            });
        }
        let window = window_secs.unwrap_or(params.verification_window_secs);
        let ends_in_range = now
            .as_secs()
            .checked_add(window)
            .is_some_and(|deadline| deadline < u64::MAX);
        if window == 0 || window > MAX_WINDOW_SECS || !ends_in_range {
            return Err(VerificationError::InvalidWindow);
        }
        self.next_id.next().ok_or(VerificationError::IdsExhausted)?;
        Ok(window)
    }

    /// Register a new claim in PendingVerification.
    pub fn submit_claim(
        &mut self,
        proposer: ParticipantId,
        payload: String,
        bond: u128,
        window_secs: Option<u64>,
        now: Timestamp,
        params: &EngineParams,
    ) -> Result<ClaimId, VerificationError> {
        let window = self.check_submission(bond, window_secs, now, params)?;
        let id = self.next_id;
        self.next_id = id.next().ok_or(VerificationError::IdsExhausted)?;

        self.claims.insert(
            id,
            Claim {
                id,
                proposer,
                payload,
                bond,
                status: ClaimStatus::PendingVerification,
                created_at: now,
                verification_deadline: now.plus_secs(window),
                dispute_deadline: None,
                true_weight: 0,
                false_weight: 0,
                verifications: Vec::new(),
                verifier_index: BTreeMap::new(),
                resolution: None,
                dispute: None,
                settled: false,
            },
        );
        Ok(id)
    }

    // ── Verification ─────────────────────────────────────────────────────

    /// Check that `verifier` may verify `id` with `stake` right now.
    pub fn ensure_verifiable(
        &self,
        id: ClaimId,
        verifier: &ParticipantId,
        stake: u128,
        now: Timestamp,
        params: &EngineParams,
    ) -> Result<&Claim, VerificationError> {
        let claim = self.get(id)?;
        if claim.status != ClaimStatus::PendingVerification {
            return Err(VerificationError::ClaimNotOpen {
                claim: id,
                status: claim.status,
            });
        }
        if claim.verification_deadline.has_passed(now) {
            return Err(VerificationError::WindowClosed {
                claim: id,
                deadline: claim.verification_deadline,
            });
        }
        if &claim.proposer == verifier {
            return Err(VerificationError::SelfVerification(verifier.clone()));
        }
        if claim.has_verified(verifier) {
            return Err(VerificationError::DuplicateVerification(verifier.clone()));
        }
        if stake < params.min_verifier_stake {
            return Err(VerificationError::StakeBelowMinimum {
                needed: params.min_verifier_stake,
                provided: stake,
            });
        }
        Ok(claim)
    }

    /// Record a verification and add its weight to the asserted side.
    #[allow(clippy::too_many_arguments)]
    pub fn verify(
        &mut self,
        id: ClaimId,
        verifier: ParticipantId,
        asserted: bool,
        stake: u128,
        weight: u128,
        now: Timestamp,
        params: &EngineParams,
    ) -> Result<(), VerificationError> {
        self.ensure_verifiable(id, &verifier, stake, now, params)?;
        let claim = self.get_mut(id)?;
        claim.record_verification(Verification {
            verifier,
            asserted,
            stake,
            weight,
            recorded_at: now,
        });
        Ok(())
    }

    /// Decide how the verification phase of `id` ends, without changing anything.
    pub fn preview_verification(
        &self,
        id: ClaimId,
        now: Timestamp,
        params: &EngineParams,
    ) -> Result<VerificationDecision, VerificationError> {
        let claim = self.get(id)?;
        if let Some(resolution) = claim.resolution {
            return Ok(VerificationDecision::AlreadyFinal(resolution));
        }
        if !claim.verification_deadline.has_passed(now) {
            return Err(VerificationError::WindowNotYetOpen {
                claim: id,
                deadline: claim.verification_deadline,
            });
        }

        let score = claim.score();
        let count = claim.verifications.len();
        let resolution = if count > 0 && count < params.min_verifications as usize {
            Resolution::Expired
        } else {
            match passes_threshold(score, params.consensus_threshold_bps) {
                Direction::True => Resolution::True,
                Direction::False => Resolution::False,
                Direction::Inconclusive => Resolution::Canceled,
            }
        };
        Ok(VerificationDecision::Finalize { resolution, score })
    }

    /// Record the verification-phase resolution. Resolved claims open their
    /// dispute window; canceled and expired claims are settled on the spot.
    pub fn commit_verification(
        &mut self,
        id: ClaimId,
        resolution: Resolution,
        now: Timestamp,
        params: &EngineParams,
    ) -> Result<(), VerificationError> {
        let claim = self.get_mut(id)?;
        if claim.resolution.is_some() {
            return Ok(());
        }
        let next = resolution.status();
        debug_assert!(claim.status.can_transition_to(next));
        claim.status = next;
        claim.resolution = Some(resolution);
        if next.is_resolved() {
            claim.dispute_deadline = Some(now.plus_secs(params.dispute_window_secs));
        } else {
            claim.settled = true;
        }
        Ok(())
    }

    // ── Withdrawal ───────────────────────────────────────────────────────

    /// Check that `caller` may withdraw `id`.
    pub fn ensure_cancelable(
        &self,
        id: ClaimId,
        caller: &ParticipantId,
    ) -> Result<&Claim, VerificationError> {
        let claim = self.get(id)?;
        if &claim.proposer != caller {
            return Err(VerificationError::NotProposer(caller.clone()));
        }
        if claim.status != ClaimStatus::PendingVerification {
            return Err(VerificationError::ClaimNotOpen {
                claim: id,
                status: claim.status,
            });
        }
        if !claim.verifications.is_empty() {
            return Err(VerificationError::HasVerifications(id));
        }
        Ok(claim)
    }

    /// Withdraw a claim nobody has verified yet.
    pub fn cancel_claim(
        &mut self,
        id: ClaimId,
        caller: &ParticipantId,
    ) -> Result<(), VerificationError> {
        self.ensure_cancelable(id, caller)?;
        let claim = self.get_mut(id)?;
        claim.status = ClaimStatus::Canceled;
        claim.resolution = Some(Resolution::Canceled);
        claim.settled = true;
        Ok(())
    }

    // ── Disputes ─────────────────────────────────────────────────────────

    /// Check that `disputer` may challenge `id` with `stake` right now.
    pub fn ensure_disputable(
        &self,
        id: ClaimId,
        stake: u128,
        now: Timestamp,
        params: &EngineParams,
    ) -> Result<&Claim, VerificationError> {
        let claim = self.get(id)?;
        if claim.dispute.is_some() {
            return Err(VerificationError::AlreadyDisputed(id));
        }
        if !claim.status.is_resolved() || claim.settled {
            return Err(VerificationError::ClaimNotResolved {
                claim: id,
                status: claim.status,
            });
        }
        if let Some(deadline) = claim.dispute_deadline {
            if deadline.has_passed(now) {
                return Err(VerificationError::WindowClosed { claim: id, deadline });
            }
        }
        if stake < params.min_dispute_stake {
            return Err(VerificationError::StakeBelowMinimum {
                needed: params.min_dispute_stake,
                provided: stake,
            });
        }
        Ok(claim)
    }

    /// Open a dispute and move the claim to Disputed.
    pub fn raise_dispute(
        &mut self,
        id: ClaimId,
        disputer: ParticipantId,
        stake: u128,
        now: Timestamp,
        params: &EngineParams,
    ) -> Result<(), VerificationError> {
        self.ensure_disputable(id, stake, now, params)?;
        let claim = self.get_mut(id)?;
        debug_assert!(claim.status.can_transition_to(ClaimStatus::Disputed));
        claim.status = ClaimStatus::Disputed;
        claim.dispute = Some(Dispute::new(
            disputer,
            stake,
            now,
            now.plus_secs(params.dispute_vote_window_secs),
        ));
        Ok(())
    }

    /// Check that `voter` may vote on the dispute of `id` right now.
    pub fn ensure_dispute_vote(
        &self,
        id: ClaimId,
        voter: &ParticipantId,
        now: Timestamp,
    ) -> Result<&Dispute, VerificationError> {
        let claim = self.get(id)?;
        let dispute = match &claim.dispute {
            Some(dispute) if !dispute.resolved => dispute,
            _ => return Err(VerificationError::NoActiveDispute(id)),
        };
        if dispute.voting_deadline.has_passed(now) {
            return Err(VerificationError::WindowClosed {
                claim: id,
                deadline: dispute.voting_deadline,
            });
        }
        if &dispute.disputer == voter || &claim.proposer == voter {
            return Err(VerificationError::ConflictOfInterest(voter.clone()));
        }
        if dispute.has_voted(voter) {
            return Err(VerificationError::DuplicateDisputeVote(voter.clone()));
        }
        Ok(dispute)
    }

    /// Record a weighted dispute vote.
    pub fn cast_dispute_vote(
        &mut self,
        id: ClaimId,
        voter: ParticipantId,
        upholds_challenger: bool,
        weight: u128,
        now: Timestamp,
    ) -> Result<(), VerificationError> {
        self.ensure_dispute_vote(id, &voter, now)?;
        let dispute = self
            .get_mut(id)?
            .dispute
            .as_mut()
            .ok_or(VerificationError::NoActiveDispute(id))?;
        dispute.record_vote(DisputeVote {
            voter,
            upholds_challenger,
            weight,
            cast_at: now,
        });
        Ok(())
    }

    /// Decide how the dispute on `id` ends, without changing anything.
    pub fn preview_dispute(
        &self,
        id: ClaimId,
        now: Timestamp,
    ) -> Result<DisputeDecision, VerificationError> {
        let claim = self.get(id)?;
        let dispute = claim
            .dispute
            .as_ref()
            .ok_or(VerificationError::NoActiveDispute(id))?;
        if let (true, Some(result)) = (dispute.resolved, dispute.result) {
            let final_outcome = claim
                .status
                .outcome()
                .ok_or(VerificationError::NoActiveDispute(id))?;
            return Ok(DisputeDecision::AlreadyFinal {
                result,
                final_outcome,
            });
        }
        if !dispute.voting_deadline.has_passed(now) {
            return Err(VerificationError::WindowNotYetOpen {
                claim: id,
                deadline: dispute.voting_deadline,
            });
        }

        let original = claim
            .resolution
            .and_then(|r| r.outcome())
            .ok_or(VerificationError::NoActiveDispute(id))?;
        let result = dispute_majority(dispute.votes_for, dispute.votes_against);
        let final_outcome = if result.is_upheld() {
            !original
        } else {
            original
        };
        Ok(DisputeDecision::Finalize {
            result,
            final_outcome,
        })
    }

    /// Close the dispute, set the (possibly flipped) resolved status and mark
    /// the claim settled.
    pub fn commit_dispute(
        &mut self,
        id: ClaimId,
        result: DisputeResult,
        final_outcome: bool,
    ) -> Result<(), VerificationError> {
        let claim = self.get_mut(id)?;
        let next = ClaimStatus::resolved(final_outcome);
        let dispute = claim
            .dispute
            .as_mut()
            .ok_or(VerificationError::NoActiveDispute(id))?;
        if dispute.resolved {
            return Ok(());
        }
        dispute.resolved = true;
        dispute.outcome_upheld = result.is_upheld();
        dispute.result = Some(result);
        debug_assert!(claim.status.can_transition_to(next));
        claim.status = next;
        claim.settled = true;
        Ok(())
    }

    // ── Settlement of undisputed claims ──────────────────────────────────

    /// The final outcome of an undisputed resolved claim whose dispute window
    /// has passed.
    pub fn preview_settlement(&self, id: ClaimId, now: Timestamp) -> Result<bool, VerificationError> {
        let claim = self.get(id)?;
        if claim.settled {
            return Err(VerificationError::AlreadySettled(id));
        }
        if claim.status == ClaimStatus::Disputed {
            return Err(VerificationError::DisputeInProgress(id));
        }
        let outcome = claim
            .status
            .outcome()
            .ok_or(VerificationError::ClaimNotResolved {
                claim: id,
                status: claim.status,
            })?;
        if let Some(deadline) = claim.dispute_deadline {
            if !deadline.has_passed(now) {
                return Err(VerificationError::WindowNotYetOpen { claim: id, deadline });
            }
        }
        Ok(outcome)
    }

    pub fn commit_settlement(&mut self, id: ClaimId) -> Result<(), VerificationError> {
        self.get_mut(id)?.settled = true;
        Ok(())
    }

    // ── Persistence ──────────────────────────────────────────────────────

    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            claims: self.claims.values().cloned().collect(),
            next_id: self.next_id,
        }
    }

    pub fn restore(snapshot: RegistrySnapshot) -> Self {
        Self {
            claims: snapshot.claims.into_iter().map(|c| (c.id, c)).collect(),
            next_id: snapshot.next_id,
        }
    }
}

/// Persisted form of a [`ClaimRegistry`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub claims: Vec<Claim>,
    pub next_id: ClaimId,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(s: &str) -> ParticipantId {
        ParticipantId::new(s)
    }

    fn params() -> EngineParams {
        EngineParams {
            verification_window_secs: 100,
            dispute_window_secs: 50,
            dispute_vote_window_secs: 30,
            ..EngineParams::default()
        }
    }

    fn submitted(registry: &mut ClaimRegistry) -> ClaimId {
        registry
            .submit_claim(pid("alice"), "sky is blue".into(), 100, None, Timestamp::new(0), &params())
            .unwrap()
    }

    fn resolved_true(registry: &mut ClaimRegistry) -> ClaimId {
        let id = submitted(registry);
        registry
            .verify(id, pid("v1"), true, 10, 800, Timestamp::new(10), &params())
            .unwrap();
        let decision = registry.preview_verification(id, Timestamp::new(101), &params()).unwrap();
        registry
            .commit_verification(id, decision.resolution(), Timestamp::new(101), &params())
            .unwrap();
        id
    }

    #[test]
    fn ids_are_monotonic() {
        let mut registry = ClaimRegistry::new();
        assert_eq!(submitted(&mut registry), ClaimId::new(1));
        assert_eq!(submitted(&mut registry), ClaimId::new(2));
        assert_eq!(registry.next_id(), ClaimId::new(3));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn submission_checks_bond_and_window() {
        let mut registry = ClaimRegistry::new();
        let err = registry
            .submit_claim(pid("alice"), "x".into(), 99, None, Timestamp::new(0), &params())
            .unwrap_err();
        assert_eq!(err, VerificationError::InsufficientBond { needed: 100, provided: 99 });

        let err = registry
            .submit_claim(pid("alice"), "x".into(), 100, Some(0), Timestamp::new(0), &params())
            .unwrap_err();
        assert_eq!(err, VerificationError::InvalidWindow);
        assert!(registry.is_empty());

        for (window, now) in [(MAX_WINDOW_SECS + 1, 0), (u64::MAX, 0), (10, u64::MAX - 10)] {
            let err = registry
                .submit_claim(pid("alice"), "x".into(), 100, Some(window), Timestamp::new(now), &params())
                .unwrap_err();
            assert_eq!(err, VerificationError::InvalidWindow);
        }
        assert!(registry.is_empty());
        assert_eq!(registry.next_id(), ClaimId::new(1));

        let id = registry
            .submit_claim(pid("alice"), "x".into(), 100, Some(7), Timestamp::new(3), &params())
            .unwrap();
        assert_eq!(registry.get(id).unwrap().verification_deadline, Timestamp::new(10));
    }

    #[test]
    fn verify_accumulates_weight_per_side() {
        let mut registry = ClaimRegistry::new();
        let id = submitted(&mut registry);
        registry.verify(id, pid("v1"), true, 10, 800, Timestamp::new(1), &params()).unwrap();
        registry.verify(id, pid("v2"), false, 10, 200, Timestamp::new(2), &params()).unwrap();
        let claim = registry.get(id).unwrap();
        assert_eq!((claim.true_weight, claim.false_weight), (800, 200));
        assert_eq!(claim.total_weight(), 1_000);
        assert!(claim.has_verified(&pid("v2")));
        assert_eq!(claim.verification_by(&pid("v1")).map(|v| v.weight), Some(800));
        assert_eq!(claim.verification_by(&pid("v2")).map(|v| v.asserted), Some(false));
        assert_eq!(claim.verification_by(&pid("v3")), None);
    }

    #[test]
    fn verifier_index_survives_snapshot() {
        let mut registry = ClaimRegistry::new();
        let id = submitted(&mut registry);
        for (i, who) in ["v1", "v2", "v3"].into_iter().enumerate() {
            registry
                .verify(id, pid(who), i % 2 == 0, 10, 100, Timestamp::new(1), &params())
                .unwrap();
        }
        let restored = ClaimRegistry::restore(registry.snapshot());
        let claim = restored.get(id).unwrap();
        assert_eq!(claim.verifier_index.len(), 3);
        assert_eq!(claim.verification_by(&pid("v3")).map(|v| &v.verifier), Some(&pid("v3")));
        assert_eq!(
            restored.ensure_verifiable(id, &pid("v2"), 10, Timestamp::new(2), &params()).unwrap_err(),
            VerificationError::DuplicateVerification(pid("v2"))
        );
    }

    #[test]
    fn verify_rejections_leave_claim_untouched() {
        let mut registry = ClaimRegistry::new();
        let id = submitted(&mut registry);
        registry.verify(id, pid("v1"), true, 10, 800, Timestamp::new(1), &params()).unwrap();

        let cases = [
            (pid("v1"), 10, 1, VerificationError::DuplicateVerification(pid("v1"))),
            (pid("alice"), 10, 1, VerificationError::SelfVerification(pid("alice"))),
            (
                pid("v2"),
                9,
                1,
                VerificationError::StakeBelowMinimum { needed: 10, provided: 9 },
            ),
            (
                pid("v2"),
                10,
                101,
                VerificationError::WindowClosed { claim: id, deadline: Timestamp::new(100) },
            ),
        ];
        for (verifier, stake, at, expected) in cases {
            let err = registry
                .verify(id, verifier, false, stake, 500, Timestamp::new(at), &params())
                .unwrap_err();
            assert_eq!(err, expected);
        }
        let claim = registry.get(id).unwrap();
        assert_eq!((claim.true_weight, claim.false_weight), (800, 0));
        assert_eq!(claim.verifications.len(), 1);

        assert_eq!(
            registry
                .verify(ClaimId::new(9), pid("v2"), true, 10, 1, Timestamp::new(1), &params())
                .unwrap_err(),
            VerificationError::ClaimNotFound(ClaimId::new(9))
        );
    }

    #[test]
    fn verification_at_the_deadline_is_accepted() {
        let mut registry = ClaimRegistry::new();
        let id = submitted(&mut registry);
        registry
            .verify(id, pid("v1"), true, 10, 1, Timestamp::new(100), &params())
            .unwrap();
    }

    #[test]
    fn finalize_requires_deadline_to_pass() {
        let mut registry = ClaimRegistry::new();
        let id = submitted(&mut registry);
        assert_eq!(
            registry.preview_verification(id, Timestamp::new(100), &params()),
            Err(VerificationError::WindowNotYetOpen { claim: id, deadline: Timestamp::new(100) })
        );
    }

    #[test]
    fn zero_weight_cancels() {
        let mut registry = ClaimRegistry::new();
        let id = submitted(&mut registry);
        let decision = registry.preview_verification(id, Timestamp::new(101), &params()).unwrap();
        assert_eq!(decision.resolution(), Resolution::Canceled);
        registry
            .commit_verification(id, Resolution::Canceled, Timestamp::new(101), &params())
            .unwrap();
        let claim = registry.get(id).unwrap();
        assert_eq!(claim.status, ClaimStatus::Canceled);
        assert!(claim.settled);
        assert_eq!(claim.dispute_deadline, None);
    }

    #[test]
    fn too_few_verifications_expire() {
        let mut registry = ClaimRegistry::new();
        let params = EngineParams {
            min_verifications: 2,
            ..params()
        };
        let id = registry
            .submit_claim(pid("alice"), "x".into(), 100, None, Timestamp::new(0), &params)
            .unwrap();
        registry.verify(id, pid("v1"), true, 10, 800, Timestamp::new(1), &params).unwrap();
        let decision = registry.preview_verification(id, Timestamp::new(101), &params).unwrap();
        assert_eq!(decision.resolution(), Resolution::Expired);
    }

    #[test]
    fn finalize_is_idempotent() {
        let mut registry = ClaimRegistry::new();
        let id = resolved_true(&mut registry);
        let before = registry.get(id).unwrap().clone();
        let again = registry.preview_verification(id, Timestamp::new(500), &params()).unwrap();
        assert_eq!(again, VerificationDecision::AlreadyFinal(Resolution::True));
        registry
            .commit_verification(id, Resolution::False, Timestamp::new(500), &params())
            .unwrap();
        assert_eq!(registry.get(id).unwrap(), &before);
        assert_eq!(before.dispute_deadline, Some(Timestamp::new(151)));
    }

    #[test]
    fn dispute_lifecycle_flips_on_majority() {
        let mut registry = ClaimRegistry::new();
        let id = resolved_true(&mut registry);

        registry.raise_dispute(id, pid("d"), 50, Timestamp::new(120), &params()).unwrap();
        assert_eq!(registry.get(id).unwrap().status, ClaimStatus::Disputed);
        assert_eq!(
            registry.raise_dispute(id, pid("e"), 50, Timestamp::new(121), &params()),
            Err(VerificationError::AlreadyDisputed(id))
        );

        registry.cast_dispute_vote(id, pid("x"), true, 300, Timestamp::new(130)).unwrap();
        registry.cast_dispute_vote(id, pid("y"), false, 200, Timestamp::new(131)).unwrap();
        assert_eq!(
            registry.cast_dispute_vote(id, pid("x"), false, 300, Timestamp::new(132)),
            Err(VerificationError::DuplicateDisputeVote(pid("x")))
        );
        assert_eq!(
            registry.cast_dispute_vote(id, pid("d"), true, 300, Timestamp::new(132)),
            Err(VerificationError::ConflictOfInterest(pid("d")))
        );
        let dispute = registry.get(id).unwrap().dispute.as_ref().unwrap();
        assert_eq!(dispute.votes.len(), 2);
        assert_eq!(dispute.voters.len(), 2);
        assert!(dispute.has_voted(&pid("y")) && !dispute.has_voted(&pid("z")));

        assert!(matches!(
            registry.preview_dispute(id, Timestamp::new(150)),
            Err(VerificationError::WindowNotYetOpen { .. })
        ));
        let decision = registry.preview_dispute(id, Timestamp::new(151)).unwrap();
        assert_eq!(
            decision,
            DisputeDecision::Finalize { result: DisputeResult::Upheld, final_outcome: false }
        );
        registry.commit_dispute(id, decision.result(), decision.final_outcome()).unwrap();

        let claim = registry.get(id).unwrap();
        assert_eq!(claim.status, ClaimStatus::ResolvedFalse);
        assert!(claim.settled);
        let dispute = claim.dispute.as_ref().unwrap();
        assert!(dispute.resolved && dispute.outcome_upheld);

        assert_eq!(
            registry.preview_dispute(id, Timestamp::new(999)).unwrap(),
            DisputeDecision::AlreadyFinal { result: DisputeResult::Upheld, final_outcome: false }
        );
        assert!(matches!(
            registry.raise_dispute(id, pid("e"), 50, Timestamp::new(140), &params()),
            Err(VerificationError::AlreadyDisputed(_))
        ));
    }

    #[test]
    fn dispute_window_and_stake_are_enforced() {
        let mut registry = ClaimRegistry::new();
        let id = resolved_true(&mut registry);
        assert_eq!(
            registry.raise_dispute(id, pid("d"), 49, Timestamp::new(120), &params()),
            Err(VerificationError::StakeBelowMinimum { needed: 50, provided: 49 })
        );
        assert_eq!(
            registry.raise_dispute(id, pid("d"), 50, Timestamp::new(152), &params()),
            Err(VerificationError::WindowClosed { claim: id, deadline: Timestamp::new(151) })
        );

        let pending = submitted(&mut registry);
        assert!(matches!(
            registry.raise_dispute(pending, pid("d"), 50, Timestamp::new(1), &params()),
            Err(VerificationError::ClaimNotResolved { .. })
        ));
    }

    #[test]
    fn settlement_waits_for_dispute_window() {
        let mut registry = ClaimRegistry::new();
        let id = resolved_true(&mut registry);
        assert!(matches!(
            registry.preview_settlement(id, Timestamp::new(151)),
            Err(VerificationError::WindowNotYetOpen { .. })
        ));
        assert_eq!(registry.preview_settlement(id, Timestamp::new(152)), Ok(true));
        registry.commit_settlement(id).unwrap();
        assert_eq!(
            registry.preview_settlement(id, Timestamp::new(153)),
            Err(VerificationError::AlreadySettled(id))
        );
    }

    #[test]
    fn only_unverified_claims_can_be_withdrawn_by_proposer() {
        let mut registry = ClaimRegistry::new();
        let id = submitted(&mut registry);
        assert_eq!(
            registry.cancel_claim(id, &pid("mallory")),
            Err(VerificationError::NotProposer(pid("mallory")))
        );
        registry.cancel_claim(id, &pid("alice")).unwrap();
        assert_eq!(registry.get(id).unwrap().status, ClaimStatus::Canceled);

        let id = submitted(&mut registry);
        registry.verify(id, pid("v1"), true, 10, 1, Timestamp::new(1), &params()).unwrap();
        assert_eq!(
            registry.cancel_claim(id, &pid("alice")),
            Err(VerificationError::HasVerifications(id))
        );
    }
}
