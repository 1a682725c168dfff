//! Claim engine: ties the registry, reputation store, stake ledger, clock
//! and event sink into one transactional workflow.
//!
//! Every operation follows the same shape: validate against the registry
//! without mutating, move funds with a single escrow or one atomic
//! [`Ledger::apply`] batch, then commit the registry and reputation changes
//! and publish events. A ledger failure therefore leaves the registry and
//! reputation exactly as they were.

use crate::claim::{Claim, Resolution};
use crate::dispute::DisputeResult;
use crate::error::{SnapshotError, VerificationError};
use crate::events::{ClaimEvent, EventSink};
use crate::outcomes::{compute_refund, compute_settlement, Settlement, SettlementPolicy};
use crate::registry::{ClaimRegistry, DisputeDecision, RegistrySnapshot, VerificationDecision};
use attest_reputation::{ReputationSnapshot, ReputationStore};
use attest_stake::{Ledger, StakeTag};
use attest_types::{ClaimId, Clock, EngineParams, ParamsError, ParticipantId, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// How a finalized dispute ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisputeOutcome {
    pub result: DisputeResult,
    /// The claim's final truth value.
    pub outcome: bool,
}

/// The stake-weighted claim verification engine.
pub struct ClaimEngine<L, C, S> {
    params: EngineParams,
    policy: SettlementPolicy,
    registry: ClaimRegistry,
    reputation: ReputationStore,
    ledger: L,
    clock: C,
    sink: S,
}

impl<L: Ledger, C: Clock, S: EventSink> ClaimEngine<L, C, S> {
    /// Build an engine with no claims. Fails if `params` are inconsistent.
    pub fn new(params: EngineParams, ledger: L, clock: C, sink: S) -> Result<Self, ParamsError> {
        params.validate()?;
        Ok(Self {
            policy: SettlementPolicy::from_params(&params),
            registry: ClaimRegistry::new(),
            reputation: ReputationStore::from_params(&params),
            params,
            ledger,
            clock,
            sink,
        })
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    pub fn registry(&self) -> &ClaimRegistry {
        &self.registry
    }

    pub fn reputation_store(&self) -> &ReputationStore {
        &self.reputation
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Direct ledger access for hosts that fund accounts.
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn claim(&self, id: ClaimId) -> Result<&Claim, VerificationError> {
        self.registry.get(id)
    }

    /// Current reputation of `participant`, with pending decay applied.
    pub fn reputation(&mut self, participant: &ParticipantId) -> i64 {
        let now = self.clock.now();
        self.reputation.get(participant, now)
    }

    /// Seed a participant's reputation (clamped to the configured bounds).
    pub fn seed_reputation(&mut self, participant: &ParticipantId, score: i64) -> i64 {
        let now = self.clock.now();
        self.reputation.set(participant, score, now).after
    }

    // ── Submission ───────────────────────────────────────────────────────

    /// Escrow `bond` from `proposer` and open a claim for verification.
    ///
    /// `window_secs` overrides the default verification window.
    pub fn submit_claim(
        &mut self,
        proposer: &ParticipantId,
        payload: impl Into<String>,
        bond: u128,
        window_secs: Option<u64>,
    ) -> Result<ClaimId, VerificationError> {
        let now = self.clock.now();
        let result = self.try_submit(proposer, payload.into(), bond, window_secs, now);
        rejected("submit_claim", result)
    }

    fn try_submit(
        &mut self,
        proposer: &ParticipantId,
        payload: String,
        bond: u128,
        window_secs: Option<u64>,
        now: Timestamp,
    ) -> Result<ClaimId, VerificationError> {
        self.registry.check_submission(bond, window_secs, now, &self.params)?;
        let id = self.registry.next_id();
        let tag = StakeTag::bond(id, proposer);
        self.ledger.escrow(proposer, bond, tag.clone())?;

        let submitted = self.registry.submit_claim(
            proposer.clone(),
            payload,
            bond,
            window_secs,
            now,
            &self.params,
        );
        if let Err(e) = submitted {
            self.ledger.release(&tag, proposer)?;
            return Err(e);
        }

        let claim = self.registry.get(id)?;
        info!(claim = %id, proposer = %proposer, bond, deadline = %claim.verification_deadline, "claim submitted");
        let event = ClaimEvent::ClaimSubmitted {
            claim: id,
            proposer: proposer.clone(),
            bond,
            verification_deadline: claim.verification_deadline,
        };
        self.sink.publish(event);
        Ok(id)
    }

    // ── Verification ─────────────────────────────────────────────────────

    /// Stake on the truth value of a claim. The vote is weighted by the
    /// verifier's reputation at this moment.
    pub fn verify(
        &mut self,
        id: ClaimId,
        verifier: &ParticipantId,
        asserted: bool,
        stake: u128,
    ) -> Result<(), VerificationError> {
        let now = self.clock.now();
        let result = self.try_verify(id, verifier, asserted, stake, now);
        rejected("verify", result)
    }

    fn try_verify(
        &mut self,
        id: ClaimId,
        verifier: &ParticipantId,
        asserted: bool,
        stake: u128,
        now: Timestamp,
    ) -> Result<(), VerificationError> {
        self.registry
            .ensure_verifiable(id, verifier, stake, now, &self.params)?;
        let weight = self.reputation.peek_weight(verifier, now);
        let tag = StakeTag::verification(id, verifier);
        if stake > 0 {
            self.ledger.escrow(verifier, stake, tag.clone())?;
        }

        let recorded = self.registry.verify(
            id,
            verifier.clone(),
            asserted,
            stake,
            weight,
            now,
            &self.params,
        );
        if let Err(e) = recorded {
            if stake > 0 {
                self.ledger.release(&tag, verifier)?;
            }
            return Err(e);
        }

        info!(claim = %id, verifier = %verifier, asserted, stake, weight, "verification recorded");
        self.sink.publish(ClaimEvent::VerificationRecorded {
            claim: id,
            verifier: verifier.clone(),
            asserted,
            stake,
            weight,
        });
        Ok(())
    }

    /// Close the verification phase once its deadline has passed.
    ///
    /// Canceled and expired claims are refunded immediately. Calling this
    /// again returns the stored resolution without side effects.
    pub fn finalize_verification(&mut self, id: ClaimId) -> Result<Resolution, VerificationError> {
        let now = self.clock.now();
        let result = self.try_finalize_verification(id, now);
        rejected("finalize_verification", result)
    }

    fn try_finalize_verification(
        &mut self,
        id: ClaimId,
        now: Timestamp,
    ) -> Result<Resolution, VerificationError> {
        let (resolution, score) = match self.registry.preview_verification(id, now, &self.params)? {
            VerificationDecision::AlreadyFinal(resolution) => return Ok(resolution),
            VerificationDecision::Finalize { resolution, score } => (resolution, score),
        };

        let refund = match resolution {
            Resolution::Canceled | Resolution::Expired => {
                let refund = compute_refund(self.registry.get(id)?);
                self.ledger.apply(&refund.ops)?;
                Some(refund)
            }
            Resolution::True | Resolution::False => None,
        };

        self.registry
            .commit_verification(id, resolution, now, &self.params)?;
        let dispute_deadline = self.registry.get(id)?.dispute_deadline;
        info!(claim = %id, ?resolution, score_bps = score.as_bps(), "verification finalized");
        self.sink.publish(ClaimEvent::ClaimResolved {
            claim: id,
            resolution,
            score_bps: score.as_bps(),
            dispute_deadline,
        });
        if let Some(refund) = refund {
            self.publish_settlement(&refund, now);
        }
        Ok(resolution)
    }

    /// Withdraw a claim that has no verifications yet, refunding the bond.
    pub fn cancel_claim(&mut self, id: ClaimId, caller: &ParticipantId) -> Result<(), VerificationError> {
        let now = self.clock.now();
        let result = self.try_cancel(id, caller, now);
        rejected("cancel_claim", result)
    }

    fn try_cancel(&mut self, id: ClaimId, caller: &ParticipantId, now: Timestamp) -> Result<(), VerificationError> {
        let refund = compute_refund(self.registry.ensure_cancelable(id, caller)?);
        self.ledger.apply(&refund.ops)?;
        self.registry.cancel_claim(id, caller)?;

        info!(claim = %id, proposer = %caller, "claim withdrawn");
        self.sink.publish(ClaimEvent::ClaimResolved {
            claim: id,
            resolution: Resolution::Canceled,
            score_bps: crate::consensus::Ratio::HALF.as_bps(),
            dispute_deadline: None,
        });
        self.publish_settlement(&refund, now);
        Ok(())
    }

    // ── Disputes ─────────────────────────────────────────────────────────

    /// Challenge a resolved claim during its dispute window.
    pub fn raise_dispute(
        &mut self,
        id: ClaimId,
        disputer: &ParticipantId,
        stake: u128,
    ) -> Result<(), VerificationError> {
        let now = self.clock.now();
        let result = self.try_raise_dispute(id, disputer, stake, now);
        rejected("raise_dispute", result)
    }

    fn try_raise_dispute(
        &mut self,
        id: ClaimId,
        disputer: &ParticipantId,
        stake: u128,
        now: Timestamp,
    ) -> Result<(), VerificationError> {
        self.registry
            .ensure_disputable(id, stake, now, &self.params)?;
        let tag = StakeTag::dispute(id, disputer);
        if stake > 0 {
            self.ledger.escrow(disputer, stake, tag.clone())?;
        }

        let raised = self
            .registry
            .raise_dispute(id, disputer.clone(), stake, now, &self.params);
        if let Err(e) = raised {
            if stake > 0 {
                self.ledger.release(&tag, disputer)?;
            }
            return Err(e);
        }

        let voting_deadline = self
            .registry
            .get(id)?
            .dispute
            .as_ref()
            .map(|d| d.voting_deadline)
            .ok_or(VerificationError::NoActiveDispute(id))?;
        info!(claim = %id, disputer = %disputer, stake, deadline = %voting_deadline, "dispute raised");
        self.sink.publish(ClaimEvent::DisputeRaised {
            claim: id,
            disputer: disputer.clone(),
            stake,
            voting_deadline,
        });
        Ok(())
    }

    /// Vote on an open dispute, weighted by the voter's reputation.
    pub fn cast_dispute_vote(
        &mut self,
        id: ClaimId,
        voter: &ParticipantId,
        upholds_challenger: bool,
    ) -> Result<(), VerificationError> {
        let now = self.clock.now();
        let weight = self.reputation.peek_weight(voter, now);
        let result = self
            .registry
            .cast_dispute_vote(id, voter.clone(), upholds_challenger, weight, now);
        rejected("cast_dispute_vote", result)?;

        debug!(claim = %id, voter = %voter, upholds_challenger, weight, "dispute vote cast");
        self.sink.publish(ClaimEvent::DisputeVoteCast {
            claim: id,
            voter: voter.clone(),
            upholds_challenger,
            weight,
        });
        Ok(())
    }

    /// Resolve a dispute once voting has closed and settle the claim.
    ///
    /// Calling this again returns the stored result without side effects.
    pub fn finalize_dispute(&mut self, id: ClaimId) -> Result<DisputeOutcome, VerificationError> {
        let now = self.clock.now();
        let result = self.try_finalize_dispute(id, now);
        rejected("finalize_dispute", result)
    }

    fn try_finalize_dispute(&mut self, id: ClaimId, now: Timestamp) -> Result<DisputeOutcome, VerificationError> {
        let (result, outcome) = match self.registry.preview_dispute(id, now)? {
            DisputeDecision::AlreadyFinal {
                result,
                final_outcome,
            } => {
                return Ok(DisputeOutcome {
                    result,
                    outcome: final_outcome,
                })
            }
            DisputeDecision::Finalize {
                result,
                final_outcome,
            } => (result, final_outcome),
        };

        let settlement = compute_settlement(self.registry.get(id)?, outcome, Some(result), &self.policy);
        self.ledger.apply(&settlement.ops)?;
        self.registry.commit_dispute(id, result, outcome)?;

        info!(claim = %id, ?result, outcome, "dispute resolved");
        self.sink.publish(ClaimEvent::DisputeResolved {
            claim: id,
            result,
            outcome,
        });
        self.apply_reputation(&settlement, now);
        self.publish_settlement(&settlement, now);
        Ok(DisputeOutcome { result, outcome })
    }

    // ── Settlement ───────────────────────────────────────────────────────

    /// Settle an undisputed resolved claim after its dispute window closed.
    pub fn settle(&mut self, id: ClaimId) -> Result<Settlement, VerificationError> {
        let now = self.clock.now();
        let result = self.try_settle(id, now);
        rejected("settle", result)
    }

    fn try_settle(&mut self, id: ClaimId, now: Timestamp) -> Result<Settlement, VerificationError> {
        let outcome = self.registry.preview_settlement(id, now)?;
        let settlement = compute_settlement(self.registry.get(id)?, outcome, None, &self.policy);
        self.ledger.apply(&settlement.ops)?;
        self.registry.commit_settlement(id)?;

        self.apply_reputation(&settlement, now);
        self.publish_settlement(&settlement, now);
        Ok(settlement)
    }

    fn apply_reputation(&mut self, settlement: &Settlement, now: Timestamp) {
        for (participant, delta) in settlement.reputation_deltas() {
            let change = self.reputation.adjust(participant, delta, now);
            self.sink.publish(ClaimEvent::ReputationChanged {
                participant: change.participant,
                before: change.before,
                after: change.after,
                claim: settlement.claim,
            });
        }
    }

    fn publish_settlement(&mut self, settlement: &Settlement, now: Timestamp) {
        info!(
            claim = %settlement.claim,
            outcome = ?settlement.outcome,
            forfeited = settlement.forfeited_total,
            paid_out = settlement.paid_out,
            retained = settlement.retained,
            at = %now,
            "claim settled"
        );
        self.sink.publish(ClaimEvent::ClaimSettled {
            claim: settlement.claim,
            outcome: settlement.outcome,
            forfeited: settlement.forfeited_total,
            paid_out: settlement.paid_out,
        });
    }

    // ── Persistence ──────────────────────────────────────────────────────

    /// Capture claims, reputation and parameters. Ledger balances belong to
    /// the ledger and are persisted by its owner.
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            params: self.params.clone(),
            registry: self.registry.snapshot(),
            reputation: self.reputation.snapshot(),
            taken_at: self.clock.now(),
        }
    }

    /// Rebuild an engine from a snapshot around the given ledger, clock and sink.
    pub fn restore(snapshot: EngineSnapshot, ledger: L, clock: C, sink: S) -> Result<Self, SnapshotError> {
        snapshot.params.validate()?;
        Ok(Self {
            policy: SettlementPolicy::from_params(&snapshot.params),
            registry: ClaimRegistry::restore(snapshot.registry),
            reputation: ReputationStore::restore(snapshot.reputation),
            params: snapshot.params,
            ledger,
            clock,
            sink,
        })
    }

    /// Take the ledger, clock and sink back out of the engine.
    pub fn into_parts(self) -> (L, C, S) {
        (self.ledger, self.clock, self.sink)
    }
}

/// Serializable engine state for persistence across restarts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub params: EngineParams,
    pub registry: RegistrySnapshot,
    pub reputation: ReputationSnapshot,
    pub taken_at: Timestamp,
}

impl EngineSnapshot {
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        bincode::serialize(self).map_err(|e| SnapshotError::Encode(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        bincode::deserialize(bytes).map_err(|e| SnapshotError::Decode(e.to_string()))
    }
}

fn rejected<T>(op: &'static str, result: Result<T, VerificationError>) -> Result<T, VerificationError> {
    if let Err(e) = &result {
        debug!(op, kind = e.kind_label(), error = %e, "operation rejected");
    }
    result
}
