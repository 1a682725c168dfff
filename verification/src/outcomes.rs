//! Settlement outcomes: who gets their stake back, who is slashed, and how
//! forfeited stakes are redistributed once a claim's outcome is final.
//!
//! For a final outcome `o`:
//! - Verifiers that asserted `o` win: stake returned, reputation rewarded.
//!   Everyone else loses their stake to the reward pool and is penalized,
//!   either in full or by their share of the losing side's weight
//!   (see [`PenaltySplit`]).
//! - The proposer keeps the bond and is rewarded when `o` is true, and
//!   loses it when `o` is false.
//! - An upheld disputer gets the stake back plus `disputer_reward_bps` of the
//!   forfeited total. Any other disputer (rejected, or nobody voted) is
//!   slashed and penalized.
//! - `winner_share_bps` of what remains is split among winning verifiers
//!   pro rata by stake. Rounding dust and the rest stay in the pool.
//!
//! Everything here is pure: the result is a list of [`LedgerOp`]s the engine
//! applies as one batch, plus the reputation deltas it applies afterwards.

use crate::claim::Claim;
use crate::dispute::DisputeResult;
use attest_stake::{LedgerOp, StakeRole, StakeTag};
use attest_types::{ClaimId, EngineParams, ParticipantId, PenaltySplit, BPS_SCALE};
use serde::{Deserialize, Serialize};

/// The parameters settlement depends on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettlementPolicy {
    pub reputation_reward: i64,
    pub reputation_penalty: i64,
    pub penalty_split: PenaltySplit,
    pub winner_share_bps: u32,
    pub disputer_reward_bps: u32,
    pub reward_pool: ParticipantId,
}

impl SettlementPolicy {
    pub fn from_params(params: &EngineParams) -> Self {
        Self {
            reputation_reward: params.reputation_reward,
            reputation_penalty: params.reputation_penalty,
            penalty_split: params.penalty_split,
            winner_share_bps: params.winner_share_bps,
            disputer_reward_bps: params.disputer_reward_bps,
            reward_pool: params.reward_pool.clone(),
        }
    }

    /// Reputation removed from a losing verifier that contributed `weight`
    /// out of the losing side's `losing_weight`.
    pub fn verifier_penalty(&self, weight: u128, losing_weight: u128) -> i64 {
        let penalty = self.reputation_penalty;
        if penalty <= 0 || losing_weight == 0 || self.penalty_split == PenaltySplit::Flat {
            return penalty;
        }
        let share = mul_div_ceil(penalty as u128, weight.min(losing_weight), losing_weight);
        i64::try_from(share).unwrap_or(penalty).clamp(1, penalty)
    }
}

/// What settlement did for one escrow holder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantOutcome {
    pub participant: ParticipantId,
    pub role: StakeRole,
    pub staked: u128,
    /// Ended on the side of the final outcome (always true for refunds).
    pub correct: bool,
    /// Escrow returned to the participant.
    pub returned: u128,
    /// Escrow slashed to the reward pool.
    pub forfeited: u128,
    /// Paid out of the reward pool on top of the returned stake.
    pub reward: u128,
    pub reputation_delta: i64,
}

/// The complete effect of settling one claim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub claim: ClaimId,
    /// Final truth value, or `None` when everything is refunded.
    pub outcome: Option<bool>,
    /// Ledger batch: releases and slashes first, then pool transfers.
    pub ops: Vec<LedgerOp>,
    pub participants: Vec<ParticipantOutcome>,
    pub forfeited_total: u128,
    /// Paid from the pool to the disputer and winning verifiers.
    pub paid_out: u128,
    /// Forfeited stake left in the pool.
    pub retained: u128,
}

impl Settlement {
    /// Participants whose reputation changes, with the delta to apply.
    pub fn reputation_deltas(&self) -> impl Iterator<Item = (&ParticipantId, i64)> {
        self.participants
            .iter()
            .filter(|p| p.reputation_delta != 0)
            .map(|p| (&p.participant, p.reputation_delta))
    }

    pub fn outcome_for(&self, participant: &ParticipantId, role: StakeRole) -> Option<&ParticipantOutcome> {
        self.participants
            .iter()
            .find(|p| &p.participant == participant && p.role == role)
    }
}

/// Settle a claim whose final outcome is `outcome`.
///
/// `dispute_result` is the result of the claim's dispute, if one was raised.
pub fn compute_settlement(
    claim: &Claim,
    outcome: bool,
    dispute_result: Option<DisputeResult>,
    policy: &SettlementPolicy,
) -> Settlement {
    let pool = &policy.reward_pool;
    let mut ops = Vec::new();
    let mut participants = Vec::new();

    let losing_weight: u128 = claim
        .verifications
        .iter()
        .filter(|v| v.asserted != outcome)
        .fold(0u128, |acc, v| acc.saturating_add(v.weight));

    let mut settle = |participant: &ParticipantId, role: StakeRole, staked: u128, wins: bool, penalty: i64| {
        let tag = StakeTag::new(claim.id, participant.clone(), role);
        if staked > 0 {
            ops.push(if wins {
                LedgerOp::Release {
                    tag,
                    to: participant.clone(),
                }
            } else {
                LedgerOp::Slash {
                    tag,
                    beneficiary: pool.clone(),
                }
            });
        }
        let reputation_delta = if wins { policy.reputation_reward } else { -penalty };
        participants.push(ParticipantOutcome {
            participant: participant.clone(),
            role,
            staked,
            correct: wins,
            returned: if wins { staked } else { 0 },
            forfeited: if wins { 0 } else { staked },
            reward: 0,
            reputation_delta,
        });
    };

    settle(&claim.proposer, StakeRole::Bond, claim.bond, outcome, policy.reputation_penalty);
    for v in &claim.verifications {
        let penalty = policy.verifier_penalty(v.weight, losing_weight);
        settle(&v.verifier, StakeRole::Verification, v.stake, v.asserted == outcome, penalty);
    }
    if let (Some(dispute), Some(result)) = (&claim.dispute, dispute_result) {
        settle(
            &dispute.disputer,
            StakeRole::Dispute,
            dispute.stake,
            result.is_upheld(),
            policy.reputation_penalty,
        );
    }

    let forfeited_total: u128 = participants.iter().map(|p| p.forfeited).sum();
    let mut remaining = forfeited_total;

    if dispute_result == Some(DisputeResult::Upheld) {
        let reward = bps_of(forfeited_total, policy.disputer_reward_bps);
        if let Some(disputer) = participants
            .iter_mut()
            .find(|p| p.role == StakeRole::Dispute)
        {
            disputer.reward = reward;
            remaining -= reward;
        }
    }

    let winner_pot = bps_of(remaining, policy.winner_share_bps);
    let winning_stake: u128 = participants
        .iter()
        .filter(|p| p.role == StakeRole::Verification && p.correct && p.staked > 0)
        .map(|p| p.staked)
        .sum();
    if winning_stake > 0 {
        for p in participants
            .iter_mut()
            .filter(|p| p.role == StakeRole::Verification && p.correct && p.staked > 0)
        {
            p.reward = mul_div(winner_pot, p.staked, winning_stake);
        }
    }

    for p in participants.iter().filter(|p| p.reward > 0) {
        ops.push(LedgerOp::Transfer {
            from: pool.clone(),
            to: p.participant.clone(),
            amount: p.reward,
        });
    }

    let paid_out: u128 = participants.iter().map(|p| p.reward).sum();
    Settlement {
        claim: claim.id,
        outcome: Some(outcome),
        ops,
        participants,
        forfeited_total,
        paid_out,
        retained: forfeited_total - paid_out,
    }
}

/// Refund every escrow of a canceled or expired claim. No reputation changes.
pub fn compute_refund(claim: &Claim) -> Settlement {
    let holders = std::iter::once((&claim.proposer, StakeRole::Bond, claim.bond)).chain(
        claim
            .verifications
            .iter()
            .map(|v| (&v.verifier, StakeRole::Verification, v.stake)),
    );

    let mut ops = Vec::new();
    let mut participants = Vec::new();
    for (participant, role, staked) in holders {
        if staked > 0 {
            ops.push(LedgerOp::Release {
                tag: StakeTag::new(claim.id, participant.clone(), role),
                to: participant.clone(),
            });
        }
        participants.push(ParticipantOutcome {
            participant: participant.clone(),
            role,
            staked,
            correct: true,
            returned: staked,
            forfeited: 0,
            reward: 0,
            reputation_delta: 0,
        });
    }

    Settlement {
        claim: claim.id,
        outcome: None,
        ops,
        participants,
        forfeited_total: 0,
        paid_out: 0,
        retained: 0,
    }
}

fn bps_of(amount: u128, bps: u32) -> u128 {
    mul_div(amount, bps as u128, BPS_SCALE as u128)
}

/// `a * b / c`, rounded up. Operands are halved until the product fits, so
/// very large weights lose precision rather than overflow.
fn mul_div_ceil(a: u128, mut b: u128, mut c: u128) -> u128 {
    while b > 0 && a.checked_mul(b).is_none() {
        b >>= 1;
        c >>= 1;
    }
    match c {
        0 => a,
        c => (a * b).div_ceil(c),
    }
}

/// `a * b / c`, rounded down. Never exceeds the exact quotient, even when the
/// product overflows.
fn mul_div(a: u128, b: u128, c: u128) -> u128 {
    if c == 0 {
        return 0;
    }
    match a.checked_mul(b) {
        Some(product) => product / c,
        None => (a / c).saturating_mul(b),
    }
}
