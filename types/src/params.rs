//! Engine parameters: stake minimums, reputation bounds, consensus threshold,
//! phase windows and the settlement policy.
//!
//! Ratios are expressed in basis points (10_000 = 100%) so every comparison
//! stays in integer arithmetic.

use crate::error::ParamsError;
use crate::id::ParticipantId;
use serde::{Deserialize, Serialize};

/// 100% in basis points.
pub const BPS_SCALE: u32 = 10_000;

/// Longest phase window accepted, in seconds (ten years).
pub const MAX_WINDOW_SECS: u64 = 10 * 365 * 24 * 3600;

/// How the reputation penalty is shared among verifiers on the losing side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltySplit {
    /// Every losing verifier loses the full `reputation_penalty`.
    Flat,
    /// Losing verifiers share the penalty in proportion to the vote weight
    /// they contributed, rounded up and never below one point.
    #[default]
    ByWeight,
}

/// All tunable parameters of a claim engine.
///
/// Missing fields fall back to [`EngineParams::default`] when deserialized,
/// so a configuration file only needs to list what it changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    // ── Stakes ───────────────────────────────────────────────────────────
    /// Minimum bond a proposer must post with a claim.
    pub min_bond: u128,

    /// Minimum stake attached to a verification.
    pub min_verifier_stake: u128,

    /// Minimum stake a disputer must post.
    pub min_dispute_stake: u128,

    // ── Reputation ───────────────────────────────────────────────────────
    pub min_reputation: i64,
    pub max_reputation: i64,

    /// Score of a participant the store has never seen.
    pub initial_reputation: i64,

    /// Points subtracted per elapsed decay period. Zero disables decay.
    pub reputation_decay_points: i64,

    /// Length of one decay period in seconds.
    pub reputation_decay_period_secs: u64,

    /// Reputation granted to participants on the winning side of a settlement.
    pub reputation_reward: i64,

    /// Reputation removed from participants on the losing side of a settlement.
    pub reputation_penalty: i64,

    /// How `reputation_penalty` applies to losing verifiers. Proposers and
    /// disputers always take the full penalty.
    pub penalty_split: PenaltySplit,

    // ── Consensus ────────────────────────────────────────────────────────
    /// Weighted agreement needed to resolve a claim, in (5000, 10000] bps.
    /// Equality passes.
    pub consensus_threshold_bps: u32,

    /// Verifications required for a claim to resolve at all. A claim that
    /// attracts some, but fewer, verifications expires.
    pub min_verifications: u32,

    // ── Windows ──────────────────────────────────────────────────────────
    /// Default verification window when the proposer does not choose one.
    pub verification_window_secs: u64,

    /// How long after resolution a dispute may be raised.
    pub dispute_window_secs: u64,

    /// How long a raised dispute accepts votes.
    pub dispute_vote_window_secs: u64,

    // ── Settlement ───────────────────────────────────────────────────────
    /// Share of forfeited stakes (after the disputer's reward) paid out to
    /// winning verifiers pro rata by stake. The rest stays in the pool.
    pub winner_share_bps: u32,

    /// Share of forfeited stakes paid to a disputer whose dispute is upheld.
    pub disputer_reward_bps: u32,

    /// Ledger account that receives slashed stakes and pays out winner shares.
    pub reward_pool: ParticipantId,
}

impl EngineParams {
    /// Check the parameter set for internal consistency.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.consensus_threshold_bps <= BPS_SCALE / 2
            || self.consensus_threshold_bps > BPS_SCALE
        {
            return Err(ParamsError::ThresholdOutOfRange(self.consensus_threshold_bps));
        }
        if self.min_reputation > self.max_reputation {
            return Err(ParamsError::InvertedReputationBounds {
                min: self.min_reputation,
                max: self.max_reputation,
            });
        }
        if !(self.min_reputation..=self.max_reputation).contains(&self.initial_reputation) {
            return Err(ParamsError::InitialReputationOutOfBounds {
                initial: self.initial_reputation,
                min: self.min_reputation,
                max: self.max_reputation,
            });
        }
        for (name, value) in [
            ("verification_window_secs", self.verification_window_secs),
            ("dispute_window_secs", self.dispute_window_secs),
            ("dispute_vote_window_secs", self.dispute_vote_window_secs),
            ("reputation_decay_period_secs", self.reputation_decay_period_secs),
        ] {
            if value == 0 {
                return Err(ParamsError::ZeroDuration(name));
            }
        }
        for (name, value) in [
            ("verification_window_secs", self.verification_window_secs),
            ("dispute_window_secs", self.dispute_window_secs),
            ("dispute_vote_window_secs", self.dispute_vote_window_secs),
        ] {
            if value > MAX_WINDOW_SECS {
                return Err(ParamsError::WindowTooLong {
                    name,
                    value,
                    max: MAX_WINDOW_SECS,
                });
            }
        }
        for (name, value) in [
            ("winner_share_bps", self.winner_share_bps),
            ("disputer_reward_bps", self.disputer_reward_bps),
        ] {
            if value > BPS_SCALE {
                return Err(ParamsError::BpsOutOfRange { name, value });
            }
        }
        if self.min_bond == 0 {
            return Err(ParamsError::ZeroMinimumBond);
        }
        if self.reward_pool.as_str().is_empty() {
            return Err(ParamsError::EmptyRewardPool);
        }
        Ok(())
    }
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            min_bond: 100,
            min_verifier_stake: 10,
            min_dispute_stake: 50,

            min_reputation: 0,
            max_reputation: 1_000,
            initial_reputation: 100,
            reputation_decay_points: 1,
            reputation_decay_period_secs: 24 * 3600, // 1 point per day
            reputation_reward: 10,
            reputation_penalty: 20,
            penalty_split: PenaltySplit::ByWeight,

            consensus_threshold_bps: 7_000, // 70%
            min_verifications: 1,

            verification_window_secs: 3 * 24 * 3600, // 3 days
            dispute_window_secs: 24 * 3600,          // 1 day
            dispute_vote_window_secs: 24 * 3600,     // 1 day

            winner_share_bps: 9_000,    // 90%
            disputer_reward_bps: 5_000, // 50%
            reward_pool: ParticipantId::new("reward-pool"),
        }
    }
}
