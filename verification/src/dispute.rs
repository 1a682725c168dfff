//! Disputes: staked challenges against a resolved outcome.

use attest_types::{ParticipantId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How a dispute ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisputeResult {
    /// The challenger won: the claim's outcome flips.
    Upheld,
    /// The challenger lost: the outcome stands and the dispute stake is slashed.
    Rejected,
    /// Nobody voted: the outcome stands and, like a rejection, the dispute
    /// stake is slashed.
    NoQuorum,
}

impl DisputeResult {
    /// Only an upheld dispute flips the outcome and spares the disputer.
    pub fn is_upheld(&self) -> bool {
        matches!(self, Self::Upheld)
    }
}

/// A reputation-weighted vote on a dispute.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisputeVote {
    pub voter: ParticipantId,
    pub upholds_challenger: bool,
    pub weight: u128,
    pub cast_at: Timestamp,
}

/// An active or finished challenge against a claim's resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dispute {
    pub disputer: ParticipantId,
    pub stake: u128,
    pub raised_at: Timestamp,
    pub voting_deadline: Timestamp,
    /// Weight of votes upholding the challenger.
    pub votes_for: u128,
    /// Weight of votes backing the original resolution.
    pub votes_against: u128,
    pub votes: Vec<DisputeVote>,
    /// Everyone who has voted, indexed for duplicate checks.
    pub voters: BTreeSet<ParticipantId>,
    pub resolved: bool,
    pub outcome_upheld: bool,
    pub result: Option<DisputeResult>,
}

impl Dispute {
    pub fn new(
        disputer: ParticipantId,
        stake: u128,
        raised_at: Timestamp,
        voting_deadline: Timestamp,
    ) -> Self {
        Self {
            disputer,
            stake,
            raised_at,
            voting_deadline,
            votes_for: 0,
            votes_against: 0,
            votes: Vec::new(),
            voters: BTreeSet::new(),
            resolved: false,
            outcome_upheld: false,
            result: None,
        }
    }

    pub fn has_voted(&self, voter: &ParticipantId) -> bool {
        self.voters.contains(voter)
    }

    pub(crate) fn record_vote(&mut self, vote: DisputeVote) {
        if vote.upholds_challenger {
            self.votes_for = self.votes_for.saturating_add(vote.weight);
        } else {
            self.votes_against = self.votes_against.saturating_add(vote.weight);
        }
        self.voters.insert(vote.voter.clone());
        self.votes.push(vote);
    }
}
