//! Events emitted by the engine after every committed state change.

use crate::claim::Resolution;
use crate::dispute::DisputeResult;
use attest_types::{ClaimId, ParticipantId, Timestamp};
use serde::{Deserialize, Serialize};
use std::sync::mpsc;

/// Something observable happened to a claim or a participant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimEvent {
    ClaimSubmitted {
        claim: ClaimId,
        proposer: ParticipantId,
        bond: u128,
        verification_deadline: Timestamp,
    },
    VerificationRecorded {
        claim: ClaimId,
        verifier: ParticipantId,
        asserted: bool,
        stake: u128,
        weight: u128,
    },
    /// The verification phase ended.
    ClaimResolved {
        claim: ClaimId,
        resolution: Resolution,
        /// Weighted score in basis points at finalization.
        score_bps: u32,
        dispute_deadline: Option<Timestamp>,
    },
    DisputeRaised {
        claim: ClaimId,
        disputer: ParticipantId,
        stake: u128,
        voting_deadline: Timestamp,
    },
    DisputeVoteCast {
        claim: ClaimId,
        voter: ParticipantId,
        upholds_challenger: bool,
        weight: u128,
    },
    DisputeResolved {
        claim: ClaimId,
        result: DisputeResult,
        outcome: bool,
    },
    /// Every escrow of the claim has been released or slashed.
    ClaimSettled {
        claim: ClaimId,
        /// `None` when everything was refunded.
        outcome: Option<bool>,
        forfeited: u128,
        paid_out: u128,
    },
    ReputationChanged {
        participant: ParticipantId,
        before: i64,
        after: i64,
        claim: ClaimId,
    },
}

impl ClaimEvent {
    pub fn claim(&self) -> ClaimId {
        match self {
            Self::ClaimSubmitted { claim, .. }
            | Self::VerificationRecorded { claim, .. }
            | Self::ClaimResolved { claim, .. }
            | Self::DisputeRaised { claim, .. }
            | Self::DisputeVoteCast { claim, .. }
            | Self::DisputeResolved { claim, .. }
            | Self::ClaimSettled { claim, .. }
            | Self::ReputationChanged { claim, .. } => *claim,
        }
    }

    /// Short snake_case name, used as a log field and by the daemon's counters.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ClaimSubmitted { .. } => "claim_submitted",
            Self::VerificationRecorded { .. } => "verification_recorded",
            Self::ClaimResolved { .. } => "claim_resolved",
            Self::DisputeRaised { .. } => "dispute_raised",
            Self::DisputeVoteCast { .. } => "dispute_vote_cast",
            Self::DisputeResolved { .. } => "dispute_resolved",
            Self::ClaimSettled { .. } => "claim_settled",
            Self::ReputationChanged { .. } => "reputation_changed",
        }
    }
}

/// Where the engine delivers events.
pub trait EventSink {
    fn publish(&mut self, event: ClaimEvent);
}

/// Records events in order.
impl EventSink for Vec<ClaimEvent> {
    fn publish(&mut self, event: ClaimEvent) {
        self.push(event);
    }
}

/// Forwards events to another thread. A hung-up receiver is ignored.
impl EventSink for mpsc::Sender<ClaimEvent> {
    fn publish(&mut self, event: ClaimEvent) {
        let _ = self.send(event);
    }
}

/// Logs every event through `tracing` and discards it.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn publish(&mut self, event: ClaimEvent) {
        tracing::info!(
            event = event.name(),
            claim = %event.claim(),
            detail = ?event,
            "claim event"
        );
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn publish(&mut self, event: ClaimEvent) {
        (**self).publish(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submitted() -> ClaimEvent {
        ClaimEvent::ClaimSubmitted {
            claim: ClaimId::new(3),
            proposer: ParticipantId::new("alice"),
            bond: 100,
            verification_deadline: Timestamp::new(60),
        }
    }

    #[test]
    fn vec_sink_records_in_order() {
        let mut sink: Vec<ClaimEvent> = Vec::new();
        sink.publish(submitted());
        sink.publish(ClaimEvent::DisputeResolved {
            claim: ClaimId::new(3),
            result: DisputeResult::Rejected,
            outcome: true,
        });
        assert_eq!(sink.len(), 2);
        assert_eq!(sink[0].name(), "claim_submitted");
        assert_eq!(sink[1].claim(), ClaimId::new(3));
    }

    #[test]
    fn channel_sink_forwards_and_tolerates_hangup() {
        let (mut tx, rx) = mpsc::channel();
        tx.publish(submitted());
        assert_eq!(rx.recv().unwrap(), submitted());
        drop(rx);
        tx.publish(submitted());
    }

    #[test]
    fn events_serialize_as_tagged_json() {
        let json = serde_json::to_value(submitted()).unwrap();
        assert_eq!(json["ClaimSubmitted"]["proposer"], "alice");
        assert_eq!(json["ClaimSubmitted"]["claim"], 3);
    }
}
