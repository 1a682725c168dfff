//! Stake-weighted claim verification.
//!
//! A proposer posts a bonded **claim**. During the verification window,
//! participants stake on its truth value; each vote is weighted by the
//! verifier's reputation at the moment it is cast. When the window closes the
//! weighted score is compared against the consensus threshold and the claim
//! resolves True, resolves False, or is canceled.
//!
//! A resolved claim may be **disputed** once during its dispute window. A
//! reputation-weighted vote among other participants either upholds the
//! challenge, flipping the outcome, or rejects it.
//!
//! Once the outcome is final, **settlement** releases or slashes every escrow
//! tied to the claim in one ledger batch and adjusts reputations.
//!
//! [`ClaimEngine`] drives the whole workflow over pluggable [`attest_stake::Ledger`],
//! [`attest_types::Clock`] and [`EventSink`] implementations.

pub mod claim;
pub mod consensus;
pub mod dispute;
pub mod engine;
pub mod error;
pub mod events;
pub mod outcomes;
pub mod registry;
pub mod shared;

pub use claim::{Claim, ClaimStatus, Resolution, Verification};
pub use consensus::{dispute_majority, passes_threshold, weighted_score, Direction, Ratio};
pub use dispute::{Dispute, DisputeResult, DisputeVote};
pub use engine::{ClaimEngine, DisputeOutcome, EngineSnapshot};
pub use error::{ErrorKind, SnapshotError, VerificationError};
pub use events::{ClaimEvent, EventSink, TracingSink};
pub use outcomes::{compute_refund, compute_settlement, ParticipantOutcome, Settlement, SettlementPolicy};
pub use registry::{ClaimRegistry, DisputeDecision, RegistrySnapshot, VerificationDecision};
pub use shared::SharedEngine;
