//! Thread-safe handle around a [`ClaimEngine`].
//!
//! One mutex guards the whole engine. Each call holds it for the complete
//! transaction, so operations on the same claim or the same participant are
//! serialized and never observe each other's intermediate state.

use crate::claim::{Claim, Resolution};
use crate::engine::{ClaimEngine, DisputeOutcome, EngineSnapshot};
use crate::error::VerificationError;
use crate::events::EventSink;
use crate::outcomes::Settlement;
use attest_stake::Ledger;
use attest_types::{ClaimId, Clock, ParticipantId};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Cloneable, shareable engine handle.
pub struct SharedEngine<L, C, S> {
    inner: Arc<Mutex<ClaimEngine<L, C, S>>>,
}

impl<L, C, S> Clone for SharedEngine<L, C, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: Ledger, C: Clock, S: EventSink> SharedEngine<L, C, S> {
    pub fn new(engine: ClaimEngine<L, C, S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Lock the engine. A panic in another holder does not leave the engine
    /// half-updated, so a poisoned lock is recovered.
    pub fn lock(&self) -> MutexGuard<'_, ClaimEngine<L, C, S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the engine.
    pub fn with<R>(&self, f: impl FnOnce(&mut ClaimEngine<L, C, S>) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn submit_claim(
        &self,
        proposer: &ParticipantId,
        payload: impl Into<String>,
        bond: u128,
        window_secs: Option<u64>,
    ) -> Result<ClaimId, VerificationError> {
        self.lock().submit_claim(proposer, payload, bond, window_secs)
    }

    pub fn verify(
        &self,
        id: ClaimId,
        verifier: &ParticipantId,
        asserted: bool,
        stake: u128,
    ) -> Result<(), VerificationError> {
        self.lock().verify(id, verifier, asserted, stake)
    }

    pub fn finalize_verification(&self, id: ClaimId) -> Result<Resolution, VerificationError> {
        self.lock().finalize_verification(id)
    }

    pub fn raise_dispute(
        &self,
        id: ClaimId,
        disputer: &ParticipantId,
        stake: u128,
    ) -> Result<(), VerificationError> {
        self.lock().raise_dispute(id, disputer, stake)
    }

    pub fn cast_dispute_vote(
        &self,
        id: ClaimId,
        voter: &ParticipantId,
        upholds_challenger: bool,
    ) -> Result<(), VerificationError> {
        self.lock().cast_dispute_vote(id, voter, upholds_challenger)
    }

    pub fn finalize_dispute(&self, id: ClaimId) -> Result<DisputeOutcome, VerificationError> {
        self.lock().finalize_dispute(id)
    }

    pub fn settle(&self, id: ClaimId) -> Result<Settlement, VerificationError> {
        self.lock().settle(id)
    }

    pub fn cancel_claim(&self, id: ClaimId, caller: &ParticipantId) -> Result<(), VerificationError> {
        self.lock().cancel_claim(id, caller)
    }

    /// Copy of a claim's current state.
    pub fn claim(&self, id: ClaimId) -> Result<Claim, VerificationError> {
        self.lock().claim(id).cloned()
    }

    pub fn reputation(&self, participant: &ParticipantId) -> i64 {
        self.lock().reputation(participant)
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        self.lock().snapshot()
    }
}
