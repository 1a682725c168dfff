//! Stake ledger: escrowed funds tied to the claim lifecycle.
//!
//! Every bond, verification stake and dispute stake is escrowed under a
//! [`StakeTag`] naming the claim, the participant and the role. Each tag is
//! settled exactly once, either released back to its owner (or another
//! recipient) or slashed to a beneficiary such as the reward pool.
//!
//! The [`Ledger`] trait is the seam to the host's asset system;
//! [`InMemoryLedger`] is a complete implementation backed by internal credits.

pub mod error;
pub mod ledger;
pub mod memory;
pub mod tag;

pub use error::StakeError;
pub use ledger::{Ledger, LedgerOp};
pub use memory::InMemoryLedger;
pub use tag::{EscrowEntry, EscrowStatus, StakeRole, StakeTag};
