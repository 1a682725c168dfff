//! Participant reputation.
//!
//! Every participant carries a signed score bounded by
//! `[min_reputation, max_reputation]`. Scores decay linearly over time and
//! decay is applied lazily: nothing happens until the record is read or
//! adjusted. Unknown participants start at `initial_reputation`.
//!
//! Reputation is what weights a participant's votes: `weight = max(1, score)`.

pub mod record;
pub mod store;

pub use record::{ParticipantRecord, ReputationChange};
pub use store::{DecayPolicy, ReputationSnapshot, ReputationStore};
