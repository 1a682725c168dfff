//! Fundamental types for the Attest claim verification engine.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! participant and claim identifiers, timestamps and the clock abstraction, and
//! the engine parameters.

pub mod error;
pub mod id;
pub mod params;
pub mod time;

pub use error::ParamsError;
pub use id::{ClaimId, ParticipantId};
pub use params::{EngineParams, PenaltySplit, BPS_SCALE, MAX_WINDOW_SECS};
pub use time::{Clock, SystemClock, Timestamp};
