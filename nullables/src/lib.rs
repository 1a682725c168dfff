//! Nullable infrastructure for deterministic testing.
//!
//! The engine reaches the outside world only through the `Clock` and
//! `Ledger` traits. This crate provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Can be told to fail, to exercise error paths
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod ledger;

pub use clock::NullClock;
pub use ledger::NullLedger;
