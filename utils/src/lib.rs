//! Shared utilities for the Attest workspace.

pub mod logging;
pub mod stats;
pub mod time;

pub use logging::{init_logging, LogFormat};
pub use stats::OpCounters;
pub use time::format_window;
