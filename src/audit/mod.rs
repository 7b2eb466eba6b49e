//! Run accounting for the telemetry tools.
//!
//! Counts what each command processed so operators can see, across runs,
//! how many ticks were scored, how many raised alerts and how many readings
//! were rejected.

pub mod log;

// Re-export commonly used types
pub use log::{create_shared_log, create_shared_log_with_persistence, RunLog, RunStats, SharedRunLog};
