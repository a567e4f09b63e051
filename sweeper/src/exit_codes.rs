//! Stable exit codes for the `stack-sweeper` binary.

/// Sweep finished; every requested delete succeeded.
pub const OK: i32 = 0;
/// Invalid criteria/config/log level, or a fatal provider error (e.g. listing failed).
pub const INVALID: i32 = 1;
/// Command-line usage error, as reported by clap.
pub const USAGE: i32 = 2;
/// At least one selected stack failed to delete.
pub const DELETE_FAILED: i32 = 3;
