//! Finds (and optionally deletes) infrastructure stacks that meet age criteria.
//!
//! Selection is expressed as composable [`core::strategy::Strategy`] values:
//! leaf strategies inspect a stack and record why they selected it, and
//! combinators (`ConjunctionOf`, `DisjunctionOf`, `LimitedBy`) compose them.
//! The crate keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (stacks, timestamps, strategies).
//!   No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (provider calls, delete-and-wait,
//!   config files, child processes). The provider sits behind a trait so
//!   tests can script it.
//!
//! [`sweep`] coordinates the two to implement the CLI.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod sweep;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
