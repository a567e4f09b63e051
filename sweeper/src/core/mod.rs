//! Deterministic, pure decision logic.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! stack snapshots and return deterministic outputs suitable for tests; the
//! only "clock" is the compare time injected into the age strategies.

pub mod age;
pub mod combinators;
pub mod criteria;
pub mod exclude;
pub mod stack;
pub mod strategy;
pub mod timestamp;
