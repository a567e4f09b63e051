//! Side effects: the provider surface, stack lifecycle, and configuration.

pub mod aws_cli;
pub mod cloudformation;
pub mod config;
pub mod lifecycle;
pub mod process;
