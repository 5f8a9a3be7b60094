//! Operator CLI for Winium driver services.

pub mod cli;
pub mod commands;
pub mod logging;
