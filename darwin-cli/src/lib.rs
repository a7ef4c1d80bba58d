//! Darwin CLI - Command-line interface for darwin migrations.
//!
//! This crate provides the `darwin` binary: it parses a migration document,
//! checks it against the ledger in a PostgreSQL database and applies what is
//! pending.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
