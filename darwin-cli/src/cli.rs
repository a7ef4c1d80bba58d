//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::CONFIG_FILE_NAME;

/// Darwin - versioned SQL migrations for PostgreSQL
#[derive(Parser, Debug)]
#[command(name = "darwin")]
#[command(version)]
#[command(about = "Darwin - versioned SQL migrations for PostgreSQL", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the config file
    #[arg(short, long, global = true, default_value = CONFIG_FILE_NAME)]
    pub config: PathBuf,

    /// Print debug logs to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print results as JSON instead of styled text
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse a migration file without touching the database
    Check(CheckArgs),

    /// Apply pending migrations
    Migrate(DatabaseArgs),

    /// Compare declared migrations with the ledger
    Validate(DatabaseArgs),

    /// Show the status of every declared migration
    Info(DatabaseArgs),

    /// List applied migrations, newest first
    Records(DatabaseArgs),

    /// List migrations the next migrate would apply
    Pending(DatabaseArgs),
}

/// Arguments for the `check` command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Migration file (defaults to the configured file)
    pub file: Option<PathBuf>,
}

/// Arguments shared by commands that talk to the database
#[derive(Args, Debug, Default)]
pub struct DatabaseArgs {
    /// Database connection URL
    #[arg(short, long, env = "DATABASE_URL", hide_env_values = true)]
    pub url: Option<String>,

    /// Migration file
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Ledger table name
    #[arg(short, long)]
    pub table: Option<String>,

    /// Run migrations without wrapping each in a transaction
    #[arg(long)]
    pub no_transaction: bool,
}
