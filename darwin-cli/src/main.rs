//! Darwin CLI - Command-line interface for darwin migrations.

use clap::Parser;

use darwin_cli::cli::{Cli, Command};
use darwin_cli::commands::{self, Context};
use darwin_cli::error::CliResult;
use darwin_cli::{logging, output};

#[tokio::main]
async fn main() {
    // Run the CLI and handle errors
    if let Err(e) = run().await {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let ctx = Context::load(&cli)?;

    match cli.command {
        Command::Check(args) => commands::check::run(&ctx, args).await,
        Command::Migrate(args) => commands::migrate::run(&ctx, args).await,
        Command::Validate(args) => commands::validate::run(&ctx, args).await,
        Command::Info(args) => commands::info::run(&ctx, args).await,
        Command::Records(args) => commands::records::run(&ctx, args).await,
        Command::Pending(args) => commands::pending::run(&ctx, args).await,
    }
}
