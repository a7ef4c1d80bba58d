//! Styled terminal output utilities.

use owo_colors::OwoColorize;
use serde::Serialize;

use darwin_migrate::MigrationStatus;

use crate::error::CliResult;

/// Print a header/title
pub fn header(text: &str) {
    println!();
    println!("{}", text.bold().cyan());
    println!("{}", "─".repeat(text.chars().count()).dimmed());
    println!();
}

/// Print a section header
pub fn section(text: &str) {
    println!("{}", text.bold().white());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print a success message
pub fn success(text: &str) {
    println!("{} {}", "✔".green().bold(), text.green());
}

/// Print an info message
pub fn info(text: &str) {
    println!("{} {}", "ℹ".blue().bold(), text);
}

/// Print an error message
pub fn error(text: &str) {
    eprintln!("{} {}", "✖".red().bold(), text.red());
}

/// Print a list item
pub fn list_item(text: &str) {
    println!("  {} {}", "•".dimmed(), text);
}

/// Print a newline
pub fn newline() {
    println!();
}

/// Print dimmed text
pub fn dim(text: &str) {
    println!("{}", text.dimmed());
}

/// Print a value as pretty JSON on stdout
pub fn json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Style a migration status for a table cell
pub fn style_status(status: MigrationStatus) -> String {
    let label = format!("{:<8}", status.to_string());
    match status {
        MigrationStatus::Applied => label.green().to_string(),
        MigrationStatus::Pending => label.yellow().to_string(),
        MigrationStatus::Ignored => label.dimmed().to_string(),
        MigrationStatus::Error => label.red().to_string(),
    }
}
