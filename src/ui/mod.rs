//! User interface module - interaction (prompts) and formatting.
//!
//! Separates concerns:
//! - `formatter` - Pure formatting functions
//! - This module - Interactive prompts and user input handling
//!
//! Only the command layer prompts; coordinators never do interactive I/O.

use std::io::{self, Write};

use anyhow::Result;
use console::{style, Term};

use crate::domain::ReleaseRecord;

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    build_table, display_boundary_warning, display_delete_outcome, display_error,
    display_partial_failure, display_release_outcome, display_release_plan,
    display_rollback_outcome, display_rollback_plan, display_status, display_success,
    format_duration, release_table,
};

/// How list-style commands print their results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Whether prompts can be shown
pub fn is_interactive() -> bool {
    Term::stdout().is_term() && Term::stderr().is_term()
}

/// Parse a 1-based selection; empty input picks nothing.
pub fn parse_selection(input: &str, count: usize) -> Result<usize> {
    let selection = input.trim();
    if selection.is_empty() {
        return Err(anyhow::anyhow!("No release selected"));
    }
    match selection.parse::<usize>() {
        Ok(index) if index > 0 && index <= count => Ok(index - 1),
        _ => Err(anyhow::anyhow!(
            "Invalid selection '{}': expected a number between 1 and {}",
            selection,
            count
        )),
    }
}

/// Prompts user to choose a release from a list.
///
/// There is no default: an empty answer is an error, so an ambiguous
/// intent never turns into a guess.
///
/// # Returns
/// * `Ok(String)` - The selected tag
/// * `Err` - If the list is empty or the selection is invalid
pub fn select_release(releases: &[ReleaseRecord], action: &str) -> Result<String> {
    if releases.is_empty() {
        return Err(anyhow::anyhow!("No releases found"));
    }

    println!("\n{}", style(format!("Releases available to {}:", action)).bold());
    for (i, release) in releases.iter().enumerate() {
        println!("  {}. {}  {}", i + 1, release.tag, style(&release.title).dim());
    }

    print!("\nSelect a release (1-{}): ", releases.len());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let index = parse_selection(&input, releases.len())?;
    Ok(releases[index].tag.clone())
}

/// Prompts user to confirm an action with a yes/no prompt.
///
/// Accepts "y" or "yes" (case-insensitive). Default is "no".
pub fn confirm_action(prompt: &str) -> Result<bool> {
    print!("\n{} (y/N): ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let response = input.trim().to_lowercase();
    Ok(response == "y" || response == "yes")
}
