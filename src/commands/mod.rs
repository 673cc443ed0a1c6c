//! Subcommand implementations.
//!
//! Each command prints human-readable text, or JSON when `--json` is given.
pub mod config;
pub mod devices;
pub mod list;
pub mod locations;
pub mod run;
pub mod settings;
pub mod version;

use anyhow::Result;
use serde::Serialize;

use crate::cli::GlobalOpts;
use crate::error::ErrorRecord;

/// Print `value` as JSON if requested, otherwise run `human`.
///
/// # Errors
///
/// Returns an error if serialization fails.
#[allow(clippy::print_stdout)]
pub fn emit<T: Serialize + ?Sized>(
    global: &GlobalOpts,
    value: &T,
    human: impl FnOnce(&T),
) -> Result<()> {
    if global.json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        human(value);
    }
    Ok(())
}

/// Log partial failures; returns an error naming how many there were.
///
/// # Errors
///
/// Returns an error if `errors` is non-empty.
pub fn report(errors: &[ErrorRecord], what: &str) -> Result<()> {
    for error in errors {
        tracing::error!("{error}");
        tracing::debug!("{}", error.traceback());
    }
    if errors.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("{what}: {} error(s)", errors.len())
    }
}
