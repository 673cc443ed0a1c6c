//! Command: manage locations.
use anyhow::Result;
use serde::Serialize;

use crate::cli::{GlobalOpts, LocationsCommand};
use crate::locations::Locations;

#[derive(Debug, Serialize)]
struct Entry {
    path: String,
    enabled: bool,
}

/// Run the locations command.
///
/// # Errors
///
/// Returns an error if a location could not be attached or is unknown.
#[allow(clippy::print_stdout)]
pub fn run(locations: &Locations, global: &GlobalOpts, cmd: &LocationsCommand) -> Result<()> {
    match cmd {
        LocationsCommand::List => {
            let entries: Vec<Entry> = locations
                .get(None)
                .into_iter()
                .map(|path| Entry {
                    enabled: locations.is_enabled(&path),
                    path: path.display().to_string(),
                })
                .collect();
            super::emit(global, &entries, |entries| {
                for entry in entries {
                    let mark = if entry.enabled { "+" } else { "-" };
                    println!("{mark} {}", entry.path);
                }
            })
        }
        LocationsCommand::Add { path, disabled } => match locations.add(path, !disabled) {
            None => {
                tracing::warn!("{} is already registered", path.display());
                Ok(())
            }
            Some(errors) => super::report(&errors, "location added but not enabled"),
        },
        LocationsCommand::Enable { path } => {
            super::report(&locations.enable(path), "location not enabled")
        }
        LocationsCommand::Disable { path } => {
            if !locations.disable(path) {
                tracing::warn!("{} is not enabled", path.display());
            }
            Ok(())
        }
        LocationsCommand::Remove { path } => {
            if !locations.remove(path) {
                anyhow::bail!("unknown location {}", path.display());
            }
            Ok(())
        }
    }
}
