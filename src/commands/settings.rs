//! Command: settings view over the config store.
use std::collections::BTreeMap;

use anyhow::Result;

use crate::cli::{GlobalOpts, SettingsCommand};
use crate::config::settings::Settings;

/// Setting sections of `name` and their values; `only` narrows to one section.
#[must_use]
pub fn collect(
    settings: &Settings,
    name: &str,
    only: Option<&str>,
    force: bool,
) -> BTreeMap<String, BTreeMap<String, String>> {
    let sections = match only {
        Some(section) => vec![section.to_string()],
        None => settings.sections(name, force),
    };
    sections
        .into_iter()
        .filter_map(|section| {
            let options = settings
                .section(name, &section, force)?
                .options()
                .into_iter()
                .filter_map(|o| Some((o.name().to_string(), o.get()?)))
                .collect();
            Some((section, options))
        })
        .collect()
}

/// Run the settings command.
///
/// # Errors
///
/// Returns an error if a write fails.
pub fn run(settings: &Settings, global: &GlobalOpts, cmd: &SettingsCommand) -> Result<()> {
    match cmd {
        SettingsCommand::Show {
            name,
            section,
            force,
        } => {
            let found = collect(settings, name, section.as_deref(), *force);
            if found.is_empty() && !global.json {
                tracing::warn!("no settings in '{name}'; use --force to include unmarked sections");
            }
            super::emit(global, &found, super::config::print_ini)
        }
        SettingsCommand::Set {
            name,
            section,
            option,
            value,
        } => {
            settings.set(name, section, option, value.as_str())?;
            tracing::info!("{name}: [{section}] {option} = {value}");
            Ok(())
        }
        SettingsCommand::Remove {
            name,
            section,
            option,
        } => {
            let removed = match option {
                Some(option) => settings.remove(name, section, option)?,
                None => settings.remove_section(name, section)?,
            };
            if !removed {
                tracing::warn!("no such setting in '{name}'");
            }
            Ok(())
        }
    }
}
