//! Command: raw access to the layered config store.
use std::collections::BTreeMap;

use anyhow::{Context as _, Result};

use crate::cli::{ConfigCommand, GlobalOpts};
use crate::config::ConfigStore;

type Dump = BTreeMap<String, BTreeMap<String, String>>;

/// Every section and option of a configuration as readers see it.
#[must_use]
pub fn dump(store: &ConfigStore, name: &str) -> Dump {
    store
        .sections(name)
        .into_iter()
        .map(|section| {
            let options = store
                .options(name, &section)
                .into_iter()
                .filter_map(|option| {
                    let value = store.get(name, &section, &option)?;
                    Some((option, value))
                })
                .collect();
            (section, options)
        })
        .collect()
}

/// Print sections as INI text.
#[allow(clippy::print_stdout)]
pub fn print_ini(dump: &Dump) {
    for (section, options) in dump {
        println!("[{section}]");
        for (option, value) in options {
            println!("{option} = {value}");
        }
        println!();
    }
}

/// Run the config command.
///
/// # Errors
///
/// Returns an error if a write fails or a requested value does not exist.
#[allow(clippy::print_stdout)]
pub fn run(store: &ConfigStore, global: &GlobalOpts, cmd: &ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { name: None } => {
            super::emit(global, &store.names(), |names| {
                for name in names {
                    println!("{name}");
                }
            })
        }
        ConfigCommand::Show { name: Some(name) } => {
            super::emit(global, &dump(store, name), print_ini)
        }
        ConfigCommand::Get {
            name,
            section,
            option,
        } => {
            let value = store
                .get(name, section, option)
                .with_context(|| format!("no option '{option}' in [{section}] of '{name}'"))?;
            super::emit(global, &value, |v| println!("{v}"))
        }
        ConfigCommand::Set {
            name,
            section,
            option,
            value,
        } => {
            store.set(name, section, option, value.as_str())?;
            tracing::info!("{name}: [{section}] {option} = {value}");
            Ok(())
        }
        ConfigCommand::Remove {
            name,
            section: None,
            ..
        } => {
            if store.remove(name) {
                tracing::info!("removed {}", store.user_file(name).display());
            } else {
                tracing::warn!("'{name}' has no user configuration");
            }
            Ok(())
        }
        ConfigCommand::Remove {
            name,
            section: Some(section),
            option,
        } => {
            let removed = match option {
                Some(option) => store.remove_option(name, section, option)?,
                None => store.remove_section(name, section)?,
            };
            if !removed {
                tracing::warn!("nothing to remove in the user configuration of '{name}'");
            }
            Ok(())
        }
    }
}
