//! Command: manage devices.
use std::collections::BTreeMap;

use anyhow::Result;
use serde::Serialize;

use crate::cli::{DevicesCommand, GlobalOpts};
use crate::devices::{DeviceParams, DeviceRegistry};

#[derive(Debug, Serialize)]
struct Entry {
    name: String,
    address: String,
    port: u16,
    params: BTreeMap<String, String>,
}

fn to_params(pairs: &[(String, String)]) -> DeviceParams {
    pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
}

/// Run the devices command.
///
/// # Errors
///
/// Returns an error if settings cannot be written or the device is unknown.
#[allow(clippy::print_stdout)]
pub fn run(devices: &DeviceRegistry, global: &GlobalOpts, cmd: &DevicesCommand) -> Result<()> {
    match cmd {
        DevicesCommand::List => {
            let entries: Vec<Entry> = devices
                .all()
                .into_iter()
                .map(|d| Entry {
                    name: d.name().to_string(),
                    address: d.address(),
                    port: d.port(),
                    params: d
                        .params()
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                })
                .collect();
            super::emit(global, &entries, |entries| {
                for e in entries {
                    println!("{} {}:{}", e.name, e.address, e.port);
                }
            })
        }
        DevicesCommand::Add {
            name,
            address,
            port,
            params,
        } => {
            let device = devices.add(name, None, address.as_deref(), *port, &to_params(params))?;
            tracing::info!("{} {}:{}", device.name(), device.address(), device.port());
            Ok(())
        }
        DevicesCommand::Update { name, params } => {
            if !devices.update(name, &to_params(params))? {
                anyhow::bail!("unknown device '{name}'");
            }
            Ok(())
        }
        DevicesCommand::Remove { name } => {
            if !devices.remove(name)? {
                anyhow::bail!("unknown device '{name}'");
            }
            Ok(())
        }
    }
}
