//! Command-line arguments.
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::packages::Package;

/// Command-line front end of the tadek substrate.
#[derive(Parser, Debug)]
#[command(
    name = "tadek",
    about = "Configuration, locations, devices and test discovery for tadek",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity (repeatable)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Program name selecting the per-program configuration directory
    #[arg(long, global = true)]
    pub program: Option<String>,

    /// Use an installation rooted at this directory instead of the system one
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    pub json: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read and write raw configuration values
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Read and write settings
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Manage test locations
    #[command(subcommand)]
    Locations(LocationsCommand),
    /// Manage devices
    #[command(subcommand)]
    Devices(DevicesCommand),
    /// List models, steps, cases or suites
    List(ListOpts),
    /// Load and run test suites
    Run(RunOpts),
    /// Print version information
    Version,
}

/// `config` subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Show configuration names, or the content of one configuration
    Show {
        /// Configuration name
        name: Option<String>,
    },
    /// Print one option value
    Get {
        /// Configuration name
        name: String,
        /// Section
        section: String,
        /// Option
        option: String,
    },
    /// Set one option value in the user configuration
    Set {
        /// Configuration name
        name: String,
        /// Section
        section: String,
        /// Option
        option: String,
        /// Value
        value: String,
    },
    /// Remove an option, a section, or a whole user configuration
    Remove {
        /// Configuration name
        name: String,
        /// Section
        section: Option<String>,
        /// Option
        option: Option<String>,
    },
}

/// `settings` subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum SettingsCommand {
    /// Show settings sections and their options
    Show {
        /// Configuration name
        name: String,
        /// Only this section
        section: Option<String>,
        /// Also show configurations without the settings marker
        #[arg(long)]
        force: bool,
    },
    /// Set one setting, creating the section if needed
    Set {
        /// Configuration name
        name: String,
        /// Section
        section: String,
        /// Option
        option: String,
        /// Value
        value: String,
    },
    /// Remove a setting, or a whole section
    Remove {
        /// Configuration name
        name: String,
        /// Section
        section: String,
        /// Option
        option: Option<String>,
    },
}

/// `locations` subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum LocationsCommand {
    /// List known locations
    List,
    /// Register a location, enabled unless `--disabled`
    Add {
        /// Location directory
        path: PathBuf,
        /// Register without attaching
        #[arg(long)]
        disabled: bool,
    },
    /// Attach a known location
    Enable {
        /// Location directory
        path: PathBuf,
    },
    /// Detach a location
    Disable {
        /// Location directory
        path: PathBuf,
    },
    /// Detach and forget a location
    Remove {
        /// Location directory
        path: PathBuf,
    },
}

/// `devices` subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum DevicesCommand {
    /// List configured devices
    List,
    /// Add a device
    Add {
        /// Device name
        name: String,
        /// Agent address
        #[arg(long)]
        address: Option<String>,
        /// Agent port
        #[arg(long)]
        port: Option<u16>,
        /// Extra parameter as KEY=VALUE (repeatable)
        #[arg(long = "param", value_parser = parse_key_value)]
        params: Vec<(String, String)>,
    },
    /// Change device parameters
    Update {
        /// Device name
        name: String,
        /// Parameter as KEY=VALUE (repeatable)
        #[arg(long = "param", value_parser = parse_key_value, required = true)]
        params: Vec<(String, String)>,
    },
    /// Remove a device
    Remove {
        /// Device name
        name: String,
    },
}

/// Options for the `list` subcommand.
#[derive(Args, Debug, Clone)]
pub struct ListOpts {
    /// Package to list
    #[arg(long, short, default_value_t = Package::TestSuites)]
    pub package: Package,

    /// Show loaded suites as a tree, optionally only under NAME
    #[arg(long)]
    pub tree: bool,

    /// Dotted name to narrow the tree to
    pub name: Option<String>,
}

/// Options for the `run` subcommand.
#[derive(Args, Debug, Clone)]
pub struct RunOpts {
    /// Dotted names of packages, modules, suites or cases; all when empty
    pub names: Vec<String>,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_global_options() {
        let cli = Cli::parse_from(["tadek", "--program", "tadek-ui", "-vv", "--json", "version"]);
        assert_eq!(cli.global.program.as_deref(), Some("tadek-ui"));
        assert_eq!(cli.verbose, 2);
        assert!(cli.global.json);
        assert!(matches!(cli.command, Command::Version));
    }

    #[test]
    fn parse_run_names() {
        let cli = Cli::parse_from(["tadek", "run", "pkg.mdl", "other.Suite.case"]);
        let Command::Run(opts) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(opts.names, ["pkg.mdl", "other.Suite.case"]);
    }

    #[test]
    fn parse_device_params() {
        let cli = Cli::parse_from([
            "tadek", "devices", "add", "phone", "--port", "9000", "--param", "locale=pl_PL",
        ]);
        let Command::Devices(DevicesCommand::Add { name, port, params, .. }) = cli.command else {
            panic!("expected devices add");
        };
        assert_eq!(name, "phone");
        assert_eq!(port, Some(9000));
        assert_eq!(params, [("locale".to_string(), "pl_PL".to_string())]);
    }

    #[test]
    fn bad_param_is_rejected() {
        let args = ["tadek", "devices", "update", "x", "--param", "novalue"];
        assert!(Cli::try_parse_from(args).is_err());
        assert!(parse_key_value("=v").is_err());
    }

    #[test]
    fn parse_list_package() {
        let cli = Cli::parse_from(["tadek", "list", "-p", "models"]);
        let Command::List(opts) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(opts.package, Package::Models);
        assert!(!opts.tree);
    }
}
