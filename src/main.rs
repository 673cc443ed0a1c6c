//! `tadek` command-line entry point.
use anyhow::Result;
use clap::Parser;

use tadek_core::cli::{self, Command};
use tadek_core::commands;
use tadek_core::global::Context;
use tadek_core::logging;
use tadek_core::platform::Layout;

const fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Config(_) => "config",
        Command::Settings(_) => "settings",
        Command::Locations(_) => "locations",
        Command::Devices(_) => "devices",
        Command::List(_) => "list",
        Command::Run(_) => "run",
        Command::Version => "version",
    }
}

fn main() -> Result<()> {
    enable_ansi_support::enable_ansi_support().ok();
    let args = cli::Cli::parse();

    if matches!(args.command, Command::Version) {
        commands::version::run();
        return Ok(());
    }

    let layout = args
        .global
        .root
        .as_deref()
        .map_or_else(Layout::detect, Layout::from_root);
    logging::init_subscriber(
        args.verbose > 0,
        Some(&layout.log_dir()),
        command_name(&args.command),
    );

    let ctx = Context::new(layout);
    for error in ctx.start(args.global.program.as_deref()) {
        tracing::warn!("{error}");
    }

    let global = &args.global;
    match &args.command {
        Command::Config(cmd) => commands::config::run(ctx.config(), global, cmd),
        Command::Settings(cmd) => commands::settings::run(ctx.settings(), global, cmd),
        Command::Locations(cmd) => commands::locations::run(ctx.locations(), global, cmd),
        Command::Devices(cmd) => commands::devices::run(ctx.devices(), global, cmd),
        Command::List(opts) => commands::list::run(ctx.loader(), global, opts),
        Command::Run(opts) => commands::run::run(ctx.loader(), args.verbose, global, opts),
        Command::Version => {
            commands::version::run();
            Ok(())
        }
    }
}
