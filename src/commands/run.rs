//! Command: load and run suites.
use anyhow::Result;

use crate::cli::{GlobalOpts, RunOpts};
use crate::loader::TestLoader;
use crate::runner;

/// Run the run command.
///
/// # Errors
///
/// Returns an error if any case failed or anything failed to load.
pub fn run(loader: &TestLoader, verbosity: u8, global: &GlobalOpts, opts: &RunOpts) -> Result<()> {
    let summary = runner::run(loader, verbosity, &opts.names);
    if global.json {
        super::emit(global, &summary, |_| {})?;
    }
    if !summary.success() {
        anyhow::bail!(
            "{} case(s) failed, {} load error(s)",
            summary.failed,
            summary.load_errors
        );
    }
    Ok(())
}
