//! Command: list package files, or the loaded suite tree.
use anyhow::Result;

use crate::cli::{GlobalOpts, ListOpts};
use crate::loader::TestLoader;

/// Run the list command.
///
/// # Errors
///
/// Returns an error if some suites failed to load.
#[allow(clippy::print_stdout)]
pub fn run(loader: &TestLoader, global: &GlobalOpts, opts: &ListOpts) -> Result<()> {
    if !opts.tree {
        let files = loader.locations().files(opts.package);
        return super::emit(global, &files, |files| {
            for file in files {
                println!("{}  {}", file.name, file.path.display());
            }
        });
    }

    let (tree, errors) = loader.load_tree(opts.name.as_deref());
    if global.json {
        let flat: Vec<(String, String, Vec<String>)> = tree
            .flatten()
            .into_iter()
            .map(|(module, suite)| (module, suite.name().to_string(), suite.cases()))
            .collect();
        super::emit(global, &flat, |_| {})?;
    } else {
        for line in tree.outline() {
            println!("{line}");
        }
    }
    super::report(&errors, "some suites failed to load")
}
