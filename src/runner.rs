//! Minimal test runner over the loader.
use serde::Serialize;

use crate::error::ErrorRecord;
use crate::loader::TestLoader;
use crate::logging::{CASE_TARGET, SUITE_TARGET};

/// Counts from one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Cases that passed.
    pub passed: usize,
    /// Cases that failed.
    pub failed: usize,
    /// Suites or modules that could not be loaded.
    pub load_errors: usize,
    /// The load failures themselves.
    pub errors: Vec<ErrorRecord>,
}

impl RunSummary {
    /// Whether nothing failed to load or run.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.failed == 0 && self.load_errors == 0
    }
}

/// Load the suites addressed by `names` (everything if empty) and run them.
///
/// `verbosity` 0 logs the summary, 1 adds one line per suite, 2 and up one
/// line per case.
#[must_use]
pub fn run<S: AsRef<str>>(loader: &TestLoader, verbosity: u8, names: &[S]) -> RunSummary {
    let (suites, errors) = loader.load_from_names(names);
    for error in &errors {
        tracing::error!("{error}");
        tracing::debug!("{}", error.traceback());
    }

    let mut summary = RunSummary {
        load_errors: errors.len(),
        errors,
        ..RunSummary::default()
    };
    for suite in suites {
        let results = suite.run();
        let failed = results.iter().filter(|r| !r.passed()).count();
        let passed = results.len() - failed;
        if verbosity >= 1 {
            tracing::info!(
                target: SUITE_TARGET,
                suite = suite.name(),
                passed,
                failed,
                "{}",
                suite.name()
            );
        }
        for result in &results {
            match (&result.error, verbosity) {
                (Some(error), _) => {
                    // Shown at every verbosity, so qualified with the suite.
                    let case = format!("{}.{}", suite.name(), result.case);
                    tracing::info!(
                        target: CASE_TARGET,
                        case = case.as_str(),
                        error = error.as_str(),
                        "{case}"
                    );
                }
                (None, 2..) => {
                    let case = result.case.as_str();
                    tracing::info!(target: CASE_TARGET, case, "{case}");
                }
                (None, _) => {}
            }
        }
        summary.failed += failed;
        summary.passed += passed;
    }

    tracing::info!(
        "{} passed, {} failed, {} load error(s)",
        summary.passed,
        summary.failed,
        summary.load_errors
    );
    summary
}
