//! Console and file logging on top of `tracing`.

mod subscriber;
mod utils;

pub use subscriber::{FileLayer, init_subscriber};

/// Target for per-suite progress lines.
pub const SUITE_TARGET: &str = "tadek::suite";

/// Target for per-case result lines.
pub const CASE_TARGET: &str = "tadek::case";
