//! Domain-specific error types and the partial-failure [`ErrorRecord`].
//!
//! Internal modules return typed errors (e.g., [`ConfigError`],
//! [`ImportError`]) while command handlers at the CLI boundary convert them
//! to [`anyhow::Error`] via the standard `?` operator.
//!
//! Subsystems that must never abort halfway (the test loader, location
//! attachment) do not return these errors at all; they accumulate
//! [`ErrorRecord`]s next to their result instead.
//!
//! # Error hierarchy
//!
//! ```text
//! TadekError
//! ├── Config(ConfigError)  — INI syntax, config file I/O
//! ├── Locale(LocaleError)  — message catalogs, plural rules
//! ├── Import(ImportError)  — module and suite resolution
//! ├── Device(DeviceError)  — remote device operations
//! └── Model(ModelError)    — invalid arguments to model helpers
//! ```

use std::backtrace::{Backtrace, BacktraceStatus};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Top-level error type for the substrate.
#[derive(Error, Debug)]
pub enum TadekError {
    /// Configuration store error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Message catalog error.
    #[error("Locale error: {0}")]
    Locale(#[from] LocaleError),

    /// Module or suite resolution error.
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Remote device error.
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    /// Model helper precondition violation.
    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

/// Errors that arise from reading and writing configuration files.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The INI content contains a line that cannot be parsed.
    #[error("Invalid INI syntax in {file} at line {line}: {message}")]
    InvalidSyntax {
        /// File (or `<string>`) the content came from.
        file: String,
        /// One-based line number.
        line: usize,
        /// What was wrong with the line.
        message: String,
    },

    /// A section or option name cannot be written to an INI file.
    #[error("invalid {kind} name {name:?}")]
    InvalidName {
        /// `section` or `option`.
        kind: &'static str,
        /// The rejected name.
        name: String,
    },

    /// An I/O error occurred while reading or writing a config file.
    #[error("IO error on config file {path}: {source}")]
    Io {
        /// Path to the file.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors that arise from compiled message catalogs.
#[derive(Error, Debug)]
pub enum LocaleError {
    /// The file does not start with the GNU catalog magic number.
    #[error("{path} is not a message catalog")]
    BadMagic {
        /// Catalog path.
        path: String,
    },

    /// The catalog references data beyond the end of the file.
    #[error("message catalog {path} is truncated at offset {offset}")]
    Truncated {
        /// Catalog path.
        path: String,
        /// Offending offset.
        offset: usize,
    },

    /// The catalog revision is not supported.
    #[error("message catalog {path} has unsupported revision {revision}")]
    UnsupportedRevision {
        /// Catalog path.
        path: String,
        /// Major revision found in the header.
        revision: u32,
    },

    /// A `Plural-Forms` expression could not be parsed.
    #[error("invalid plural expression '{expression}': {reason}")]
    InvalidPluralRule {
        /// The expression text.
        expression: String,
        /// Why parsing failed.
        reason: String,
    },

    /// An I/O error occurred while reading a catalog.
    #[error("IO error reading message catalog {path}: {source}")]
    Io {
        /// Catalog path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors that arise while resolving modules and suites.
#[derive(Error, Debug)]
pub enum ImportError {
    /// No attached directory provides the module.
    #[error("No module named '{0}'")]
    NotFound(String),

    /// The module has no member with the requested name.
    #[error("module '{module}' has no attribute '{attribute}'")]
    MissingAttribute {
        /// Dotted module name.
        module: String,
        /// Requested member name.
        attribute: String,
    },

    /// The member exists but is not a suite defined by this module.
    #[error("'{module}.{attribute}' is not a test suite defined in '{module}'")]
    NotASuite {
        /// Dotted module name.
        module: String,
        /// Member name.
        attribute: String,
    },
}

/// Errors reported by remote devices.
#[derive(Error, Debug)]
pub enum DeviceError {
    /// The device has no transport bound to it.
    #[error("device '{device}' has no transport for '{operation}'")]
    NoTransport {
        /// Device name.
        device: String,
        /// Requested operation.
        operation: String,
    },

    /// The remote side rejected or failed the request.
    #[error("device '{device}' failed: {message}")]
    Remote {
        /// Device name.
        device: String,
        /// Remote error description.
        message: String,
    },
}

/// Precondition violations in the model helpers.
#[derive(Error, Debug)]
pub enum ModelError {
    /// A coordinate does not fit the device's integer coordinate space.
    #[error("coordinate {axis}={value} is not a valid screen coordinate")]
    InvalidCoordinate {
        /// `"x"` or `"y"`.
        axis: &'static str,
        /// Rejected value.
        value: i64,
    },

    /// The key is neither a single character nor a known key name.
    #[error("unknown key '{0}'")]
    UnknownKey(String),

    /// The modifier name has no hardware keycode.
    #[error("unknown key modifier '{0}'")]
    UnknownModifier(String),

    /// The device rejected the forwarded request.
    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// An immutable record of one partial failure.
///
/// Carries the textual trace captured when the record was built plus
/// arbitrary named attributes (typically `name` and `path`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    traceback: String,
    attributes: BTreeMap<String, String>,
}

impl ErrorRecord {
    /// Build a record from a message, capturing the current backtrace.
    #[must_use]
    pub fn new(message: impl fmt::Display) -> Self {
        let backtrace = Backtrace::capture();
        let traceback = if backtrace.status() == BacktraceStatus::Captured {
            format!("{message}\n\nStack backtrace:\n{backtrace}")
        } else {
            message.to_string()
        };
        Self {
            traceback,
            attributes: BTreeMap::new(),
        }
    }

    /// Build a record from an error, keeping its whole cause chain.
    #[must_use]
    pub fn from_error(error: &anyhow::Error) -> Self {
        if error.backtrace().status() == BacktraceStatus::Captured {
            // Debug form renders the chain followed by the original backtrace.
            Self {
                traceback: format!("{error:?}"),
                attributes: BTreeMap::new(),
            }
        } else {
            Self::new(format!("{error:#}"))
        }
    }

    /// Attach a named attribute.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// The captured trace text.
    #[must_use]
    pub fn traceback(&self) -> &str {
        &self.traceback
    }

    /// Look up a named attribute.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// The `name` attribute, if set.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.get("name")
    }

    /// The `path` attribute, if set.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.get("path")
    }

    /// All attributes in key order.
    #[must_use]
    pub const fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// First line of the trace; the short form used in console output.
    #[must_use]
    pub fn summary(&self) -> &str {
        self.traceback.lines().next().unwrap_or_default()
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name}: {}", self.summary()),
            None => f.write_str(self.summary()),
        }
    }
}

/// A discovered module file: dotted name and location on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    /// Dotted module name within its package.
    pub name: String,
    /// Module file, or package directory.
    pub path: PathBuf,
}
