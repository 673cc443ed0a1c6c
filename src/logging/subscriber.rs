//! Tracing subscriber setup: console formatter, file layer, and initialisation.
use std::fs;
use std::io::Write as _;
use std::path::Path;
use std::sync::Mutex;

use super::utils::{format_utc_datetime, format_utc_time, log_file_path, strip_ansi};
use super::{CASE_TARGET, SUITE_TARGET};

/// Fields of one event: the message plus the runner's structured fields.
#[derive(Default)]
struct EventFields {
    message: String,
    suite: Option<String>,
    case: Option<String>,
    error: Option<String>,
    passed: u64,
    failed: u64,
}

/// A runner event, recognised by target and fields.
enum Progress<'a> {
    Suite {
        name: &'a str,
        passed: u64,
        failed: u64,
    },
    Case {
        name: &'a str,
        error: Option<&'a str>,
    },
}

impl EventFields {
    fn of(event: &tracing::Event<'_>) -> Self {
        let mut fields = Self::default();
        event.record(&mut fields);
        fields
    }

    fn text(&mut self, name: &str, value: String) {
        match name {
            "message" => self.message = value,
            "suite" => self.suite = Some(value),
            "case" => self.case = Some(value),
            "error" => self.error = Some(value),
            _ => {}
        }
    }

    fn progress(&self, target: &str) -> Option<Progress<'_>> {
        match target {
            SUITE_TARGET => self.suite.as_deref().map(|name| Progress::Suite {
                name,
                passed: self.passed,
                failed: self.failed,
            }),
            CASE_TARGET => self.case.as_deref().map(|name| Progress::Case {
                name,
                error: self.error.as_deref(),
            }),
            _ => None,
        }
    }
}

impl tracing::field::Visit for EventFields {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.text(field.name(), format!("{value:?}"));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.text(field.name(), value.to_string());
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        match field.name() {
            "passed" => self.passed = value,
            "failed" => self.failed = value,
            name => self.text(name, value.to_string()),
        }
    }
}

/// Appends every event to `{log_dir}/{command}.log`, timestamped and with
/// ANSI codes stripped.
#[derive(Debug)]
pub struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Open the log file for `command`, truncating it with a run header.
    ///
    /// Returns `None` if the directory or file cannot be created.
    #[must_use]
    pub fn new(log_dir: &Path, command: &str) -> Option<Self> {
        let path = log_file_path(log_dir, command)?;
        let version =
            option_env!("TADEK_VERSION").unwrap_or(concat!("dev-", env!("CARGO_PKG_VERSION")));
        let header = format!("== tadek {version} {command} {} ==\n", format_utc_datetime());
        fs::write(&path, header).ok()?;
        let file = fs::OpenOptions::new().append(true).open(&path).ok()?;
        Some(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let metadata = event.metadata();
        let fields = EventFields::of(event);
        let ts = format_utc_time();

        let line = match fields.progress(metadata.target()) {
            Some(Progress::Suite {
                name,
                passed,
                failed,
            }) => format!("[{ts}] ==> {name} ({passed} passed, {failed} failed)"),
            Some(Progress::Case { name, error: None }) => format!("[{ts}]     ok {name}"),
            Some(Progress::Case {
                name,
                error: Some(error),
            }) => format!("[{ts}]     FAIL {name}: {}", strip_ansi(error)),
            None => {
                let msg = strip_ansi(&fields.message);
                match *metadata.level() {
                    tracing::Level::ERROR => format!("[{ts}]     [error] {msg}"),
                    tracing::Level::WARN => format!("[{ts}]     [warn] {msg}"),
                    tracing::Level::INFO => format!("[{ts}]     {msg}"),
                    _ => format!("[{ts}]     [debug] {}: {msg}", metadata.target()),
                }
            }
        };

        if let Ok(mut f) = self.file.lock() {
            writeln!(f, "{line}").ok();
        }
    }
}

/// Console output in the tadek style.
struct TadekFormatter;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for TadekFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let fields = EventFields::of(event);

        if let Some(progress) = fields.progress(metadata.target()) {
            return match progress {
                Progress::Suite {
                    name,
                    passed,
                    failed: 0,
                } => writeln!(writer, "\x1b[1;34m==>\x1b[0m \x1b[1m{name}\x1b[0m {passed} passed"),
                Progress::Suite {
                    name,
                    passed,
                    failed,
                } => writeln!(
                    writer,
                    "\x1b[1;34m==>\x1b[0m \x1b[1m{name}\x1b[0m {passed} passed, \x1b[31m{failed} failed\x1b[0m"
                ),
                Progress::Case { name, error: None } => {
                    writeln!(writer, "    \x1b[32mok\x1b[0m   {name}")
                }
                Progress::Case {
                    name,
                    error: Some(error),
                } => writeln!(writer, "    \x1b[31mFAIL\x1b[0m {name}: {error}"),
            };
        }

        let msg = &fields.message;
        match *metadata.level() {
            tracing::Level::ERROR => writeln!(writer, "\x1b[31mERROR\x1b[0m {msg}"),
            tracing::Level::WARN => writeln!(writer, "\x1b[33mWARN\x1b[0m  {msg}"),
            tracing::Level::INFO => writeln!(writer, "{msg}"),
            _ => writeln!(writer, "  \x1b[2m{msg}\x1b[0m"),
        }
    }
}

/// Install the global subscriber.
///
/// The console shows `info` and above (`debug` when `verbose`), warnings on
/// stderr and the rest on stdout. When `log_dir` is given every event down
/// to `debug` is also written to `{log_dir}/{command}.log`. `RUST_LOG`
/// overrides the console filter.
pub fn init_subscriber(verbose: bool, log_dir: Option<&Path>, command: &str) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        EnvFilter, Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let console_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(console_level.into())
        .from_env_lossy();

    let make_writer = std::io::stderr
        .with_max_level(tracing::Level::WARN)
        .and(std::io::stdout.with_min_level(tracing::Level::INFO));

    let console_layer = fmt::layer()
        .event_format(TadekFormatter)
        .with_writer(make_writer)
        .with_filter(filter);

    let file_layer = log_dir
        .and_then(|dir| FileLayer::new(dir, command))
        .map(|l| l.with_filter(LevelFilter::DEBUG));

    // A second init (tests, embedding hosts) keeps the first subscriber.
    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .ok();
}
