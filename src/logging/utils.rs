//! Log file paths, ANSI stripping, and timestamps.
use std::fs;
use std::path::{Path, PathBuf};

/// Strip ANSI CSI sequences (colors, cursor movement) from a string.
pub(super) fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\x1b' {
            out.push(c);
            continue;
        }
        if chars.next() == Some('[') {
            for inner in chars.by_ref() {
                if ('@'..='~').contains(&inner) {
                    break;
                }
            }
        }
    }
    out
}

/// Return `{dir}/{command}.log`, creating `dir` if needed.
pub(super) fn log_file_path(dir: &Path, command: &str) -> Option<PathBuf> {
    fs::create_dir_all(dir).ok()?;
    Some(dir.join(format!("{command}.log")))
}

/// Current UTC time as `YYYY-MM-DD HH:MM:SS`.
pub(super) fn format_utc_datetime() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Current UTC time as `HH:MM:SS`.
pub(super) fn format_utc_time() -> String {
    chrono::Utc::now().format("%H:%M:%S").to_string()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn strip_ansi_removes_sequences() {
        assert_eq!(strip_ansi("\x1b[31mFAIL\x1b[0m case"), "FAIL case");
        assert_eq!(strip_ansi("\x1b[2Jclear"), "clear");
        assert_eq!(strip_ansi("\x1bMx"), "x");
        assert_eq!(strip_ansi("plain"), "plain");
    }

    #[test]
    fn log_file_path_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("user").join("logs");
        let path = log_file_path(&dir, "run").unwrap();
        assert!(dir.is_dir());
        assert_eq!(path, dir.join("run.log"));
    }

    #[test]
    fn timestamps_have_fixed_shape() {
        let time = format_utc_time();
        assert_eq!(time.len(), 8);
        assert_eq!(&time[2..3], ":");
        let datetime = format_utc_datetime();
        assert_eq!(datetime.len(), 19);
        assert_eq!(&datetime[10..11], " ");
    }
}
