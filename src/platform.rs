//! Operating system detection and the install layout.
use std::fmt;
use std::path::{Path, PathBuf};

/// Project name used for install directories and the message domain.
pub const PROJECT_NAME: &str = "tadek";

/// Subdirectory used when no program name is set.
pub const COMMON_DIR: &str = "common";

/// Extension of configuration files.
pub const CONFIG_EXTENSION: &str = "conf";

/// Extension of user source files inside locations.
pub const SOURCE_EXTENSION: &str = "rs";

/// File that turns a directory into a package.
pub const PACKAGE_INIT: &str = "mod.rs";

/// Name of the message catalog directory, both built-in and per location.
pub const LOCALE_DIR: &str = "locale";

/// Environment variable that collapses every root into one directory.
pub const ROOT_ENV: &str = "TADEK_ROOT";

/// Detected operating system platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    /// Linux, and the POSIX layout.
    Linux,
    /// Windows, and the `%ProgramFiles%` layout.
    Windows,
    /// Any other OS; treated like Linux.
    Other,
}

impl Os {
    /// Detect the current operating system.
    #[must_use]
    pub const fn detect() -> Self {
        if cfg!(target_os = "linux") {
            Self::Linux
        } else if cfg!(target_os = "windows") {
            Self::Windows
        } else {
            Self::Other
        }
    }

    /// Whether the POSIX directory conventions apply.
    #[must_use]
    pub const fn is_posix(self) -> bool {
        !matches!(self, Self::Windows)
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => write!(f, "linux"),
            Self::Windows => write!(f, "windows"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Where system configuration, data, documentation and user state live.
///
/// Every other component derives its directories from a `Layout`, so tests
/// can point the whole substrate at a temporary directory with
/// [`Layout::from_root`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// System configuration root (`/etc/tadek`).
    pub conf_dir: PathBuf,
    /// Shared data root (`/usr/share/tadek`).
    pub data_dir: PathBuf,
    /// Documentation root (`/usr/share/doc/tadek`).
    pub doc_dir: PathBuf,
    /// Per-user state root (`~/.tadek`).
    pub user_dir: PathBuf,
}

impl Layout {
    /// Resolve the layout for this process.
    ///
    /// `TADEK_ROOT` wins, then a source checkout next to the executable,
    /// then the platform defaults.
    #[must_use]
    pub fn detect() -> Self {
        if let Some(root) = std::env::var_os(ROOT_ENV).filter(|v| !v.is_empty()) {
            return Self::from_root(root);
        }
        if let Some(checkout) = std::env::current_exe()
            .ok()
            .as_deref()
            .and_then(Path::parent)
            .and_then(find_checkout)
        {
            return Self::checkout(&checkout);
        }
        Self::for_os(Os::detect())
    }

    /// Platform default layout.
    #[must_use]
    pub fn for_os(os: Os) -> Self {
        if os.is_posix() {
            let home = std::env::var_os("HOME").map_or_else(|| PathBuf::from("."), PathBuf::from);
            Self {
                conf_dir: PathBuf::from("/etc").join(PROJECT_NAME),
                data_dir: PathBuf::from("/usr/share").join(PROJECT_NAME),
                doc_dir: PathBuf::from("/usr/share/doc").join(PROJECT_NAME),
                user_dir: home.join(format!(".{PROJECT_NAME}")),
            }
        } else {
            let program_files = std::env::var_os("ProgramFiles")
                .map_or_else(|| PathBuf::from("C:\\Program Files"), PathBuf::from)
                .join(PROJECT_NAME.to_uppercase());
            let appdata = std::env::var_os("APPDATA")
                .or_else(|| std::env::var_os("USERPROFILE"))
                .map_or_else(|| PathBuf::from("."), PathBuf::from);
            Self {
                conf_dir: program_files.clone(),
                data_dir: program_files.clone(),
                doc_dir: program_files.join("doc"),
                user_dir: appdata.join(PROJECT_NAME),
            }
        }
    }

    /// Layout of a source checkout: everything lives under `data/`.
    #[must_use]
    pub fn checkout(checkout: &Path) -> Self {
        let data = checkout.join("data");
        Self {
            conf_dir: data.clone(),
            data_dir: data.clone(),
            doc_dir: checkout.join("doc"),
            user_dir: data.join("user"),
        }
    }

    /// Collapse every root into `root`.
    #[must_use]
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            conf_dir: root.clone(),
            data_dir: root.clone(),
            doc_dir: root.join("doc"),
            user_dir: root.join("user"),
        }
    }

    /// Root of the system configuration tiers.
    #[must_use]
    pub fn system_config_dir(&self) -> PathBuf {
        self.conf_dir.join("config")
    }

    /// Root of the user configuration tiers.
    #[must_use]
    pub fn user_config_dir(&self) -> PathBuf {
        self.user_dir.join("config")
    }

    /// Built-in message catalog directory.
    #[must_use]
    pub fn locale_dir(&self) -> PathBuf {
        self.data_dir.join(LOCALE_DIR)
    }

    /// Built-in directory of a logical package.
    #[must_use]
    pub fn builtin_package_dir(&self, package: &str) -> PathBuf {
        self.data_dir.join(package)
    }

    /// Directory for persistent log files.
    #[must_use]
    pub fn log_dir(&self) -> PathBuf {
        self.user_dir.join("logs")
    }
}

/// Return the checkout root if `exe_dir`'s parent contains `data/`.
fn find_checkout(exe_dir: &Path) -> Option<PathBuf> {
    let parent = exe_dir.parent()?;
    parent.join("data").is_dir().then(|| parent.to_path_buf())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn os_detect_is_consistent_with_cfg() {
        let os = Os::detect();
        assert_eq!(os == Os::Windows, cfg!(target_os = "windows"));
    }

    #[test]
    fn os_display() {
        assert_eq!(Os::Linux.to_string(), "linux");
        assert_eq!(Os::Windows.to_string(), "windows");
    }

    #[test]
    fn posix_layout_paths() {
        let layout = Layout::for_os(Os::Linux);
        assert_eq!(layout.conf_dir, PathBuf::from("/etc/tadek"));
        assert_eq!(layout.data_dir, PathBuf::from("/usr/share/tadek"));
        assert_eq!(layout.doc_dir, PathBuf::from("/usr/share/doc/tadek"));
        assert!(layout.user_dir.ends_with(".tadek"));
    }

    #[test]
    fn windows_layout_uses_uppercase_program_dir() {
        let layout = Layout::for_os(Os::Windows);
        assert!(layout.conf_dir.ends_with("TADEK"));
        assert!(layout.user_dir.ends_with("tadek"));
    }

    #[test]
    fn from_root_collapses_all_roots() {
        let layout = Layout::from_root("/tmp/x");
        assert_eq!(layout.system_config_dir(), PathBuf::from("/tmp/x/config"));
        assert_eq!(
            layout.user_config_dir(),
            PathBuf::from("/tmp/x/user/config")
        );
        assert_eq!(layout.locale_dir(), PathBuf::from("/tmp/x/locale"));
        assert_eq!(
            layout.builtin_package_dir("models"),
            PathBuf::from("/tmp/x/models")
        );
    }

    #[test]
    fn checkout_detected_from_data_dir() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("data")).unwrap();
        std::fs::create_dir_all(tmp.path().join("bin")).unwrap();
        let found = find_checkout(&tmp.path().join("bin")).expect("checkout should be found");
        assert_eq!(found, tmp.path());
        let layout = Layout::checkout(&found);
        assert_eq!(layout.data_dir, tmp.path().join("data"));
        assert_eq!(layout.conf_dir, layout.data_dir);
    }

    #[test]
    fn no_checkout_without_data_dir() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("bin")).unwrap();
        assert!(find_checkout(&tmp.path().join("bin")).is_none());
    }
}
