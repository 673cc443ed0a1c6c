//! Logical packages and the module files that populate them.
//!
//! A logical package is an ordered list of directories. A module is a
//! `*.rs` file or a directory holding a `mod.rs`; nested modules are
//! addressed with dotted names relative to the package.
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::constants::UnknownName;
use crate::error::FileRecord;
use crate::loader::Module;
use crate::platform::{PACKAGE_INIT, SOURCE_EXTENSION};

/// The four logical packages every location may contribute to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Package {
    /// `models/`
    Models,
    /// `teststeps/`
    TestSteps,
    /// `testcases/`
    TestCases,
    /// `testsuites/`
    TestSuites,
}

impl Package {
    /// Every package, in attachment order.
    pub const ALL: [Self; 4] = [Self::Models, Self::TestSteps, Self::TestCases, Self::TestSuites];

    /// Directory and import name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Models => "models",
            Self::TestSteps => "teststeps",
            Self::TestCases => "testcases",
            Self::TestSuites => "testsuites",
        }
    }

    /// Cache key of a module of this package.
    #[must_use]
    pub fn qualify(self, dotted: &str) -> String {
        format!("{}.{dotted}", self.name())
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Package {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| UnknownName(s.to_string()))
    }
}

fn is_source_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION)
        && path.file_name().is_some_and(|name| name != PACKAGE_INIT)
}

/// Modules below `dir`, keyed by dotted name.
///
/// Files map to themselves, packages to their directory. A missing or
/// unreadable directory has no content.
#[must_use]
pub fn module_content(dir: &Path) -> BTreeMap<String, PathBuf> {
    let mut content = BTreeMap::new();
    walk(dir, "", &mut content);
    content
}

fn walk(dir: &Path, prefix: &str, content: &mut BTreeMap<String, PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let is_dir = path.is_dir();
        let stem = if is_dir {
            path.file_name()
        } else {
            path.file_stem()
        };
        let Some(stem) = stem.and_then(|s| s.to_str()).filter(|s| !s.contains('.')) else {
            continue;
        };
        let name = format!("{prefix}{stem}");
        if is_dir {
            if path.join(PACKAGE_INIT).is_file() {
                walk(&path, &format!("{name}."), content);
                content.insert(name, path);
            }
        } else if is_source_file(&path) {
            content.insert(name, path);
        }
    }
}

/// Top-level names of a module listing.
pub fn top_level(content: &BTreeMap<String, PathBuf>) -> impl Iterator<Item = &str> {
    content.keys().map(String::as_str).filter(|n| !n.contains('.'))
}

/// Module listing as records.
#[must_use]
pub fn file_records(content: &BTreeMap<String, PathBuf>) -> Vec<FileRecord> {
    content
        .iter()
        .map(|(name, path)| FileRecord {
            name: name.clone(),
            path: path.clone(),
        })
        .collect()
}

/// Locate a dotted module in the first directory that provides it.
///
/// Every intermediate segment must be a package; the last one may be a
/// file or a package, in which case its `mod.rs` is returned.
#[must_use]
pub fn find_module(paths: &[PathBuf], dotted: &str) -> Option<PathBuf> {
    let segments: Vec<&str> = dotted.split('.').collect();
    let (last, parents) = segments.split_last()?;
    if segments.iter().any(|s| s.is_empty()) {
        return None;
    }
    paths.iter().find_map(|root| {
        let mut dir = root.clone();
        for segment in parents {
            dir.push(segment);
            if !dir.join(PACKAGE_INIT).is_file() {
                return None;
            }
        }
        let file = dir.join(format!("{last}.{SOURCE_EXTENSION}"));
        if file.is_file() {
            return Some(file);
        }
        let init = dir.join(last).join(PACKAGE_INIT);
        init.is_file().then_some(init)
    })
}

/// Whether `name` is `prefix` or lies below it.
#[must_use]
pub fn is_within(name: &str, prefix: &str) -> bool {
    name.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
}

/// Loaded modules keyed by `{package}.{dotted}`.
#[derive(Debug, Default)]
pub struct ModuleCache {
    modules: Mutex<BTreeMap<String, Arc<Module>>>,
}

impl ModuleCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Arc<Module>>> {
        self.modules.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A cached module.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Arc<Module>> {
        self.lock().get(key).cloned()
    }

    /// Cache a module.
    pub fn insert(&self, key: impl Into<String>, module: Arc<Module>) {
        self.lock().insert(key.into(), module);
    }

    /// Drop `prefix` and everything below it; returns how many entries went.
    pub fn purge_prefix(&self, prefix: &str) -> usize {
        let mut modules = self.lock();
        let before = modules.len();
        modules.retain(|key, _| !is_within(key, prefix));
        let purged = before - modules.len();
        if purged > 0 {
            tracing::debug!("purged {purged} cached module(s) under '{prefix}'");
        }
        purged
    }

    /// Drop every cached module.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Cached keys in order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Number of cached modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
