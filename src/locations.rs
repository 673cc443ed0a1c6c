//! Registry of user source trees ("locations").
//!
//! An enabled location contributes its `models/`, `teststeps/`,
//! `testcases/` and `testsuites/` subdirectories to the matching logical
//! [`Package`], and its `locale/` subdirectory to the [`Translations`].
//! Attachment is all-or-nothing: a location whose top-level module names
//! collide with modules already provided stays disabled.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::ConfigStore;
use crate::config::settings::Settings;
use crate::error::{ErrorRecord, FileRecord};
use crate::locale::Translations;
use crate::packages::{self, ModuleCache, Package};
use crate::platform::{LOCALE_DIR, Layout};

/// Configuration holding one setting section per persisted location.
pub const LOCATIONS_CONFIG: &str = "locations";

/// Option storing the enabled flag of a persisted location.
pub const ENABLED_OPTION: &str = "enabled";

#[derive(Debug)]
struct State {
    /// Known locations in priority order with their enabled flag.
    locations: Vec<(PathBuf, bool)>,
    /// Directory lists per package; index 0 is the built-in directory.
    packages: BTreeMap<Package, Vec<PathBuf>>,
}

/// Ordered set of locations and the package directory lists they feed.
#[derive(Debug)]
pub struct Locations {
    translations: Arc<Translations>,
    modules: Arc<ModuleCache>,
    settings: Option<Settings>,
    state: Mutex<State>,
}

fn normalize(path: &Path) -> PathBuf {
    dunce::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

impl Locations {
    /// Create a registry whose packages start with the built-in directories.
    #[must_use]
    pub fn new(layout: &Layout, translations: Arc<Translations>) -> Self {
        let packages = Package::ALL
            .into_iter()
            .map(|p| (p, vec![layout.builtin_package_dir(p.name())]))
            .collect();
        Self {
            translations,
            modules: Arc::new(ModuleCache::new()),
            settings: None,
            state: Mutex::new(State {
                locations: Vec::new(),
                packages,
            }),
        }
    }

    /// Persist locations in the `locations` configuration of `store`.
    #[must_use]
    pub fn with_store(mut self, store: Arc<ConfigStore>) -> Self {
        self.settings = Some(Settings::new(store));
        self
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, path: &Path, enabled: bool) {
        let Some(settings) = &self.settings else {
            return;
        };
        let section = path.display().to_string();
        if let Err(e) = settings.set(LOCATIONS_CONFIG, &section, ENABLED_OPTION, &enabled) {
            tracing::warn!("could not persist location {section}: {e}");
        }
    }

    fn forget(&self, path: &Path) {
        let Some(settings) = &self.settings else {
            return;
        };
        let section = path.display().to_string();
        if let Err(e) = settings.remove_section(LOCATIONS_CONFIG, &section) {
            tracing::warn!("could not forget location {section}: {e}");
        }
    }

    /// Re-add every persisted location; returns attachment errors.
    pub fn restore(&self) -> Vec<ErrorRecord> {
        let Some(settings) = &self.settings else {
            return Vec::new();
        };
        let mut errors = Vec::new();
        for section in settings.sections(LOCATIONS_CONFIG, false) {
            let enabled = settings
                .option(LOCATIONS_CONFIG, &section, ENABLED_OPTION, false)
                .and_then(|o| o.get_bool())
                .unwrap_or(true);
            if let Some(errs) = self.add(Path::new(&section), enabled) {
                errors.extend(errs);
            }
        }
        errors
    }

    /// Register a location; `None` if it was already known.
    ///
    /// When `enabled`, the location is attached right away and the
    /// attachment errors are returned.
    pub fn add(&self, path: &Path, enabled: bool) -> Option<Vec<ErrorRecord>> {
        let path = normalize(path);
        {
            let mut state = self.lock();
            if state.locations.iter().any(|(p, _)| *p == path) {
                return None;
            }
            state.locations.push((path.clone(), false));
        }
        tracing::debug!("added location {}", path.display());
        if enabled {
            Some(self.enable(&path))
        } else {
            self.persist(&path, false);
            Some(Vec::new())
        }
    }

    /// Attach a known location to every package it has a directory for.
    ///
    /// On any top-level name conflict nothing is attached and one record
    /// per conflicting module is returned.
    pub fn enable(&self, path: &Path) -> Vec<ErrorRecord> {
        let path = normalize(path);
        let mut state = self.lock();
        let Some(index) = state.locations.iter().position(|(p, _)| *p == path) else {
            return vec![
                ErrorRecord::new(format!("Location is not registered: {}", path.display()))
                    .with("path", path.display().to_string()),
            ];
        };
        if state.locations.get(index).is_some_and(|(_, enabled)| *enabled) {
            return Vec::new();
        }

        let mut errors = Vec::new();
        let mut attach = Vec::new();
        for (package, dirs) in &state.packages {
            let candidate = path.join(package.name());
            if !candidate.is_dir() {
                continue;
            }
            let existing = union_content(dirs);
            let content = packages::module_content(&candidate);
            for name in packages::top_level(&content) {
                if let Some(other) = existing.get(name) {
                    let qualified = package.qualify(name);
                    errors.push(
                        ErrorRecord::new(format!(
                            "Module '{qualified}' is already provided by {}",
                            other.display()
                        ))
                        .with("name", qualified)
                        .with("path", candidate.join(name).display().to_string()),
                    );
                }
            }
            attach.push((*package, candidate));
        }
        if !errors.is_empty() {
            tracing::warn!(
                "location {} not enabled: {} conflict(s)",
                path.display(),
                errors.len()
            );
            drop(state);
            self.persist(&path, false);
            return errors;
        }

        for (package, candidate) in attach {
            state.packages.entry(package).or_default().push(candidate);
        }
        if let Some((_, enabled)) = state.locations.get_mut(index) {
            *enabled = true;
        }
        drop(state);

        self.translations.add(&path.join(LOCALE_DIR));
        self.persist(&path, true);
        tracing::debug!("enabled location {}", path.display());
        Vec::new()
    }

    /// Detach a location; returns `false` if it was not enabled.
    pub fn disable(&self, path: &Path) -> bool {
        let path = normalize(path);
        {
            let mut state = self.lock();
            let Some((_, enabled)) = state
                .locations
                .iter_mut()
                .find(|(p, enabled)| *p == path && *enabled)
            else {
                return false;
            };
            *enabled = false;
            for (package, dirs) in &mut state.packages {
                let candidate = path.join(package.name());
                // Index 0 is the built-in directory and never detaches.
                if let Some(pos) = dirs.iter().skip(1).position(|d| *d == candidate) {
                    dirs.remove(pos + 1);
                }
            }
        }
        self.purge(&path);
        self.translations.remove(&path.join(LOCALE_DIR));
        self.persist(&path, false);
        tracing::debug!("disabled location {}", path.display());
        true
    }

    /// Disable and forget a location; returns whether it was known.
    pub fn remove(&self, path: &Path) -> bool {
        let path = normalize(path);
        self.disable(&path);
        let removed = {
            let mut state = self.lock();
            let before = state.locations.len();
            state.locations.retain(|(p, _)| *p != path);
            before != state.locations.len()
        };
        if removed {
            self.forget(&path);
        }
        removed
    }

    /// Known locations: all, or only the enabled or disabled ones.
    #[must_use]
    pub fn get(&self, enabled: Option<bool>) -> Vec<PathBuf> {
        self.lock()
            .locations
            .iter()
            .filter(|(_, e)| enabled.is_none_or(|want| want == *e))
            .map(|(p, _)| p.clone())
            .collect()
    }

    /// Whether a location is known and enabled.
    #[must_use]
    pub fn is_enabled(&self, path: &Path) -> bool {
        let path = normalize(path);
        self.lock()
            .locations
            .iter()
            .any(|(p, e)| *p == path && *e)
    }

    /// Drop every module contributed by any location from the module cache.
    ///
    /// Locations stay attached; the next import reads them afresh.
    pub fn clear(&self) {
        for path in self.get(None) {
            self.purge(&path);
        }
    }

    fn purge(&self, path: &Path) {
        for package in Package::ALL {
            let content = packages::module_content(&path.join(package.name()));
            for name in packages::top_level(&content) {
                self.modules.purge_prefix(&package.qualify(name));
            }
        }
    }

    /// Directories of a package; index 0 is the built-in directory.
    #[must_use]
    pub fn package_paths(&self, package: Package) -> Vec<PathBuf> {
        self.lock()
            .packages
            .get(&package)
            .cloned()
            .unwrap_or_default()
    }

    /// Modules of a package; earlier directories shadow later ones.
    #[must_use]
    pub fn content(&self, package: Package) -> BTreeMap<String, PathBuf> {
        union_content(&self.package_paths(package))
    }

    /// Modules of a package as file records.
    #[must_use]
    pub fn files(&self, package: Package) -> Vec<FileRecord> {
        packages::file_records(&self.content(package))
    }

    /// Loaded-module cache shared with the loader.
    #[must_use]
    pub const fn modules(&self) -> &Arc<ModuleCache> {
        &self.modules
    }

    /// Translation cache receiving location catalogs.
    #[must_use]
    pub const fn translations(&self) -> &Arc<Translations> {
        &self.translations
    }
}

fn union_content(dirs: &[PathBuf]) -> BTreeMap<String, PathBuf> {
    let mut content = BTreeMap::new();
    for dir in dirs {
        for (name, path) in packages::module_content(dir) {
            content.entry(name).or_insert(path);
        }
    }
    content
}
