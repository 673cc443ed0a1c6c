//! Layered configuration store.
//!
//! A configuration is identified by a bare name and lives in up to four
//! INI files, searched in this order:
//!
//! ```text
//! {user}/config/{program}/{name}.conf     <- writes land here
//! {system}/config/{program}/{name}.conf
//! {user}/config/common/{name}.conf
//! {system}/config/common/{name}.conf
//! ```
//!
//! Reads see the merge of every tier (earlier tiers win). Writes go to the
//! first user tier only and are persisted immediately.
pub mod ini;
pub mod settings;
pub mod value;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::ConfigError;
use crate::platform::{COMMON_DIR, CONFIG_EXTENSION, Layout};

use self::ini::IniDocument;
use self::value::{ToConfigValue, parse_bool, parse_int, parse_list};

/// One directory in the search order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tier {
    /// Directory holding `{name}.conf` files.
    pub dir: PathBuf,
    /// Whether the tier belongs to the user (writable) root.
    pub user: bool,
}

/// In-memory buffers of one configuration name.
#[derive(Debug, Clone)]
struct ConfigFile {
    /// Merge of every tier except the writable one.
    base: IniDocument,
    /// Content of the writable user file.
    write: IniDocument,
    /// `base` overlaid with `write`; what readers see.
    read: IniDocument,
    /// Path of the writable user file.
    path: PathBuf,
}

impl ConfigFile {
    fn refresh(&mut self) {
        let mut read = self.base.clone();
        read.merge(&self.write);
        self.read = read;
    }
}

#[derive(Debug, Default)]
struct State {
    program: Option<String>,
    tiers: Option<Vec<Tier>>,
    cache: BTreeMap<String, ConfigFile>,
}

/// The layered configuration store.
///
/// All methods take `&self`; the caches sit behind a mutex so one store can
/// be shared by the settings view, the device registry and the location
/// registry.
#[derive(Debug)]
pub struct ConfigStore {
    layout: Layout,
    state: Mutex<State>,
}

impl ConfigStore {
    /// Create a store rooted at `layout` with no program name.
    #[must_use]
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            state: Mutex::new(State::default()),
        }
    }

    /// The install layout this store reads from.
    #[must_use]
    pub const fn layout(&self) -> &Layout {
        &self.layout
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current program name, if any.
    #[must_use]
    pub fn program_name(&self) -> Option<String> {
        self.lock().program.clone()
    }

    /// Select the program subdirectory; evicts every cached configuration.
    ///
    /// User files of the previous program stay on disk.
    pub fn set_program_name(&self, name: Option<&str>) {
        let mut state = self.lock();
        state.program = name.filter(|n| !n.is_empty()).map(str::to_string);
        state.tiers = None;
        state.cache.clear();
        tracing::debug!("config program name set to {:?}", state.program);
    }

    /// The search tiers in priority order.
    #[must_use]
    pub fn tiers(&self) -> Vec<Tier> {
        let mut state = self.lock();
        let State { program, tiers, .. } = &mut *state;
        ensure_tiers(tiers, &self.layout, program.as_deref()).to_vec()
    }

    /// Cached buffers of `name`, loading them from disk on first access.
    fn file<'a>(&self, state: &'a mut State, name: &str) -> &'a mut ConfigFile {
        let State {
            program,
            tiers,
            cache,
        } = state;
        let tiers = ensure_tiers(tiers, &self.layout, program.as_deref());
        cache
            .entry(name.to_string())
            .or_insert_with(|| load_file(tiers, name))
    }

    /// Apply `edit` to a copy of the write buffer and persist it.
    ///
    /// The cached buffers only change once the user file has been written.
    fn modify<R>(
        &self,
        name: &str,
        edit: impl FnOnce(&mut IniDocument) -> R,
    ) -> Result<R, ConfigError> {
        let mut state = self.lock();
        let file = self.file(&mut state, name);
        let mut write = file.write.clone();
        let result = edit(&mut write);
        write.save(&file.path)?;
        file.write = write;
        file.refresh();
        Ok(result)
    }

    fn read<R>(&self, name: &str, view: impl FnOnce(&IniDocument) -> R) -> R {
        let mut state = self.lock();
        view(&self.file(&mut state, name).read)
    }

    /// Known configuration names: everything on disk plus everything created.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut state = self.lock();
        let mut found = Vec::new();
        let State { program, tiers, .. } = &mut *state;
        for tier in ensure_tiers(tiers, &self.layout, program.as_deref()) {
            let Ok(entries) = std::fs::read_dir(&tier.dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_file()
                    && path.extension().is_some_and(|e| e == CONFIG_EXTENSION)
                    && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
                {
                    found.push(stem.to_string());
                }
            }
        }
        for name in found {
            self.file(&mut state, &name);
        }
        state.cache.keys().cloned().collect()
    }

    /// Section names of a configuration.
    #[must_use]
    pub fn sections(&self, name: &str) -> Vec<String> {
        self.read(name, IniDocument::section_names)
    }

    /// Whether the configuration has the section.
    #[must_use]
    pub fn has_section(&self, name: &str, section: &str) -> bool {
        self.read(name, |doc| doc.section(section).is_some())
    }

    /// Option names of a section; empty if the section is missing.
    #[must_use]
    pub fn options(&self, name: &str, section: &str) -> Vec<String> {
        self.read(name, |doc| {
            doc.section(section)
                .map(|s| s.keys().map(str::to_string).collect())
                .unwrap_or_default()
        })
    }

    /// Raw value of an option.
    #[must_use]
    pub fn get(&self, name: &str, section: &str, option: &str) -> Option<String> {
        self.read(name, |doc| doc.get(section, option).map(str::to_string))
    }

    /// Raw value of an option or `default`.
    #[must_use]
    pub fn get_or(&self, name: &str, section: &str, option: &str, default: &str) -> String {
        self.get(name, section, option)
            .unwrap_or_else(|| default.to_string())
    }

    /// Integer value; `None` if missing or unparsable.
    #[must_use]
    pub fn get_int(&self, name: &str, section: &str, option: &str) -> Option<i64> {
        self.get(name, section, option).as_deref().and_then(parse_int)
    }

    /// Integer value or `default`.
    #[must_use]
    pub fn get_int_or(&self, name: &str, section: &str, option: &str, default: i64) -> i64 {
        self.get_int(name, section, option).unwrap_or(default)
    }

    /// Boolean value; `None` if missing or unparsable.
    #[must_use]
    pub fn get_bool(&self, name: &str, section: &str, option: &str) -> Option<bool> {
        self.get(name, section, option).as_deref().and_then(parse_bool)
    }

    /// Boolean value or `default`.
    #[must_use]
    pub fn get_bool_or(&self, name: &str, section: &str, option: &str, default: bool) -> bool {
        self.get_bool(name, section, option).unwrap_or(default)
    }

    /// List value; `None` if missing.
    #[must_use]
    pub fn get_list(&self, name: &str, section: &str, option: &str) -> Option<Vec<String>> {
        self.get(name, section, option).as_deref().map(parse_list)
    }

    /// List value or `default`.
    #[must_use]
    pub fn get_list_or(
        &self,
        name: &str,
        section: &str,
        option: &str,
        default: &[&str],
    ) -> Vec<String> {
        self.get_list(name, section, option)
            .unwrap_or_else(|| default.iter().map(|s| (*s).to_string()).collect())
    }

    /// Create the configuration's user file.
    ///
    /// # Errors
    ///
    /// Returns an error if the user file cannot be written.
    pub fn create(&self, name: &str) -> Result<(), ConfigError> {
        self.modify(name, |_| ())
    }

    /// Create a section.
    ///
    /// # Errors
    ///
    /// Returns an error if a name cannot be stored in INI syntax or the user
    /// file cannot be written.
    pub fn create_section(&self, name: &str, section: &str) -> Result<(), ConfigError> {
        check_name("section", section)?;
        self.modify(name, |doc| {
            doc.ensure_section(section);
        })
    }

    /// Create an option with an empty value unless it already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if a name cannot be stored in INI syntax or the user
    /// file cannot be written.
    pub fn create_option(&self, name: &str, section: &str, option: &str) -> Result<(), ConfigError> {
        check_name("section", section)?;
        check_name("option", option)?;
        let current = self.get(name, section, option);
        self.modify(name, |doc| {
            if doc.get(section, option).is_none() {
                doc.set(section, option, current.unwrap_or_default());
            }
        })
    }

    /// Store a value, creating the section as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if a name cannot be stored in INI syntax or the user
    /// file cannot be written.
    pub fn set<V: ToConfigValue + ?Sized>(
        &self,
        name: &str,
        section: &str,
        option: &str,
        value: &V,
    ) -> Result<(), ConfigError> {
        check_name("section", section)?;
        check_name("option", option)?;
        let raw = value.to_config_value();
        self.modify(name, |doc| doc.set(section, option, raw))
    }

    /// Remove an option from the user layer; returns whether it existed there.
    ///
    /// # Errors
    ///
    /// Returns an error if the user file cannot be written.
    pub fn remove_option(
        &self,
        name: &str,
        section: &str,
        option: &str,
    ) -> Result<bool, ConfigError> {
        self.modify(name, |doc| doc.remove_option(section, option))
    }

    /// Remove a section from the user layer; returns whether it existed there.
    ///
    /// # Errors
    ///
    /// Returns an error if the user file cannot be written.
    pub fn remove_section(&self, name: &str, section: &str) -> Result<bool, ConfigError> {
        self.modify(name, |doc| doc.remove_section(section))
    }

    /// Delete the user file and forget the cached configuration.
    ///
    /// Deletion is best-effort; returns whether anything was known.
    pub fn remove(&self, name: &str) -> bool {
        let mut state = self.lock();
        let path = self.file(&mut state, name).path.clone();
        let existed = path.exists();
        if existed && let Err(e) = std::fs::remove_file(&path) {
            tracing::debug!("could not remove {}: {e}", path.display());
        }
        state.cache.remove(name);
        existed
    }

    /// Merge an external INI file into the configuration and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` cannot be read or parsed, or the user file
    /// cannot be written.
    pub fn update(&self, name: &str, path: &Path) -> Result<(), ConfigError> {
        let incoming = IniDocument::load(path)?;
        self.modify(name, |doc| doc.merge(&incoming))
    }

    /// Forget every cached configuration; the next access re-reads disk.
    pub fn reload(&self) {
        let mut state = self.lock();
        state.cache.clear();
        state.tiers = None;
    }

    /// Delete the whole user configuration tree and reload.
    pub fn reset(&self) {
        let dir = self.layout.user_config_dir();
        if dir.exists()
            && let Err(e) = std::fs::remove_dir_all(&dir)
        {
            tracing::debug!("could not remove {}: {e}", dir.display());
        }
        self.reload();
    }

    /// Path of the writable user file for `name`.
    #[must_use]
    pub fn user_file(&self, name: &str) -> PathBuf {
        let mut state = self.lock();
        self.file(&mut state, name).path.clone()
    }
}

/// Reject names that would not read back as the same section or option.
fn check_name(kind: &'static str, name: &str) -> Result<(), ConfigError> {
    let delimiters: &[char] = if kind == "section" {
        &[']']
    } else {
        &['=', ':']
    };
    let valid = !name.is_empty()
        && name == name.trim()
        && !name.contains(['\n', '\r'])
        && !name.contains(delimiters)
        && !name.starts_with(['[', '#', ';']);
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidName {
            kind,
            name: name.to_string(),
        })
    }
}

/// Return the cached tiers, computing them (and creating user dirs) if cold.
fn ensure_tiers<'a>(
    slot: &'a mut Option<Vec<Tier>>,
    layout: &Layout,
    program: Option<&str>,
) -> &'a [Tier] {
    slot.get_or_insert_with(|| {
        let tiers = search_tiers(layout, program);
        for tier in tiers.iter().filter(|t| t.user) {
            create_user_dir(&tier.dir);
        }
        tiers
    })
}

/// Compute the search tiers for `program`.
fn search_tiers(layout: &Layout, program: Option<&str>) -> Vec<Tier> {
    let user = layout.user_config_dir();
    let system = layout.system_config_dir();
    let mut tiers = Vec::with_capacity(4);
    if let Some(program) = program {
        tiers.push(Tier {
            dir: user.join(program),
            user: true,
        });
        tiers.push(Tier {
            dir: system.join(program),
            user: false,
        });
    }
    tiers.push(Tier {
        dir: user.join(COMMON_DIR),
        user: true,
    });
    tiers.push(Tier {
        dir: system.join(COMMON_DIR),
        user: false,
    });
    tiers
}

/// Best-effort creation of a user tier directory with mode 0755.
fn create_user_dir(dir: &Path) {
    if dir.is_dir() {
        return;
    }
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt as _;
        builder.mode(0o755);
    }
    if let Err(e) = builder.create(dir) {
        tracing::debug!("could not create {}: {e}", dir.display());
    }
}

fn file_name(name: &str) -> String {
    format!("{name}.{CONFIG_EXTENSION}")
}

/// Read every tier of `name`; the first user tier becomes the write buffer.
fn load_file(tiers: &[Tier], name: &str) -> ConfigFile {
    let writable = tiers.iter().position(|t| t.user);
    let path = writable
        .and_then(|i| tiers.get(i))
        .map(|t| t.dir.join(file_name(name)))
        .unwrap_or_default();

    let mut base = IniDocument::new();
    let mut write = IniDocument::new();
    let mut loaded = 0;
    for (i, tier) in tiers.iter().enumerate().rev() {
        let file = tier.dir.join(file_name(name));
        if !file.is_file() {
            continue;
        }
        let doc = match IniDocument::load(&file) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!("skipping malformed config file: {e}");
                continue;
            }
        };
        loaded += 1;
        if Some(i) == writable {
            write = doc;
        } else {
            base.merge(&doc);
        }
    }
    tracing::debug!("loaded config '{name}' from {loaded} file(s)");

    let mut file = ConfigFile {
        read: IniDocument::new(),
        base,
        write,
        path,
    };
    file.refresh();
    file
}
