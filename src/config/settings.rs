//! Typed, user-facing view over the configuration store.
//!
//! A section is a *setting* iff it carries [`META_OPTION`] set to
//! [`META_VALUE`]. Sections without the marker stay visible to
//! [`ConfigStore`] but are hidden here, which lets internal state share a
//! file with user-editable settings. Every write made through this view
//! stamps the marker.
use std::fmt;
use std::sync::Arc;

use super::ConfigStore;
use super::value::{ToConfigValue, parse_bool, parse_int, parse_list};
use crate::error::ConfigError;

/// Reserved option that marks a section as a setting.
pub const META_OPTION: &str = "__tadek_meta__";

/// Reserved value of [`META_OPTION`].
pub const META_VALUE: &str = "__setting__";

/// Settings view over a shared [`ConfigStore`].
#[derive(Debug, Clone)]
pub struct Settings {
    store: Arc<ConfigStore>,
}

impl Settings {
    /// Wrap a store.
    #[must_use]
    pub const fn new(store: Arc<ConfigStore>) -> Self {
        Self { store }
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    fn is_setting(&self, name: &str, section: &str) -> bool {
        self.store.get(name, section, META_OPTION).as_deref() == Some(META_VALUE)
    }

    fn stamp(&self, name: &str, section: &str) -> Result<(), ConfigError> {
        if self.is_setting(name, section) {
            return Ok(());
        }
        self.store.set(name, section, META_OPTION, META_VALUE)
    }

    /// Whether the section can be read through this view.
    ///
    /// With `force`, an existing section without the marker is accepted and
    /// stamped on the way.
    fn accessible(&self, name: &str, section: &str, force: bool) -> bool {
        if !self.store.has_section(name, section) {
            return false;
        }
        if self.is_setting(name, section) {
            return true;
        }
        if force {
            if let Err(e) = self.stamp(name, section) {
                tracing::warn!("could not mark [{section}] in '{name}' as a setting: {e}");
            }
            return true;
        }
        false
    }

    /// Configuration names with at least one setting section.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.store
            .names()
            .into_iter()
            .filter(|name| !self.sections(name, false).is_empty())
            .collect()
    }

    /// Setting sections of a configuration; every section with `force`.
    #[must_use]
    pub fn sections(&self, name: &str, force: bool) -> Vec<String> {
        self.store
            .sections(name)
            .into_iter()
            .filter(|section| force || self.is_setting(name, section))
            .collect()
    }

    /// A setting section.
    #[must_use]
    pub fn section(&self, name: &str, section: &str, force: bool) -> Option<SettingSection> {
        self.accessible(name, section, force)
            .then(|| SettingSection::new(self.clone(), name, section))
    }

    /// Options of a setting section, marker excluded.
    #[must_use]
    pub fn options(&self, name: &str, section: &str, force: bool) -> Vec<SettingOption> {
        self.section(name, section, force)
            .map(|s| s.options())
            .unwrap_or_default()
    }

    /// One option of a setting section; `None` if either is missing.
    #[must_use]
    pub fn option(
        &self,
        name: &str,
        section: &str,
        option: &str,
        force: bool,
    ) -> Option<SettingOption> {
        if option == META_OPTION || !self.accessible(name, section, force) {
            return None;
        }
        self.store
            .get(name, section, option)
            .is_some()
            .then(|| SettingOption::new(self.clone(), name, section, option))
    }

    /// Create a setting section.
    ///
    /// # Errors
    ///
    /// Returns an error if the user file cannot be written.
    pub fn create_section(&self, name: &str, section: &str) -> Result<SettingSection, ConfigError> {
        self.store.create_section(name, section)?;
        self.stamp(name, section)?;
        Ok(SettingSection::new(self.clone(), name, section))
    }

    /// Store a value and mark the section as a setting.
    ///
    /// # Errors
    ///
    /// Returns an error if the user file cannot be written.
    pub fn set<V: ToConfigValue + ?Sized>(
        &self,
        name: &str,
        section: &str,
        option: &str,
        value: &V,
    ) -> Result<(), ConfigError> {
        self.store.set(name, section, option, value)?;
        self.stamp(name, section)
    }

    /// Remove an option from a setting section.
    ///
    /// # Errors
    ///
    /// Returns an error if the user file cannot be written.
    pub fn remove(&self, name: &str, section: &str, option: &str) -> Result<bool, ConfigError> {
        if option == META_OPTION || !self.is_setting(name, section) {
            return Ok(false);
        }
        self.store.remove_option(name, section, option)
    }

    /// Remove a whole setting section.
    ///
    /// # Errors
    ///
    /// Returns an error if the user file cannot be written.
    pub fn remove_section(&self, name: &str, section: &str) -> Result<bool, ConfigError> {
        if !self.is_setting(name, section) {
            return Ok(false);
        }
        self.store.remove_section(name, section)
    }
}

/// A setting section behaving like a mutable map of option name to value.
#[derive(Debug, Clone)]
pub struct SettingSection {
    settings: Settings,
    name: String,
    section: String,
}

impl SettingSection {
    fn new(settings: Settings, name: &str, section: &str) -> Self {
        Self {
            settings,
            name: name.to_string(),
            section: section.to_string(),
        }
    }

    /// Configuration name.
    #[must_use]
    pub fn config_name(&self) -> &str {
        &self.name
    }

    /// Section name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.section
    }

    /// Option names, marker excluded.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.settings
            .store
            .options(&self.name, &self.section)
            .into_iter()
            .filter(|o| o != META_OPTION)
            .collect()
    }

    /// Option objects, marker excluded.
    #[must_use]
    pub fn options(&self) -> Vec<SettingOption> {
        self.keys()
            .iter()
            .map(|key| self.get(key))
            .collect()
    }

    /// Number of options, marker excluded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys().len()
    }

    /// Whether the section has no options besides the marker.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }

    /// Whether `key` is set.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        key != META_OPTION && self.get(key).is_present()
    }

    /// The option object for `key`; absent options yield an empty stand-in.
    #[must_use]
    pub fn get(&self, key: &str) -> SettingOption {
        SettingOption::new(self.settings.clone(), &self.name, &self.section, key)
    }

    /// Write `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the user file cannot be written.
    pub fn set<V: ToConfigValue + ?Sized>(&self, key: &str, value: &V) -> Result<(), ConfigError> {
        self.settings.set(&self.name, &self.section, key, value)
    }

    /// Remove `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the user file cannot be written.
    pub fn remove(&self, key: &str) -> Result<bool, ConfigError> {
        self.settings.remove(&self.name, &self.section, key)
    }
}

/// One option of a setting section.
///
/// Reads are live: the value is looked up in the store on every call. Two
/// options are equal iff their raw values are equal, wherever they live.
#[derive(Debug, Clone)]
pub struct SettingOption {
    settings: Settings,
    name: String,
    section: String,
    option: String,
}

impl SettingOption {
    fn new(settings: Settings, name: &str, section: &str, option: &str) -> Self {
        Self {
            settings,
            name: name.to_string(),
            section: section.to_string(),
            option: option.to_string(),
        }
    }

    /// Option name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.option
    }

    /// Section name.
    #[must_use]
    pub fn section(&self) -> &str {
        &self.section
    }

    /// Raw value; `None` for an absent stand-in.
    #[must_use]
    pub fn get(&self) -> Option<String> {
        self.settings
            .store
            .get(&self.name, &self.section, &self.option)
    }

    /// Whether the option currently has a value.
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.get().is_some()
    }

    /// Integer value.
    #[must_use]
    pub fn get_int(&self) -> Option<i64> {
        self.get().as_deref().and_then(parse_int)
    }

    /// Boolean value.
    #[must_use]
    pub fn get_bool(&self) -> Option<bool> {
        self.get().as_deref().and_then(parse_bool)
    }

    /// List value.
    #[must_use]
    pub fn get_list(&self) -> Option<Vec<String>> {
        self.get().as_deref().map(parse_list)
    }

    /// Write a new value.
    ///
    /// # Errors
    ///
    /// Returns an error if the user file cannot be written.
    pub fn set<V: ToConfigValue + ?Sized>(&self, value: &V) -> Result<(), ConfigError> {
        self.settings
            .set(&self.name, &self.section, &self.option, value)
    }

    /// Remove the option.
    ///
    /// # Errors
    ///
    /// Returns an error if the user file cannot be written.
    pub fn remove(&self) -> Result<bool, ConfigError> {
        self.settings
            .remove(&self.name, &self.section, &self.option)
    }
}

impl fmt::Display for SettingOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.get().unwrap_or_default())
    }
}

impl PartialEq for SettingOption {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

impl PartialEq<str> for SettingOption {
    fn eq(&self, other: &str) -> bool {
        self.get().as_deref() == Some(other)
    }
}

impl PartialEq<&str> for SettingOption {
    fn eq(&self, other: &&str) -> bool {
        self.get().as_deref() == Some(*other)
    }
}
