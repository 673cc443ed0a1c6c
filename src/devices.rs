//! Device registry: remote endpoints materialized from the `devices` settings.
//!
//! Each setting section under the [`DEVICES_CONFIG`] configuration describes
//! one device; its options become the device parameters. Devices are built
//! lazily by a [`DeviceFactory`] and cached by name until [`DeviceRegistry::reset`].
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use anyhow::{Context as _, Result};

use crate::config::settings::Settings;
use crate::config::value::{ToConfigValue, parse_bool, parse_int, parse_list};
use crate::constants::{MouseButton, MouseEventKind};
use crate::error::{ConfigError, DeviceError};
use crate::locale::LocaleSource;

/// Configuration name holding one setting section per device.
pub const DEVICES_CONFIG: &str = "devices";

/// Address used when a device does not configure one.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1";

/// Port used when a device does not configure one.
pub const DEFAULT_PORT: u16 = 8089;

/// Path of an accessible object: child indexes from the accessibility root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct AccessibilityPath(pub Vec<usize>);

impl AccessibilityPath {
    /// Path of the first accessibility root.
    #[must_use]
    pub fn root() -> Self {
        Self(vec![0])
    }

    /// Path of the `index`-th child of this path.
    #[must_use]
    pub fn child(&self, index: usize) -> Self {
        let mut path = self.0.clone();
        path.push(index);
        Self(path)
    }
}

impl fmt::Display for AccessibilityPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "/{}", parts.join("/"))
    }
}

/// Result of a command executed on a device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecResult {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Whether the command exited successfully.
    pub success: bool,
    /// Exit code, if the command ran to completion.
    pub code: Option<i32>,
}

/// Ordered device parameters, stored as raw configuration strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceParams(BTreeMap<String, String>);

impl DeviceParams {
    /// Create an empty parameter set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style [`DeviceParams::set`].
    #[must_use]
    pub fn with<V: ToConfigValue + ?Sized>(mut self, key: &str, value: &V) -> Self {
        self.set(key, value);
        self
    }

    /// Set a parameter.
    pub fn set<V: ToConfigValue + ?Sized>(&mut self, key: &str, value: &V) {
        self.0.insert(key.to_string(), value.to_config_value());
    }

    /// Remove a parameter.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Raw value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Integer value.
    #[must_use]
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(parse_int)
    }

    /// Boolean value.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(parse_bool)
    }

    /// List value.
    #[must_use]
    pub fn get_list(&self, key: &str) -> Option<Vec<String>> {
        self.get(key).map(parse_list)
    }

    /// The `address` parameter or [`DEFAULT_ADDRESS`].
    #[must_use]
    pub fn address(&self) -> &str {
        self.get("address").unwrap_or(DEFAULT_ADDRESS)
    }

    /// The `port` parameter or [`DEFAULT_PORT`].
    ///
    /// # Errors
    ///
    /// Returns an error if the port is set but not a valid TCP port.
    pub fn port(&self) -> Result<u16> {
        self.get("port").map_or(Ok(DEFAULT_PORT), |raw| {
            raw.trim()
                .parse()
                .with_context(|| format!("invalid port '{raw}'"))
        })
    }

    /// Parameters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DeviceParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A remote endpoint.
///
/// The wire protocol lives outside this crate; implementations forward the
/// event methods to the remote side.
pub trait Device: LocaleSource + Send + Sync + fmt::Debug {
    /// Registry name.
    fn name(&self) -> &str;

    /// Network address.
    fn address(&self) -> String;

    /// Network port.
    fn port(&self) -> u16;

    /// Snapshot of every parameter, including `address` and `port`.
    fn params(&self) -> DeviceParams;

    /// Update one parameter on the live device.
    fn set_param(&self, key: &str, value: &str);

    /// Send a mouse event relative to the accessible at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be delivered or is rejected.
    fn mouse_event(
        &self,
        path: &AccessibilityPath,
        x: i32,
        y: i32,
        button: MouseButton,
        event: MouseEventKind,
    ) -> Result<bool, DeviceError>;

    /// Send a key event with hardware modifier keycodes.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be delivered or is rejected.
    fn keyboard_event(
        &self,
        path: &AccessibilityPath,
        keysym: u32,
        modifiers: &[u32],
    ) -> Result<bool, DeviceError>;

    /// Run a shell command on the device.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be delivered.
    fn system_exec(&self, command: &str, wait: bool) -> Result<ExecResult, DeviceError>;

    /// Fetch a file from the device.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be delivered or the file is missing.
    fn get_file(&self, path: &str) -> Result<Vec<u8>, DeviceError>;

    /// Store a file on the device.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be delivered.
    fn put_file(&self, path: &str, data: &[u8]) -> Result<bool, DeviceError>;

    /// Call a protocol extension by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be delivered or the extension is unknown.
    fn extension(
        &self,
        name: &str,
        params: &DeviceParams,
    ) -> Result<BTreeMap<String, String>, DeviceError>;
}

/// The default device type: configuration only, no transport.
///
/// Useful for listing and editing devices; every wire operation fails with
/// [`DeviceError::NoTransport`].
#[derive(Debug)]
pub struct DeviceRecord {
    name: String,
    params: RwLock<DeviceParams>,
}

impl DeviceRecord {
    /// Validate the parameters and build the record.
    ///
    /// # Errors
    ///
    /// Returns an error if the `port` parameter is not a valid port.
    pub fn new(name: &str, params: &DeviceParams) -> Result<Self> {
        params
            .port()
            .with_context(|| format!("device '{name}'"))?;
        Ok(Self {
            name: name.to_string(),
            params: RwLock::new(params.clone()),
        })
    }

    fn read(&self) -> DeviceParams {
        self.params
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn no_transport<T>(&self, operation: &str) -> Result<T, DeviceError> {
        Err(DeviceError::NoTransport {
            device: self.name.clone(),
            operation: operation.to_string(),
        })
    }
}

impl LocaleSource for DeviceRecord {
    fn locale(&self) -> String {
        self.read().get("locale").unwrap_or_default().to_string()
    }
}

impl Device for DeviceRecord {
    fn name(&self) -> &str {
        &self.name
    }

    fn address(&self) -> String {
        self.read().address().to_string()
    }

    fn port(&self) -> u16 {
        self.read().port().unwrap_or(DEFAULT_PORT)
    }

    fn params(&self) -> DeviceParams {
        self.read()
    }

    fn set_param(&self, key: &str, value: &str) {
        self.params
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set(key, value);
    }

    fn mouse_event(
        &self,
        _path: &AccessibilityPath,
        _x: i32,
        _y: i32,
        _button: MouseButton,
        _event: MouseEventKind,
    ) -> Result<bool, DeviceError> {
        self.no_transport("mouse_event")
    }

    fn keyboard_event(
        &self,
        _path: &AccessibilityPath,
        _keysym: u32,
        _modifiers: &[u32],
    ) -> Result<bool, DeviceError> {
        self.no_transport("keyboard_event")
    }

    fn system_exec(&self, _command: &str, _wait: bool) -> Result<ExecResult, DeviceError> {
        self.no_transport("system_exec")
    }

    fn get_file(&self, _path: &str) -> Result<Vec<u8>, DeviceError> {
        self.no_transport("get_file")
    }

    fn put_file(&self, _path: &str, _data: &[u8]) -> Result<bool, DeviceError> {
        self.no_transport("put_file")
    }

    fn extension(
        &self,
        _name: &str,
        _params: &DeviceParams,
    ) -> Result<BTreeMap<String, String>, DeviceError> {
        self.no_transport("extension")
    }
}

/// Builds a device from its name and parameters.
pub type DeviceFactory =
    Arc<dyn Fn(&str, &DeviceParams) -> Result<Arc<dyn Device>> + Send + Sync>;

/// Factory producing [`DeviceRecord`]s.
#[must_use]
pub fn record_factory() -> DeviceFactory {
    Arc::new(|name: &str, params: &DeviceParams| -> Result<Arc<dyn Device>> {
        Ok(Arc::new(DeviceRecord::new(name, params)?))
    })
}

type DeviceMap = BTreeMap<String, Arc<dyn Device>>;

/// Process-wide cache of devices built from settings.
pub struct DeviceRegistry {
    settings: Settings,
    factory: DeviceFactory,
    cache: Mutex<Option<DeviceMap>>,
}

impl fmt::Debug for DeviceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceRegistry")
            .field("settings", &self.settings)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl DeviceRegistry {
    /// Create a registry with a cold cache.
    #[must_use]
    pub fn new(settings: Settings, factory: DeviceFactory) -> Self {
        Self {
            settings,
            factory,
            cache: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<DeviceMap>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn params_of(&self, name: &str) -> DeviceParams {
        self.settings
            .options(DEVICES_CONFIG, name, false)
            .into_iter()
            .filter_map(|o| Some((o.name().to_string(), o.get()?)))
            .collect()
    }

    fn build(&self, factory: &DeviceFactory) -> DeviceMap {
        let mut devices = DeviceMap::new();
        for name in self.settings.sections(DEVICES_CONFIG, false) {
            let params = self.params_of(&name);
            match factory(&name, &params) {
                Ok(device) => {
                    devices.insert(name, device);
                }
                Err(e) => tracing::debug!("dropping device '{name}': {e:#}"),
            }
        }
        tracing::debug!("loaded {} device(s)", devices.len());
        devices
    }

    fn with_devices<R>(&self, f: impl FnOnce(&mut DeviceMap) -> R) -> R {
        let mut cache = self.lock();
        let devices = cache.get_or_insert_with(|| self.build(&self.factory));
        f(devices)
    }

    /// Rebuild the cache from settings; `factory` overrides the default type.
    ///
    /// Devices whose construction fails are dropped.
    pub fn load(&self, factory: Option<&DeviceFactory>) {
        let devices = self.build(factory.unwrap_or(&self.factory));
        *self.lock() = Some(devices);
    }

    /// Whether the cache is cold.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.lock().is_some()
    }

    /// Every device, ordered by name.
    #[must_use]
    pub fn all(&self) -> Vec<Arc<dyn Device>> {
        self.with_devices(|devices| devices.values().cloned().collect())
    }

    /// Look a device up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Device>> {
        self.with_devices(|devices| devices.get(name).cloned())
    }

    /// Register a device, writing its settings; returns the existing device
    /// if the name is already known.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be written or the factory
    /// rejects the parameters (the section is removed again in that case).
    pub fn add(
        &self,
        name: &str,
        factory: Option<&DeviceFactory>,
        address: Option<&str>,
        port: Option<u16>,
        params: &DeviceParams,
    ) -> Result<Arc<dyn Device>> {
        if let Some(existing) = self.get(name) {
            return Ok(existing);
        }

        let mut all = params.clone();
        all.set("address", address.unwrap_or(DEFAULT_ADDRESS));
        all.set("port", &port.unwrap_or(DEFAULT_PORT));

        self.write_section(name, &all)?;
        let factory = factory.unwrap_or(&self.factory);
        let device = match factory(name, &all) {
            Ok(device) => device,
            Err(e) => {
                self.settings.remove_section(DEVICES_CONFIG, name)?;
                return Err(e.context(format!("creating device '{name}'")));
            }
        };
        self.with_devices(|devices| devices.insert(name.to_string(), Arc::clone(&device)));
        tracing::debug!("added device '{name}'");
        Ok(device)
    }

    fn write_section(&self, name: &str, params: &DeviceParams) -> Result<(), ConfigError> {
        let section = self.settings.create_section(DEVICES_CONFIG, name)?;
        for (key, value) in params.iter() {
            section.set(key, value)?;
        }
        Ok(())
    }

    /// Forget a device and delete its settings; returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be written.
    pub fn remove(&self, name: &str) -> Result<bool, ConfigError> {
        let cached = self.with_devices(|devices| devices.remove(name).is_some());
        let stored = self.settings.remove_section(DEVICES_CONFIG, name)?;
        Ok(cached || stored)
    }

    /// Write parameters through the settings and onto the live device.
    ///
    /// Returns `false` if the device is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be written.
    pub fn update(&self, name: &str, params: &DeviceParams) -> Result<bool, ConfigError> {
        let Some(device) = self.get(name) else {
            return Ok(false);
        };
        for (key, value) in params.iter() {
            self.settings.set(DEVICES_CONFIG, name, key, value)?;
            device.set_param(key, value);
        }
        Ok(true)
    }

    /// Invalidate the cache; the next access reloads from settings.
    pub fn reset(&self) {
        *self.lock() = None;
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ConfigStore;
    use crate::platform::Layout;

    fn registry() -> (tempfile::TempDir, DeviceRegistry) {
        let tmp = tempfile::tempdir().unwrap();
        let store = Arc::new(ConfigStore::new(Layout::from_root(tmp.path())));
        let registry = DeviceRegistry::new(Settings::new(store), record_factory());
        (tmp, registry)
    }

    #[test]
    fn add_uses_defaults() {
        let (_tmp, registry) = registry();
        let device = registry
            .add("desktop", None, None, None, &DeviceParams::new())
            .unwrap();
        assert_eq!(device.name(), "desktop");
        assert_eq!(device.address(), DEFAULT_ADDRESS);
        assert_eq!(device.port(), DEFAULT_PORT);
    }

    #[test]
    fn add_is_idempotent() {
        let (_tmp, registry) = registry();
        let first = registry
            .add("desktop", None, Some("10.0.0.1"), Some(9000), &DeviceParams::new())
            .unwrap();
        let second = registry
            .add("desktop", None, Some("10.0.0.2"), None, &DeviceParams::new())
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.address(), "10.0.0.1");
        assert_eq!(registry.all().len(), 1);
    }

    #[test]
    fn devices_reload_from_settings() {
        let (_tmp, registry) = registry();
        let params = DeviceParams::new().with("locale", "pl_PL");
        registry
            .add("phone", None, Some("10.0.0.9"), Some(9001), &params)
            .unwrap();
        registry.reset();
        assert!(!registry.is_loaded());
        let device = registry.get("phone").expect("device should reload");
        assert!(registry.is_loaded());
        assert_eq!(device.address(), "10.0.0.9");
        assert_eq!(device.port(), 9001);
        assert_eq!(device.locale(), "pl_PL");
    }

    #[test]
    fn invalid_devices_are_dropped() {
        let (_tmp, registry) = registry();
        registry
            .settings
            .set(DEVICES_CONFIG, "broken", "port", "not-a-port")
            .unwrap();
        registry
            .settings
            .set(DEVICES_CONFIG, "fine", "port", "1234")
            .unwrap();
        registry.load(None);
        let names: Vec<String> = registry.all().iter().map(|d| d.name().to_string()).collect();
        assert_eq!(names, ["fine"]);
    }

    #[test]
    fn unmarked_sections_are_not_devices() {
        let (_tmp, registry) = registry();
        registry
            .settings
            .store()
            .set(DEVICES_CONFIG, "hidden", "port", "1")
            .unwrap();
        assert!(registry.all().is_empty());
    }

    #[test]
    fn add_rejected_by_factory_leaves_no_section() {
        let (_tmp, registry) = registry();
        let failing: DeviceFactory =
            Arc::new(|_: &str, _: &DeviceParams| -> Result<Arc<dyn Device>> {
                anyhow::bail!("refused")
            });
        let result = registry.add("x", Some(&failing), None, None, &DeviceParams::new());
        assert!(result.is_err());
        assert!(registry.settings.sections(DEVICES_CONFIG, true).is_empty());
        assert!(registry.get("x").is_none());
    }

    #[test]
    fn update_writes_through() {
        let (_tmp, registry) = registry();
        let device = registry
            .add("desktop", None, None, None, &DeviceParams::new())
            .unwrap();
        let changes = DeviceParams::new().with("locale", "de_DE").with("port", &7000);
        assert!(registry.update("desktop", &changes).unwrap());
        assert_eq!(device.locale(), "de_DE");
        assert_eq!(device.port(), 7000);
        assert_eq!(
            registry
                .settings
                .store()
                .get_int(DEVICES_CONFIG, "desktop", "port"),
            Some(7000)
        );
        assert!(!registry.update("ghost", &changes).unwrap());
    }

    #[test]
    fn remove_deletes_settings() {
        let (_tmp, registry) = registry();
        registry
            .add("desktop", None, None, None, &DeviceParams::new())
            .unwrap();
        assert!(registry.remove("desktop").unwrap());
        assert!(registry.get("desktop").is_none());
        registry.reset();
        assert!(registry.get("desktop").is_none());
        assert!(!registry.remove("desktop").unwrap());
    }

    #[test]
    fn custom_factory_on_load() {
        let (_tmp, registry) = registry();
        registry
            .add("a", None, None, None, &DeviceParams::new())
            .unwrap();
        let tagged: DeviceFactory =
            Arc::new(|name: &str, params: &DeviceParams| -> Result<Arc<dyn Device>> {
                let params = params.clone().with("tag", "custom");
                Ok(Arc::new(DeviceRecord::new(name, &params)?))
            });
        registry.load(Some(&tagged));
        let device = registry.get("a").unwrap();
        assert_eq!(device.params().get("tag"), Some("custom"));
    }

    #[test]
    fn record_has_no_transport() {
        let record = DeviceRecord::new("d", &DeviceParams::new()).unwrap();
        let err = record.get_file("/etc/hosts").unwrap_err();
        assert!(matches!(err, DeviceError::NoTransport { .. }));
    }

    #[test]
    fn params_typed_readers() {
        let params = DeviceParams::new()
            .with("n", &3)
            .with("flag", &true)
            .with("items", &["a", "b"]);
        assert_eq!(params.get_int("n"), Some(3));
        assert_eq!(params.get_bool("flag"), Some(true));
        assert_eq!(params.get_list("items").unwrap(), ["a", "b"]);
        assert!(DeviceParams::new().with("port", "99999").port().is_err());
    }

    #[test]
    fn accessibility_path_display() {
        assert_eq!(AccessibilityPath::root().child(3).to_string(), "/0/3");
    }
}
