//! Process-wide default instances.
//!
//! [`Context`] wires one config store, settings view, device registry,
//! translation cache, location registry and loader over a [`Layout`]. Host
//! programs usually go through [`context()`], which builds the default
//! context lazily from [`Layout::detect`]; tests build their own.
use std::sync::{Arc, LazyLock};

use crate::config::ConfigStore;
use crate::config::settings::Settings;
use crate::devices::{DeviceFactory, DeviceRegistry, record_factory};
use crate::error::ErrorRecord;
use crate::loader::{SuiteRegistry, TestLoader};
use crate::locale::{LocaleSource, Translations};
use crate::locations::Locations;
use crate::platform::{Layout, PROJECT_NAME};

/// Every registry of one installation.
#[derive(Debug)]
pub struct Context {
    layout: Layout,
    store: Arc<ConfigStore>,
    settings: Settings,
    devices: DeviceRegistry,
    translations: Arc<Translations>,
    locations: Arc<Locations>,
    suites: Arc<SuiteRegistry>,
    loader: TestLoader,
}

impl Context {
    /// Build a context whose devices are plain [`DeviceRecord`](crate::devices::DeviceRecord)s.
    #[must_use]
    pub fn new(layout: Layout) -> Self {
        Self::with_device_factory(layout, record_factory())
    }

    /// Build a context with a custom device factory.
    #[must_use]
    pub fn with_device_factory(layout: Layout, factory: DeviceFactory) -> Self {
        let store = Arc::new(ConfigStore::new(layout.clone()));
        let settings = Settings::new(Arc::clone(&store));
        let devices = DeviceRegistry::new(settings.clone(), factory);
        let translations = Arc::new(Translations::new(PROJECT_NAME, layout.locale_dir()));
        let locations = Arc::new(
            Locations::new(&layout, Arc::clone(&translations)).with_store(Arc::clone(&store)),
        );
        let suites = Arc::new(SuiteRegistry::new());
        let loader = TestLoader::new(Arc::clone(&locations), Arc::clone(&suites));
        Self {
            layout,
            store,
            settings,
            devices,
            translations,
            locations,
            suites,
            loader,
        }
    }

    /// Install layout.
    #[must_use]
    pub const fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Layered config store.
    #[must_use]
    pub const fn config(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    /// Settings view over the store.
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Device registry.
    #[must_use]
    pub const fn devices(&self) -> &DeviceRegistry {
        &self.devices
    }

    /// Translation cache.
    #[must_use]
    pub const fn translations(&self) -> &Arc<Translations> {
        &self.translations
    }

    /// Location registry.
    #[must_use]
    pub const fn locations(&self) -> &Arc<Locations> {
        &self.locations
    }

    /// Suite definitions supplied by the host.
    #[must_use]
    pub const fn suites(&self) -> &Arc<SuiteRegistry> {
        &self.suites
    }

    /// Test loader.
    #[must_use]
    pub const fn loader(&self) -> &TestLoader {
        &self.loader
    }

    /// Set the program name, then restore persisted locations.
    ///
    /// Returns the attachment errors of locations that could not be enabled.
    pub fn start(&self, program: Option<&str>) -> Vec<ErrorRecord> {
        self.store.set_program_name(program);
        self.locations.restore()
    }

    /// Drop every cache so the next access re-reads disk.
    pub fn reload(&self) {
        self.store.reload();
        self.devices.reset();
        self.translations.reset();
        self.locations.modules().clear();
    }

    /// Translate through the context's catalogs.
    #[must_use]
    pub fn gettext<S: LocaleSource + ?Sized>(&self, message: &str, source: &S) -> String {
        self.translations.gettext(message, source)
    }
}

static DEFAULT: LazyLock<Context> = LazyLock::new(|| Context::new(Layout::detect()));

/// The default context.
#[must_use]
pub fn context() -> &'static Context {
    &DEFAULT
}

/// The default config store.
#[must_use]
pub fn config() -> &'static Arc<ConfigStore> {
    DEFAULT.config()
}

/// The default device registry.
#[must_use]
pub fn devices() -> &'static DeviceRegistry {
    DEFAULT.devices()
}

/// The default location registry.
#[must_use]
pub fn locations() -> &'static Arc<Locations> {
    DEFAULT.locations()
}

/// The default suite registry.
#[must_use]
pub fn suites() -> &'static Arc<SuiteRegistry> {
    DEFAULT.suites()
}

/// The default loader.
#[must_use]
pub fn loader() -> &'static TestLoader {
    DEFAULT.loader()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn start_restores_persisted_locations() {
        let tmp = tempfile::tempdir().unwrap();
        let loc = tmp.path().join("loc");
        fs::create_dir_all(loc.join("testsuites")).unwrap();
        fs::write(loc.join("testsuites").join("smoke.rs"), "").unwrap();

        let first = Context::new(Layout::from_root(tmp.path().join("install")));
        first.start(Some("prog"));
        assert!(first.locations().add(&loc, true).unwrap().is_empty());

        let second = Context::new(Layout::from_root(tmp.path().join("install")));
        assert!(second.start(Some("prog")).is_empty());
        assert_eq!(second.loader().discover(), ["smoke"]);
    }

    #[test]
    fn reload_clears_module_cache() {
        let tmp = tempfile::tempdir().unwrap();
        let loc = tmp.path().join("loc");
        fs::create_dir_all(loc.join("testsuites")).unwrap();
        fs::write(loc.join("testsuites").join("smoke.rs"), "").unwrap();
        let ctx = Context::new(Layout::from_root(tmp.path().join("install")));
        ctx.locations().add(&loc, true);
        ctx.loader().import("smoke").unwrap();
        assert_eq!(ctx.locations().modules().len(), 1);
        ctx.reload();
        assert!(ctx.locations().modules().is_empty());
    }
}
