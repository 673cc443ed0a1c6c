// Shared helpers for integration tests.
//
// Provides a temporary installation root plus helpers to create locations
// and message catalogs, so each test runs against an isolated layout.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tadek_core::global::Context;
use tadek_core::locale::catalog::CatalogBuilder;
use tadek_core::platform::{Layout, PROJECT_NAME};

/// An isolated installation backed by a [`tempfile::TempDir`].
///
/// The directory is deleted when dropped.
pub struct IntegrationTestContext {
    /// Temporary directory holding the installation and any locations.
    pub root: tempfile::TempDir,
}

impl IntegrationTestContext {
    /// Create an empty installation.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        Self { root }
    }

    /// Path of the temporary directory.
    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    /// Layout collapsed into `{root}/install`.
    pub fn layout(&self) -> Layout {
        Layout::from_root(self.root_path().join("install"))
    }

    /// A fresh context over [`layout`](Self::layout), as a new process would see it.
    pub fn context(&self) -> Context {
        Context::new(self.layout())
    }

    /// Write a file under the installation's system configuration tree.
    pub fn write_system_config(&self, tier: &str, name: &str, content: &str) {
        let dir = self.layout().system_config_dir().join(tier);
        fs::create_dir_all(&dir).expect("create system config dir");
        fs::write(dir.join(format!("{name}.conf")), content).expect("write system config");
    }

    /// Create a location directory containing empty `files` (relative paths).
    pub fn location(&self, name: &str, files: &[&str]) -> PathBuf {
        let dir = self.root_path().join(name);
        fs::create_dir_all(&dir).expect("create location");
        for file in files {
            let path = dir.join(file);
            fs::create_dir_all(path.parent().expect("file has parent")).expect("create parent");
            fs::write(&path, "").expect("write module file");
        }
        dir
    }

    /// Write a catalog for `lang` into the `locale/` directory of `location`.
    pub fn catalog(&self, location: &Path, lang: &str, messages: &[(&str, &str)]) {
        let path = location
            .join("locale")
            .join(lang)
            .join("LC_MESSAGES")
            .join(format!("{PROJECT_NAME}.mo"));
        messages
            .iter()
            .fold(CatalogBuilder::new(), |builder, (id, text)| builder.message(id, text))
            .write(&path)
            .expect("write catalog");
    }
}
