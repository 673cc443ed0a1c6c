//! Test loader: from dotted names to instantiated suites.
//!
//! Loading never stops at the first problem. Every entry point returns the
//! suites it could build together with one [`ErrorRecord`] per failure, so a
//! broken module or an unknown case only costs its own suites.
//!
//! Before each load the loader asks [`Locations::clear`] to drop previously
//! imported user modules, so a re-run sees current definitions.
pub mod names;
pub mod registry;
pub mod tree;

use std::sync::Arc;

use crate::error::{ErrorRecord, ImportError};
use crate::locations::Locations;
use crate::packages::{self, Package};

pub use names::normalize_names;
pub use registry::{
    CaseResult, Member, Module, ModuleDef, SuiteClass, SuiteFactory, SuiteRegistry, TestSuite,
};
pub use tree::SuiteTree;

/// Suites that loaded and the failures met on the way.
pub type LoadResult = (Vec<Box<dyn TestSuite>>, Vec<ErrorRecord>);

/// What to load from a module.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Selection {
    All,
    Filters(Vec<String>),
}

/// Resolves dotted test names against the `testsuites` package.
#[derive(Debug, Clone)]
pub struct TestLoader {
    locations: Arc<Locations>,
    registry: Arc<SuiteRegistry>,
}

impl TestLoader {
    /// Create a loader over the given locations and suite definitions.
    #[must_use]
    pub const fn new(locations: Arc<Locations>, registry: Arc<SuiteRegistry>) -> Self {
        Self {
            locations,
            registry,
        }
    }

    /// The locations this loader reads.
    #[must_use]
    pub const fn locations(&self) -> &Arc<Locations> {
        &self.locations
    }

    /// See [`normalize_names`].
    #[must_use]
    pub fn normalize_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
        normalize_names(names)
    }

    /// Every module of the `testsuites` package, reverse-sorted so longer
    /// dotted names come before their parents.
    #[must_use]
    pub fn discover(&self) -> Vec<String> {
        let mut modules: Vec<String> = self
            .locations
            .content(Package::TestSuites)
            .into_keys()
            .collect();
        modules.sort_unstable_by(|a, b| b.cmp(a));
        modules
    }

    /// Import a module of the `testsuites` package.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::NotFound`] if no attached directory has the module.
    pub fn import(&self, module: &str) -> Result<Arc<Module>, ImportError> {
        let key = Package::TestSuites.qualify(module);
        let cache = self.locations.modules();
        if let Some(cached) = cache.get(&key) {
            return Ok(cached);
        }
        let paths = self.locations.package_paths(Package::TestSuites);
        let path = packages::find_module(&paths, module)
            .ok_or_else(|| ImportError::NotFound(key.clone()))?;
        let def = self
            .registry
            .module(module)
            .unwrap_or_else(|| Arc::new(ModuleDef::new(module)));
        tracing::debug!("imported {key} from {}", path.display());
        let loaded = Arc::new(Module {
            name: module.to_string(),
            path,
            def,
        });
        cache.insert(key, Arc::clone(&loaded));
        Ok(loaded)
    }

    /// Load suites from one module.
    ///
    /// Without filters every suite the module defines is built with no
    /// selectors. Each filter is `Suite` or `Suite.case...`; filters for the
    /// same suite are grouped and their remainders become case selectors.
    #[must_use]
    pub fn load_from_module<S: AsRef<str>>(&self, module: &str, filters: &[S]) -> LoadResult {
        let mut out: LoadResult = (Vec::new(), Vec::new());
        let loaded = match self.import(module) {
            Ok(loaded) => loaded,
            Err(e) => {
                out.1.push(ErrorRecord::new(&e).with("name", module));
                return out;
            }
        };

        if filters.is_empty() {
            for (attr, class) in loaded.def.own_suites() {
                instantiate(&mut out, format!("{module}.{attr}"), class, &[]);
            }
            return out;
        }

        let mut groups: Vec<(String, Vec<String>)> = Vec::new();
        for filter in filters {
            let filter = filter.as_ref();
            let (suite, rest) = filter
                .split_once('.')
                .map_or((filter, None), |(s, r)| (s, Some(r)));
            let index = match groups.iter().position(|(name, _)| name == suite) {
                Some(index) => index,
                None => {
                    groups.push((suite.to_string(), Vec::new()));
                    groups.len() - 1
                }
            };
            if let (Some(rest), Some((_, selectors))) = (rest, groups.get_mut(index)) {
                selectors.push(rest.to_string());
            }
        }

        for (suite, selectors) in groups {
            let qualified = format!("{module}.{suite}");
            let error = match loaded.def.get(&suite) {
                Some(Member::Suite(class)) if class.module() == module => {
                    instantiate(&mut out, qualified, class, &selectors);
                    continue;
                }
                Some(_) => ImportError::NotASuite {
                    module: module.to_string(),
                    attribute: suite,
                },
                None => ImportError::MissingAttribute {
                    module: module.to_string(),
                    attribute: suite,
                },
            };
            out.1.push(ErrorRecord::new(&error).with("name", qualified));
        }
        out
    }

    /// Load every suite matching `names`; no names loads everything.
    ///
    /// A name may address a package, a module, a suite or a case. Names
    /// that match no discovered module are still tried as modules so the
    /// failure is reported.
    #[must_use]
    pub fn load_from_names<S: AsRef<str>>(&self, names: &[S]) -> LoadResult {
        self.locations.clear();
        let mut pool = normalize_names(names);
        let everything = pool.is_empty();
        let mut selected: Vec<(String, Selection)> = Vec::new();

        for module in self.discover() {
            if everything {
                select(&mut selected, &module, None);
                continue;
            }
            if pool.is_empty() {
                break;
            }
            let prefix = format!("{module}.");
            let mut i = 0;
            while let Some(name) = pool.get(i) {
                if *name == module {
                    select(&mut selected, &module, None);
                    pool.remove(i);
                } else if let Some(rest) = name.strip_prefix(&prefix) {
                    select(&mut selected, &module, Some(rest));
                    pool.remove(i);
                } else {
                    if packages::is_within(&module, name) {
                        select(&mut selected, &module, None);
                    }
                    i += 1;
                }
            }
        }
        for name in pool {
            select(&mut selected, &name, None);
        }

        let mut tests = Vec::new();
        let mut errors = Vec::new();
        for (module, selection) in selected {
            let filters = match selection {
                Selection::All => Vec::new(),
                Selection::Filters(filters) => filters,
            };
            let (t, e) = self.load_from_module(&module, &filters);
            tests.extend(t);
            errors.extend(e);
        }
        tracing::debug!("loaded {} suite(s), {} error(s)", tests.len(), errors.len());
        (tests, errors)
    }

    /// Load suites into a tree keyed by module path.
    ///
    /// With a `name`, only modules related to it are loaded and the walk
    /// stops at the first module containing it. If nothing matched, the name
    /// is imported anyway to report why.
    #[must_use]
    pub fn load_tree(&self, name: Option<&str>) -> (SuiteTree, Vec<ErrorRecord>) {
        self.locations.clear();
        let name = name.map(|n| n.trim().trim_matches('.')).filter(|n| !n.is_empty());
        let mut tree = SuiteTree::new();
        let mut errors = Vec::new();
        let mut matched = false;

        for module in self.discover() {
            let mut filters = Vec::new();
            let mut contains = false;
            if let Some(name) = name {
                let prefix = format!("{module}.");
                if name == module {
                    contains = true;
                } else if let Some(rest) = name.strip_prefix(&prefix) {
                    filters.push(rest.to_string());
                    contains = true;
                } else if !packages::is_within(&module, name) {
                    continue;
                }
            }
            matched = true;
            let (tests, errs) = self.load_from_module(&module, &filters);
            if !tests.is_empty() {
                tree.node_mut(&module).suites.extend(tests);
            }
            errors.extend(errs);
            if contains {
                break;
            }
        }

        if let (Some(name), false) = (name, matched) {
            let empty: [&str; 0] = [];
            let (tests, errs) = self.load_from_module(name, &empty);
            if !tests.is_empty() {
                tree.node_mut(name).suites.extend(tests);
            }
            errors.extend(errs);
        }
        (tree, errors)
    }
}

/// Build one suite into `out`, or record why it failed.
fn instantiate(out: &mut LoadResult, qualified: String, class: &SuiteClass, selectors: &[String]) {
    match class.instantiate(selectors) {
        Ok(suite) => out.0.push(suite),
        Err(e) => out.1.push(ErrorRecord::from_error(&e).with("name", qualified)),
    }
}

/// Record that `module` should load everything, or one more filter.
fn select(selected: &mut Vec<(String, Selection)>, module: &str, filter: Option<&str>) {
    let entry = match selected.iter().position(|(m, _)| m == module) {
        Some(index) => selected.get_mut(index),
        None => {
            let initial = if filter.is_some() {
                Selection::Filters(Vec::new())
            } else {
                Selection::All
            };
            selected.push((module.to_string(), initial));
            selected.last_mut()
        }
    };
    let Some((_, selection)) = entry else {
        return;
    };
    match (filter, selection) {
        (None, selection) => *selection = Selection::All,
        (Some(filter), Selection::Filters(filters)) => filters.push(filter.to_string()),
        (Some(_), Selection::All) => {}
    }
}
