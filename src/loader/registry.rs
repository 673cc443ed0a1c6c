//! Host-side registry of test suite definitions.
//!
//! Module files found under `testsuites/` decide which modules exist; the
//! registry supplies what each module defines. A module present on disk
//! but never registered imports as an empty module.
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Result;

/// Outcome of one test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseResult {
    /// Case name.
    pub case: String,
    /// Failure description, if the case failed.
    pub error: Option<String>,
}

impl CaseResult {
    /// Whether the case passed.
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.error.is_none()
    }
}

/// An instantiated test suite.
pub trait TestSuite: Send + fmt::Debug {
    /// Suite name.
    fn name(&self) -> &str;

    /// Names of the cases this instance will run.
    fn cases(&self) -> Vec<String>;

    /// Run one case.
    ///
    /// # Errors
    ///
    /// Returns an error if the case fails.
    fn run_case(&self, case: &str) -> Result<()>;

    /// Run every selected case in order.
    fn run(&self) -> Vec<CaseResult> {
        self.cases()
            .into_iter()
            .map(|case| {
                let error = self.run_case(&case).err().map(|e| format!("{e:#}"));
                CaseResult { case, error }
            })
            .collect()
    }
}

/// Builds a suite from positional case selectors.
pub type SuiteFactory = Arc<dyn Fn(&[String]) -> Result<Box<dyn TestSuite>> + Send + Sync>;

/// A suite type and the module that defines it.
#[derive(Clone)]
pub struct SuiteClass {
    name: String,
    module: String,
    factory: SuiteFactory,
}

impl fmt::Debug for SuiteClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuiteClass")
            .field("name", &self.name)
            .field("module", &self.module)
            .finish_non_exhaustive()
    }
}

impl SuiteClass {
    /// Declare a suite type defined in `module`.
    pub fn new<F>(name: &str, module: &str, factory: F) -> Self
    where
        F: Fn(&[String]) -> Result<Box<dyn TestSuite>> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            module: module.to_string(),
            factory: Arc::new(factory),
        }
    }

    /// Type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dotted name of the defining module.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Instantiate with case selectors; no selectors means every case.
    ///
    /// # Errors
    ///
    /// Returns whatever the factory rejects, typically an unknown case.
    pub fn instantiate(&self, selectors: &[String]) -> Result<Box<dyn TestSuite>> {
        (self.factory)(selectors)
    }
}

/// A module member.
#[derive(Debug, Clone)]
pub enum Member {
    /// A suite type, possibly re-exported from another module.
    Suite(SuiteClass),
    /// Anything else, described for diagnostics.
    Value(String),
}

/// What a module defines.
#[derive(Debug, Clone, Default)]
pub struct ModuleDef {
    name: String,
    members: BTreeMap<String, Member>,
}

impl ModuleDef {
    /// An empty module.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            members: BTreeMap::new(),
        }
    }

    /// Add a suite defined by this module under its own name.
    #[must_use]
    pub fn suite<F>(self, name: &str, factory: F) -> Self
    where
        F: Fn(&[String]) -> Result<Box<dyn TestSuite>> + Send + Sync + 'static,
    {
        let class = SuiteClass::new(name, &self.name, factory);
        self.member(name, Member::Suite(class))
    }

    /// Add an arbitrary member.
    #[must_use]
    pub fn member(mut self, attribute: &str, member: Member) -> Self {
        self.members.insert(attribute.to_string(), member);
        self
    }

    /// Dotted module name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// A member by attribute name.
    #[must_use]
    pub fn get(&self, attribute: &str) -> Option<&Member> {
        self.members.get(attribute)
    }

    /// Members in attribute order.
    pub fn members(&self) -> impl Iterator<Item = (&str, &Member)> {
        self.members.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Suite types defined by this module itself, in attribute order.
    pub fn own_suites(&self) -> impl Iterator<Item = (&str, &SuiteClass)> {
        self.members().filter_map(move |(attr, member)| match member {
            Member::Suite(class) if class.module() == self.name => Some((attr, class)),
            _ => None,
        })
    }
}

/// An imported module: its file and its definition.
#[derive(Debug)]
pub struct Module {
    /// Dotted name within `testsuites`.
    pub name: String,
    /// File the module was found at.
    pub path: PathBuf,
    /// Registered definition, empty if none was registered.
    pub def: Arc<ModuleDef>,
}

/// Module definitions registered by the host program.
#[derive(Debug, Default)]
pub struct SuiteRegistry {
    modules: Mutex<BTreeMap<String, Arc<ModuleDef>>>,
}

impl SuiteRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Arc<ModuleDef>>> {
        self.modules.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register (or replace) a module definition.
    pub fn register(&self, def: ModuleDef) {
        tracing::debug!("registered suite module '{}'", def.name());
        self.lock().insert(def.name().to_string(), Arc::new(def));
    }

    /// Definition of a module.
    #[must_use]
    pub fn module(&self, name: &str) -> Option<Arc<ModuleDef>> {
        self.lock().get(name).cloned()
    }

    /// Registered module names.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Flaky;

    impl TestSuite for Flaky {
        fn name(&self) -> &str {
            "Flaky"
        }

        fn cases(&self) -> Vec<String> {
            vec!["ok".to_string(), "broken".to_string()]
        }

        fn run_case(&self, case: &str) -> Result<()> {
            anyhow::ensure!(case == "ok", "case {case} failed");
            Ok(())
        }
    }

    fn flaky(_: &[String]) -> Result<Box<dyn TestSuite>> {
        Ok(Box::new(Flaky))
    }

    #[test]
    fn default_run_collects_case_results() {
        let results = Flaky.run();
        assert!(results[0].passed());
        assert_eq!(results[1].error.as_deref(), Some("case broken failed"));
    }

    #[test]
    fn own_suites_skip_reexports() {
        let foreign = SuiteClass::new("Other", "elsewhere", flaky);
        let def = ModuleDef::new("pkg.mdl")
            .suite("Flaky", flaky)
            .member("Other", Member::Suite(foreign))
            .member("helper", Member::Value("function".to_string()));
        let own: Vec<&str> = def.own_suites().map(|(attr, _)| attr).collect();
        assert_eq!(own, ["Flaky"]);
        assert!(def.get("helper").is_some());
    }

    #[test]
    fn registry_replaces_definitions() {
        let registry = SuiteRegistry::new();
        registry.register(ModuleDef::new("a"));
        registry.register(ModuleDef::new("a").suite("Flaky", flaky));
        assert_eq!(registry.names(), ["a"]);
        assert_eq!(registry.module("a").unwrap().own_suites().count(), 1);
        assert!(registry.module("b").is_none());
    }

    #[test]
    fn instantiate_calls_factory() {
        let class = SuiteClass::new("Flaky", "m", flaky);
        let suite = class.instantiate(&[]).unwrap();
        assert_eq!(suite.name(), "Flaky");
        assert_eq!(class.module(), "m");
    }
}
