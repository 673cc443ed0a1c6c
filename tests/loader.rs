#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Integration tests for locations and the test loader.
//!
//! Suites are registered with the context's [`SuiteRegistry`]; the module
//! files created in temporary locations decide which modules exist.

mod common;

use anyhow::{Result, ensure};
use tadek_core::global::Context;
use tadek_core::loader::{ModuleDef, SuiteRegistry, TestSuite};
use tadek_core::packages::Package;

#[derive(Debug)]
struct Fixture {
    name: &'static str,
    cases: Vec<String>,
}

impl TestSuite for Fixture {
    fn name(&self) -> &str {
        self.name
    }

    fn cases(&self) -> Vec<String> {
        self.cases.clone()
    }

    fn run_case(&self, _case: &str) -> Result<()> {
        Ok(())
    }
}

/// A suite factory accepting only the listed cases as selectors.
fn suite(
    name: &'static str,
    known: &'static [&'static str],
) -> impl Fn(&[String]) -> Result<Box<dyn TestSuite>> + Send + Sync + 'static {
    move |selectors: &[String]| {
        for selector in selectors {
            ensure!(
                known.contains(&selector.as_str()),
                "{name} has no test case '{selector}'"
            );
        }
        let cases = if selectors.is_empty() {
            known.iter().map(ToString::to_string).collect()
        } else {
            selectors.to_vec()
        };
        Ok(Box::new(Fixture { name, cases }) as Box<dyn TestSuite>)
    }
}

fn register(suites: &SuiteRegistry) {
    suites.register(
        ModuleDef::new("suitespkg1.suitesmdl11")
            .suite("Suite111", suite("Suite111", &["case1111", "case1112", "case1113"]))
            .suite("Suite112", suite("Suite112", &["case1121"])),
    );
    suites.register(
        ModuleDef::new("suitespkg2.suitesmdl22")
            .suite("Suite221", suite("Suite221", &["case2211", "case2212"])),
    );
}

const SUITE_FILES: &[&str] = &[
    "testsuites/suitespkg1/mod.rs",
    "testsuites/suitespkg1/suitesmdl11.rs",
    "testsuites/suitespkg2/mod.rs",
    "testsuites/suitespkg2/suitesmdl22.rs",
];

fn setup(ctx: &common::IntegrationTestContext) -> Context {
    let context = ctx.context();
    register(context.suites());
    let loc = ctx.location("loc", SUITE_FILES);
    assert!(context.locations().add(&loc, true).unwrap().is_empty());
    context
}

fn names(tests: &[Box<dyn TestSuite>]) -> Vec<&str> {
    tests.iter().map(|t| t.name()).collect()
}

// ---------------------------------------------------------------------------
// Loading by name
// ---------------------------------------------------------------------------

#[test]
fn suite_and_case_names_yield_one_instance() {
    let ctx = common::IntegrationTestContext::new();
    let context = setup(&ctx);

    let (tests, errors) = context.loader().load_from_names(&[
        "suitespkg1.suitesmdl11.Suite111.case1111",
        "suitespkg1.suitesmdl11.Suite111.case1112",
    ]);
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    assert_eq!(names(&tests), ["Suite111"]);
    assert_eq!(tests[0].cases(), ["case1111", "case1112"]);
}

#[test]
fn unknown_case_fails_without_hiding_siblings() {
    let ctx = common::IntegrationTestContext::new();
    let context = setup(&ctx);

    let (tests, errors) = context.loader().load_from_names(&[
        "suitespkg1.suitesmdl11.Suite111.case1111",
        "suitespkg2.suitesmdl22.Suite221.case2213",
    ]);
    assert_eq!(names(&tests), ["Suite111"]);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].name().unwrap().ends_with("Suite221"));
    assert!(errors[0].traceback().contains("case2213"));
}

#[test]
fn covered_names_are_deduplicated() {
    let ctx = common::IntegrationTestContext::new();
    let context = setup(&ctx);

    let (dedup, _) = context
        .loader()
        .load_from_names(&["suitespkg1.suitesmdl11", "suitespkg1.suitesmdl11.Suite111"]);
    let (plain, _) = context.loader().load_from_names(&["suitespkg1.suitesmdl11"]);
    assert_eq!(names(&dedup), names(&plain));
    assert_eq!(names(&plain), ["Suite111", "Suite112"]);
}

#[test]
fn package_name_loads_every_module_below() {
    let ctx = common::IntegrationTestContext::new();
    let context = setup(&ctx);

    let (tests, errors) = context.loader().load_from_names(&["suitespkg2"]);
    assert!(errors.is_empty());
    assert_eq!(names(&tests), ["Suite221"]);
}

#[test]
fn no_names_load_everything() {
    let ctx = common::IntegrationTestContext::new();
    let context = setup(&ctx);

    let empty: [&str; 0] = [];
    let (tests, errors) = context.loader().load_from_names(&empty);
    assert!(errors.is_empty());
    assert_eq!(names(&tests), ["Suite221", "Suite111", "Suite112"]);
}

#[test]
fn unknown_module_is_reported() {
    let ctx = common::IntegrationTestContext::new();
    let context = setup(&ctx);

    let (tests, errors) = context.loader().load_from_names(&["nosuchpkg.mdl.Suite"]);
    assert!(tests.is_empty());
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].name(), Some("nosuchpkg.mdl.Suite"));
}

#[test]
fn tree_is_keyed_by_module_path() {
    let ctx = common::IntegrationTestContext::new();
    let context = setup(&ctx);

    let (tree, errors) = context.loader().load_tree(None);
    assert!(errors.is_empty());
    assert_eq!(tree.count(), 3);
    let node = tree.get("suitespkg1.suitesmdl11").unwrap();
    assert_eq!(node.suites.len(), 2);
    assert!(tree.get("suitespkg1").unwrap().suites.is_empty());
}

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

#[test]
fn conflicting_location_stays_disabled() {
    let ctx = common::IntegrationTestContext::new();
    let context = setup(&ctx);
    let other = ctx.location("other", &["testsuites/suitespkg1/mod.rs", "models/extra.rs"]);

    let errors = context.locations().add(&other, true).unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].name(), Some("testsuites.suitespkg1"));
    assert!(!context.locations().is_enabled(&other));
    assert!(context.locations().content(Package::Models).is_empty());
}

#[test]
fn disabled_location_drops_its_modules() {
    let ctx = common::IntegrationTestContext::new();
    let context = setup(&ctx);
    let loc = ctx.root_path().join("loc");

    assert_eq!(context.loader().discover().len(), 4);
    assert!(context.locations().disable(&loc));
    assert!(context.loader().discover().is_empty());

    let (tests, errors) = context.loader().load_from_names(&["suitespkg1"]);
    assert!(tests.is_empty());
    assert_eq!(errors.len(), 1);
}

#[test]
fn list_files_of_a_package() {
    let ctx = common::IntegrationTestContext::new();
    let context = setup(&ctx);

    let files = context.locations().files(Package::TestSuites);
    let listed: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        listed,
        [
            "suitespkg1",
            "suitespkg1.suitesmdl11",
            "suitespkg2",
            "suitespkg2.suitesmdl22"
        ]
    );
}
