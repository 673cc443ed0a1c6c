#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Integration tests for catalogs contributed by locations.

mod common;

use tadek_core::locale::{lazy, lazy_plural};

#[test]
fn lazy_sum_translates_each_part() {
    let ctx = common::IntegrationTestContext::new();
    let context = ctx.context();
    let loc = ctx.location("polish", &[]);
    ctx.catalog(&loc, "pl_PL", &[("hello", "witaj"), ("stranger", "nieznajomy")]);
    context.locations().add(&loc, true).unwrap();

    let message = "*" + lazy("hello") + " " + lazy("stranger") + "!*";
    assert_eq!(
        message.translate(context.translations(), "pl_PL"),
        "*witaj nieznajomy!*"
    );
    assert_eq!(message.to_string(), "*hello stranger!*");
}

#[test]
fn neutral_locale_is_identity() {
    let ctx = common::IntegrationTestContext::new();
    let context = ctx.context();
    let loc = ctx.location("polish", &[]);
    ctx.catalog(&loc, "pl", &[("hello", "witaj")]);
    context.locations().add(&loc, true).unwrap();

    assert_eq!(context.gettext("hello", "C"), "hello");
    assert_eq!(context.gettext("hello", ""), "hello");
    assert_eq!(context.gettext("hello", "pl_PL.UTF-8"), "witaj");
}

#[test]
fn earlier_location_wins_until_removed() {
    let ctx = common::IntegrationTestContext::new();
    let context = ctx.context();
    let first = ctx.location("first", &[]);
    let second = ctx.location("second", &[]);
    ctx.catalog(&first, "pl", &[("hello", "cześć")]);
    ctx.catalog(&second, "pl", &[("hello", "witaj"), ("bye", "pa")]);
    context.locations().add(&first, true).unwrap();
    context.locations().add(&second, true).unwrap();

    assert_eq!(context.gettext("hello", "pl"), "cześć");
    assert_eq!(context.gettext("bye", "pl"), "pa");

    assert!(context.locations().remove(&first));
    assert_eq!(context.gettext("hello", "pl"), "witaj");
}

#[test]
fn builtin_catalog_comes_last() {
    let ctx = common::IntegrationTestContext::new();
    let context = ctx.context();
    ctx.catalog(&ctx.layout().data_dir, "pl", &[("hello", "dzień dobry"), ("yes", "tak")]);
    let loc = ctx.location("polish", &[]);
    ctx.catalog(&loc, "pl", &[("hello", "witaj")]);
    context.locations().add(&loc, true).unwrap();

    assert_eq!(context.gettext("hello", "pl"), "witaj");
    assert_eq!(context.gettext("yes", "pl"), "tak");
    assert_eq!(context.gettext("no", "pl"), "no");
}

#[test]
fn untranslated_plural_picks_by_count() {
    let ctx = common::IntegrationTestContext::new();
    let context = ctx.context();

    let one = lazy_plural("file", "files", 1);
    let many = lazy_plural("file", "files", 3);
    assert_eq!(one.translate(context.translations(), "pl"), "file");
    assert_eq!(many.translate(context.translations(), "pl"), "files");
}
