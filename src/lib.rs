//! Authoring and discovery substrate for tadek test automation.
//!
//! Users drop models, test steps, test cases and test suites into the
//! well-known subdirectories of one or more *locations*. This crate mounts
//! those locations into logical packages, resolves name conflicts, turns
//! dotted names into suite instances, and provides the layered
//! configuration and message translation the engine and agents consume.
//!
//! - **[`config`]**: layered INI store and the settings view over it
//! - **[`devices`]**: device registry backed by settings
//! - **[`locale`]**: gettext catalogs and lazy messages
//! - **[`locations`]**: location registry feeding [`packages`]
//! - **[`loader`]**: discovery and partial-failure loading of suites
//! - **[`model`]**: helpers that turn arguments into device events
//! - **[`global`]**: the default [`global::Context`]
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod constants;
pub mod devices;
pub mod error;
pub mod global;
pub mod loader;
pub mod locale;
pub mod locations;
pub mod logging;
pub mod model;
pub mod packages;
pub mod platform;
pub mod runner;
