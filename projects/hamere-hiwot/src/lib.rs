/// Library crate entry point.
/// Exposes internal modules for integration tests.
/// Production binary uses src/main.rs.

pub mod api;
pub mod auth;
pub mod calendar;
pub mod config;
pub mod db;
pub mod error;
pub mod i18n;
pub mod metrics;
pub mod sheet;
