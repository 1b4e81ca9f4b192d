//! Suma: a minimal tabbed web browser shell.
//!
//! This library crate exposes all modules for use by the binaries and integration tests.

pub mod app;
pub mod config;
pub mod database;
pub mod host;
pub mod logging;
pub mod managers;
pub mod navigation;
pub mod platform;
pub mod rpc_handler;
pub mod services;
pub mod types;

#[cfg(feature = "gui")]
pub mod ui;
