//! Attendance sessions service.
//!
//! A faculty member opens a session for one subject and cohort, marks each student present,
//! absent or late, and closes it; closing snapshots the present and absent counts. Reports and
//! per-student histories read the records back with per-subject statistics.
//!
//! The HTTP surface lives in [`server`]; everything it does goes through
//! [`manager::AttendanceManager`].

use tracing_subscriber::{EnvFilter, fmt};

pub mod access;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod manager;
pub mod models;
pub mod roster;
pub mod schema;
pub mod server;
pub mod stats;

use crate::{config::Settings, error::AppResult, manager::AttendanceManager};

/// Installs the global `tracing` subscriber, filtered by `RUST_LOG`. Safe to call twice.
pub fn init_tracing() {
    let _ = fmt().with_env_filter(EnvFilter::from_default_env()).try_init();
}

/// Opens the manager for the configured database.
pub fn create_default_manager(settings: &Settings) -> AppResult<AttendanceManager> {
    AttendanceManager::open(&settings.database.url)
}
