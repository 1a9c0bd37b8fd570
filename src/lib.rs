//! Access rules and turno payload reconciliation for the academic dashboards.

pub mod access;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod models;
pub mod reconcile;
pub mod report;
