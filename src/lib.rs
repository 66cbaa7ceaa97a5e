//! Checklist backend: accounts, bearer sessions and per-user checklists
//! whose items are replaced in bulk.

pub mod auth;
pub mod checklists;
pub mod config;
pub mod models;
pub mod server;
pub mod store;
