//! CLI command handlers

pub mod config;
pub mod connect;
pub mod lobby;
