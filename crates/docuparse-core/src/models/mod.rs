//! Data models for bills, verdicts and configuration.

pub mod bill;
pub mod config;
