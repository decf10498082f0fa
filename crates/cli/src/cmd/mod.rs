//! CLI command implementations

pub mod config;
pub mod get;
pub mod head;
pub mod list;
pub mod plan;
pub mod put;
pub mod serve;
