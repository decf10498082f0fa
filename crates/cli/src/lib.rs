//! Mailvault library: configuration, logging and the HTTP front end
//!
//! The binary in `main.rs` wires these together; integration tests use the
//! dispatcher directly.

pub mod config;
pub mod dispatch;
pub mod logging;
pub mod server;
