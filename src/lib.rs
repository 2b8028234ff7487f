//! taskdeck library.
//!
//! Exports the core components for testing and integration.

pub mod breakdown;
pub mod config;
pub mod db;
pub mod error;
pub mod generator;
pub mod hierarchy;
pub mod server;
pub mod types;
pub mod validate;
