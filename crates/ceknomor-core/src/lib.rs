#![deny(missing_docs)]
//! Ceknomor core library.
//!
//! Verification clients for the identity and SIM status services, batch
//! processing and report export.

/// Batch sources and the sequential batch runner.
pub mod batch;
/// Identity and SIM status clients.
pub mod clients;
/// Configuration management.
pub mod config;
/// Error taxonomy.
pub mod error;
/// Report rendering and staging.
pub mod export;
/// Requests, results and result sets.
pub mod model;
/// Utility functions.
pub mod utils;
