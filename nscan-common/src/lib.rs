//! # NeuroScan Common Library
//!
//! Shared code for the NeuroScan diagnosis service including:
//! - Database initialization, models and record-store queries
//! - Error taxonomy
//! - Configuration loading and root folder resolution
//! - Shared secret management and display-URL signing

pub mod config;
pub mod db;
pub mod error;
pub mod signing;

pub use error::{Error, Result};
