//! Core module - shared infrastructure for the harness
//!
//! This module contains foundational types, configuration, and error handling
//! used throughout the crate.

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, HarnessConfig, PlanningConfig};
pub use error::{HarnessError, Result};
pub use types::*;
