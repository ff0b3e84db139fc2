//! # stagehand-core
//!
//! Core library for the stagehand deployment CLI providing:
//! - Project configuration parsing (`.shopware-project.yml`)
//! - Environment and run settings
//! - The shared error taxonomy
//! - A fixed-backoff retry helper

pub mod config;
pub mod error;
pub mod retry;
pub mod types;

pub use config::{LoadedProjectConfig, ProjectConfigLoader};
pub use error::{Error, Result};
