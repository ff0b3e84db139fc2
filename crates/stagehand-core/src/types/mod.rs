//! Type definitions for project configuration and run parameters

mod environment;
mod project_config;
mod run_config;

pub use environment::*;
pub use project_config::*;
pub use run_config::*;
