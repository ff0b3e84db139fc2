//! Common test utilities for stagehand-extensions
//!
//! Builders for extension units and management configuration, plus a
//! small helper that applies actions to an in-memory installed state.

#![allow(dead_code)]

pub mod builders;
pub mod fixtures;

pub use builders::*;
pub use fixtures::*;
