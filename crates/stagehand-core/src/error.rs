//! Error types for stagehand-core

use thiserror::Error;

/// Result type alias using stagehand-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for stagehand
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration format or value
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Circular dependency between extensions
    #[error("Circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    /// External command exited unsuccessfully
    #[error("Execution of {command} failed ({status})")]
    CommandFailed { command: String, status: String },

    /// External command exceeded the configured timeout
    #[error("Execution of {command} timed out after {seconds}s")]
    CommandTimeout { command: String, seconds: u64 },

    /// Database query failure
    #[error("Database error: {message}")]
    Database { message: String },

    /// One-time task was already recorded in the ledger
    #[error("One-time task {id} has already been marked as executed")]
    TaskAlreadyMarked { id: String },

    /// One-time task is not present in the ledger
    #[error("One-time task {id} has not been marked as executed")]
    TaskNotMarked { id: String },

    /// No project root could be located
    #[error("Could not find project root (no bin/console above {start})")]
    ProjectRootNotFound { start: String },
}

impl Error {
    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a circular dependency error
    pub fn circular_dependency(cycle: impl Into<String>) -> Self {
        Self::CircularDependency {
            cycle: cycle.into(),
        }
    }

    /// Create a command failure error
    pub fn command_failed(command: impl Into<String>, status: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            status: status.into(),
        }
    }

    /// Create a command timeout error
    pub fn command_timeout(command: impl Into<String>, seconds: u64) -> Self {
        Self::CommandTimeout {
            command: command.into(),
            seconds,
        }
    }

    /// Create a database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Create a task-already-marked error
    pub fn task_already_marked(id: impl Into<String>) -> Self {
        Self::TaskAlreadyMarked { id: id.into() }
    }

    /// Create a task-not-marked error
    pub fn task_not_marked(id: impl Into<String>) -> Self {
        Self::TaskNotMarked { id: id.into() }
    }

    /// True for errors that abort a run before any mutating step
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig { .. }
                | Self::YamlParse(_)
                | Self::CircularDependency { .. }
        )
    }
}
