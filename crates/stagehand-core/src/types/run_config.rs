//! Per-invocation run parameters

use std::time::Duration;

use crate::error::{Error, Result};

/// Default per-command timeout when neither flag nor environment sets one
pub const DEFAULT_TIMEOUT_SECS: f64 = 300.0;

/// Immutable parameters of one deployment run
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfiguration {
    /// Skip theme compilation (theme was compiled in CI)
    pub skip_theme_compile: bool,

    /// Skip asset installation (assets were copied in CI)
    pub skip_assets_install: bool,

    /// Maximum duration of each external command; `None` disables the limit
    pub timeout: Option<Duration>,

    /// Reinstall when the version baseline was never recorded
    pub force_reinstallation: bool,
}

impl Default for RunConfiguration {
    fn default() -> Self {
        Self {
            skip_theme_compile: false,
            skip_assets_install: false,
            timeout: Some(Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS)),
            force_reinstallation: false,
        }
    }
}

impl RunConfiguration {
    pub fn builder() -> RunConfigurationBuilder {
        RunConfigurationBuilder::default()
    }
}

/// Builder for [`RunConfiguration`]
#[derive(Debug, Default)]
pub struct RunConfigurationBuilder {
    config: RunConfiguration,
}

impl RunConfigurationBuilder {
    pub fn skip_theme_compile(mut self, skip: bool) -> Self {
        self.config.skip_theme_compile = skip;
        self
    }

    pub fn skip_assets_install(mut self, skip: bool) -> Self {
        self.config.skip_assets_install = skip;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn force_reinstallation(mut self, force: bool) -> Self {
        self.config.force_reinstallation = force;
        self
    }

    pub fn build(self) -> RunConfiguration {
        self.config
    }
}

/// Turn a timeout in seconds into an optional duration
///
/// Zero disables the limit; negative or non-numeric values are rejected.
pub fn parse_timeout(value: &str) -> Result<Option<Duration>> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
        return Ok(None);
    }

    let secs: f64 = trimmed.parse().map_err(|_| {
        Error::invalid_config(format!("timeout must be a number of seconds, got '{}'", value))
    })?;

    if !secs.is_finite() || secs < 0.0 {
        return Err(Error::invalid_config(
            "The timeout value must be a valid positive integer or float number",
        ));
    }

    if secs == 0.0 {
        return Ok(None);
    }

    Duration::try_from_secs_f64(secs)
        .map(Some)
        .map_err(|_| Error::invalid_config(format!("timeout of {} seconds is too large", value)))
}
