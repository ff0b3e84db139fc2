//! Per-extension lifecycle permissions derived from project configuration

use stagehand_core::types::{ExtensionManagementConfig, OverrideState};

/// Answers what the deployment may do with a named extension
#[derive(Debug, Clone, Copy)]
pub struct ExtensionPolicy<'a> {
    config: &'a ExtensionManagementConfig,
}

impl<'a> ExtensionPolicy<'a> {
    pub fn new(config: &'a ExtensionManagementConfig) -> Self {
        Self { config }
    }

    /// Whether extension management is enabled at all
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn state(&self, name: &str) -> Option<OverrideState> {
        self.config.override_for(name).map(|o| o.state)
    }

    pub fn can_install(&self, name: &str) -> bool {
        if !self.config.enabled {
            return false;
        }

        !matches!(
            self.state(name),
            Some(OverrideState::Remove | OverrideState::Ignore)
        )
    }

    pub fn can_activate(&self, name: &str) -> bool {
        if !self.config.enabled {
            return false;
        }

        self.state(name).is_none()
    }

    pub fn can_deactivate(&self, name: &str) -> bool {
        self.config.enabled && self.state(name) == Some(OverrideState::Inactive)
    }

    pub fn can_remove(&self, name: &str) -> bool {
        self.config.enabled && self.state(name) == Some(OverrideState::Remove)
    }

    pub fn should_force_update(&self, name: &str) -> bool {
        self.config.enabled && self.config.force_updates.contains(name)
    }

    pub fn keep_user_data(&self, name: &str) -> bool {
        self.config
            .override_for(name)
            .map(|o| o.keep_user_data)
            .unwrap_or(false)
    }
}
