//! Fluent builders for units and extension management configuration

use stagehand_core::types::{ExtensionManagementConfig, ExtensionOverride, OverrideState};
use stagehand_extensions::{ExtensionUnit, InstalledRecord, LifecycleAction};

/// Builder for [`ExtensionUnit`] fixtures
pub struct UnitBuilder {
    unit: ExtensionUnit,
}

impl UnitBuilder {
    pub fn new(name: &str) -> Self {
        let mut unit = ExtensionUnit::new(name, "1.0.0");
        unit.package_identifier = Some(package_of(name));
        Self { unit }
    }

    pub fn version(mut self, version: &str) -> Self {
        self.unit.version = version.to_string();
        self
    }

    pub fn upgrade_to(mut self, version: &str) -> Self {
        self.unit.upgrade_version = Some(version.to_string());
        self
    }

    pub fn installed(mut self) -> Self {
        self.unit.installed_at = Some("2024-01-01 00:00:00".to_string());
        self
    }

    pub fn active(mut self) -> Self {
        self.unit.installed_at = Some("2024-01-01 00:00:00".to_string());
        self.unit.active = true;
        self
    }

    pub fn requires(mut self, names: &[&str]) -> Self {
        self.unit.requires = names.iter().map(|n| package_of(n)).collect();
        self
    }

    pub fn build(self) -> ExtensionUnit {
        self.unit
    }
}

/// Composer package name used for a unit in fixtures
pub fn package_of(name: &str) -> String {
    format!("acme/{}", name.to_lowercase())
}

/// Builder for [`ExtensionManagementConfig`] fixtures
#[derive(Default)]
pub struct ManagementBuilder {
    config: ExtensionManagementConfig,
}

impl ManagementBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disabled(mut self) -> Self {
        self.config.enabled = false;
        self
    }

    pub fn ignore(mut self, name: &str) -> Self {
        self.config
            .overrides
            .insert(name.to_string(), ExtensionOverride::new(OverrideState::Ignore));
        self
    }

    pub fn inactive(mut self, name: &str) -> Self {
        self.config
            .overrides
            .insert(name.to_string(), ExtensionOverride::new(OverrideState::Inactive));
        self
    }

    pub fn remove(mut self, name: &str, keep_user_data: bool) -> Self {
        self.config
            .overrides
            .insert(name.to_string(), ExtensionOverride::remove(keep_user_data));
        self
    }

    pub fn force_update(mut self, name: &str) -> Self {
        self.config.force_updates.insert(name.to_string());
        self
    }

    pub fn build(self) -> ExtensionManagementConfig {
        self.config
    }
}

/// Apply actions to an installed state the way the platform would
pub fn apply(
    installed: &mut Vec<InstalledRecord>,
    catalog: &[ExtensionUnit],
    actions: &[LifecycleAction],
) {
    let version_of = |name: &str| {
        catalog
            .iter()
            .find(|u| u.name == name)
            .map(|u| u.upgrade_version.clone().unwrap_or_else(|| u.version.clone()))
            .unwrap_or_else(|| "0.0.0".to_string())
    };

    for action in actions {
        match action {
            LifecycleAction::Install { name, activate } => {
                installed.push(InstalledRecord::new(
                    name.as_str(),
                    version_of(name.as_str()),
                    *activate,
                ));
            }
            LifecycleAction::Activate { name } => {
                if let Some(r) = installed.iter_mut().find(|r| &r.name == name) {
                    r.active = true;
                }
            }
            LifecycleAction::Update { name, .. } => {
                if let Some(r) = installed.iter_mut().find(|r| &r.name == name) {
                    r.version = version_of(name.as_str());
                }
            }
            LifecycleAction::Refresh => {
                for r in installed.iter_mut() {
                    r.version = version_of(r.name.as_str());
                }
            }
            LifecycleAction::Deactivate { name } => {
                if let Some(r) = installed.iter_mut().find(|r| &r.name == name) {
                    r.active = false;
                }
            }
            LifecycleAction::Remove { name, .. } => installed.retain(|r| &r.name != name),
        }
    }
}
