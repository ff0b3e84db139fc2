//! Project configuration types (`.shopware-project.yml`)
//!
//! The file is keyed under a top-level `deployment:` mapping. Every section
//! is optional; a missing or empty file yields the defaults below.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::warn;

use crate::error::{Error, Result};

/// Root of the project configuration file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectConfigFile {
    #[serde(default)]
    pub deployment: Option<DeploymentSection>,
}

/// Raw `deployment:` section as written by users
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DeploymentSection {
    #[serde(default)]
    pub hooks: Hooks,

    #[serde(default)]
    pub extension_management: ExtensionManagementSection,

    #[serde(default)]
    pub maintenance: MaintenanceConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub one_time_tasks: Vec<OneTimeTask>,
}

/// Fully resolved project configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectConfig {
    pub hooks: Hooks,
    pub extension_management: ExtensionManagementConfig,
    pub maintenance: MaintenanceConfig,
    pub cache: CacheConfig,
    pub store: StoreConfig,
    /// One-time tasks in declaration order
    pub one_time_tasks: Vec<OneTimeTask>,
}

impl ProjectConfig {
    /// Build the resolved configuration from the raw file section
    pub fn from_section(section: DeploymentSection) -> Result<Self> {
        let mut seen = HashSet::new();
        for task in &section.one_time_tasks {
            if task.id.trim().is_empty() {
                return Err(Error::invalid_config("one-time task id must not be empty"));
            }
            if !seen.insert(task.id.as_str()) {
                return Err(Error::invalid_config(format!(
                    "one-time task id '{}' is declared more than once",
                    task.id
                )));
            }
        }

        Ok(Self {
            hooks: section.hooks,
            extension_management: section.extension_management.into(),
            maintenance: section.maintenance,
            cache: section.cache,
            store: section.store,
            one_time_tasks: section.one_time_tasks,
        })
    }

    /// Tasks declared for the given phase, in declaration order
    pub fn tasks_for(&self, phase: TaskPhase) -> impl Iterator<Item = &OneTimeTask> {
        self.one_time_tasks.iter().filter(move |t| t.when == phase)
    }
}

/// Hook scripts, one shell snippet per phase
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Hooks {
    #[serde(default)]
    pub pre: String,
    #[serde(default)]
    pub post: String,
    #[serde(default)]
    pub pre_install: String,
    #[serde(default)]
    pub post_install: String,
    #[serde(default)]
    pub pre_update: String,
    #[serde(default)]
    pub post_update: String,
}

impl Hooks {
    /// Script configured for a phase (empty when none)
    pub fn script(&self, phase: HookPhase) -> &str {
        match phase {
            HookPhase::Pre => &self.pre,
            HookPhase::Post => &self.post,
            HookPhase::PreInstall => &self.pre_install,
            HookPhase::PostInstall => &self.post_install,
            HookPhase::PreUpdate => &self.pre_update,
            HookPhase::PostUpdate => &self.post_update,
        }
    }
}

/// Points in a run at which a hook script may execute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    Pre,
    Post,
    PreInstall,
    PostInstall,
    PreUpdate,
    PostUpdate,
}

impl std::fmt::Display for HookPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            HookPhase::Pre => "pre",
            HookPhase::Post => "post",
            HookPhase::PreInstall => "pre-install",
            HookPhase::PostInstall => "post-install",
            HookPhase::PreUpdate => "pre-update",
            HookPhase::PostUpdate => "post-update",
        };
        write!(f, "{}", name)
    }
}

/// Per-extension lifecycle override state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideState {
    /// Never touched by the deployment
    Ignore,
    /// Installed but kept (or made) inactive
    Inactive,
    /// Uninstalled when present
    Remove,
}

/// Declarative per-extension policy entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionOverride {
    pub state: OverrideState,

    /// Only relevant with `state: remove`
    #[serde(default, rename = "keepUserData")]
    pub keep_user_data: bool,
}

impl ExtensionOverride {
    pub fn new(state: OverrideState) -> Self {
        Self {
            state,
            keep_user_data: false,
        }
    }

    pub fn remove(keep_user_data: bool) -> Self {
        Self {
            state: OverrideState::Remove,
            keep_user_data,
        }
    }
}

/// Raw `extension-management:` section
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExtensionManagementSection {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Shorthand for `state: ignore` overrides
    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(default)]
    pub force_update: Vec<String>,

    /// Deprecated spelling of `force-update`
    #[serde(default, rename = "forceUpdates")]
    pub force_updates_deprecated: Vec<String>,

    #[serde(default)]
    pub overrides: BTreeMap<String, ExtensionOverride>,
}

impl Default for ExtensionManagementSection {
    fn default() -> Self {
        Self {
            enabled: true,
            exclude: Vec::new(),
            force_update: Vec::new(),
            force_updates_deprecated: Vec::new(),
            overrides: BTreeMap::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Resolved extension management configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionManagementConfig {
    /// Global kill-switch for every managed lifecycle action
    pub enabled: bool,

    /// Extensions updated regardless of version comparison
    pub force_updates: BTreeSet<String>,

    pub overrides: BTreeMap<String, ExtensionOverride>,
}

impl Default for ExtensionManagementConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            force_updates: BTreeSet::new(),
            overrides: BTreeMap::new(),
        }
    }
}

impl ExtensionManagementConfig {
    /// Override entry for an extension, if any
    pub fn override_for(&self, name: &str) -> Option<&ExtensionOverride> {
        self.overrides.get(name)
    }
}

impl From<ExtensionManagementSection> for ExtensionManagementConfig {
    fn from(section: ExtensionManagementSection) -> Self {
        let mut overrides = BTreeMap::new();
        for name in section.exclude {
            overrides.insert(name, ExtensionOverride::new(OverrideState::Ignore));
        }
        // explicit overrides win over exclude
        overrides.extend(section.overrides);

        if !section.force_updates_deprecated.is_empty() {
            warn!(
                "The config key \"forceUpdates\" is deprecated, use \"force-update\" instead"
            );
        }

        let force_updates = section
            .force_update
            .into_iter()
            .chain(section.force_updates_deprecated)
            .collect();

        Self {
            enabled: section.enabled,
            force_updates,
            overrides,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub always_clear: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StoreConfig {
    /// Empty means no license/account refresh
    #[serde(default)]
    pub license_domain: String,
}

/// When a one-time task runs relative to the upgrade body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPhase {
    #[serde(alias = "before")]
    First,
    #[default]
    #[serde(alias = "after")]
    Last,
}

impl std::fmt::Display for TaskPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskPhase::First => write!(f, "first"),
            TaskPhase::Last => write!(f, "last"),
        }
    }
}

/// Idempotent one-shot script keyed by id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneTimeTask {
    pub id: String,
    pub script: String,
    #[serde(default)]
    pub when: TaskPhase,
}

impl OneTimeTask {
    pub fn new(id: impl Into<String>, script: impl Into<String>, when: TaskPhase) -> Self {
        Self {
            id: id.into(),
            script: script.into(),
            when,
        }
    }
}
