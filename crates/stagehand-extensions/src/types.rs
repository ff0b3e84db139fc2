//! Extension units, observed state and lifecycle actions

use std::fmt;

use serde::{Deserialize, Serialize};

/// Plugin or app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionKind {
    Plugin,
    App,
}

impl ExtensionKind {
    /// Console command namespace (`plugin` / `app`)
    pub fn namespace(&self) -> &'static str {
        match self {
            ExtensionKind::Plugin => "plugin",
            ExtensionKind::App => "app",
        }
    }
}

impl fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.namespace())
    }
}

/// One installable plugin or app as seen by the current pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionUnit {
    /// Logical identifier, unique within a catalog
    pub name: String,

    /// Composer package name; only used for dependency edges
    pub package_identifier: Option<String>,

    /// Version available on disk
    pub version: String,

    /// Newer version offered by the source, if any
    pub upgrade_version: Option<String>,

    /// Installation marker; `None` means never installed
    pub installed_at: Option<String>,

    pub active: bool,

    /// Declared requirement identifiers (composer package names)
    pub requires: Vec<String>,
}

impl ExtensionUnit {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package_identifier: None,
            version: version.into(),
            upgrade_version: None,
            installed_at: None,
            active: false,
            requires: Vec::new(),
        }
    }

    pub fn is_installed(&self) -> bool {
        self.installed_at.is_some()
    }
}

/// Observed installed state of one extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledRecord {
    pub name: String,
    pub version: String,
    pub active: bool,
}

impl InstalledRecord {
    pub fn new(name: impl Into<String>, version: impl Into<String>, active: bool) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            active,
        }
    }
}

impl From<&ExtensionUnit> for InstalledRecord {
    fn from(unit: &ExtensionUnit) -> Self {
        Self {
            name: unit.name.clone(),
            version: unit.version.clone(),
            active: unit.active,
        }
    }
}

/// One lifecycle step the executor turns into a console command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum LifecycleAction {
    Install { name: String, activate: bool },
    Activate { name: String },
    Update { name: String, forced: bool },
    /// Refresh every unit of the kind at once
    Refresh,
    Deactivate { name: String },
    Remove { name: String, keep_user_data: bool },
}

impl LifecycleAction {
    /// Name of the targeted unit, `None` for bulk refresh
    pub fn target(&self) -> Option<&str> {
        match self {
            LifecycleAction::Install { name, .. }
            | LifecycleAction::Activate { name }
            | LifecycleAction::Update { name, .. }
            | LifecycleAction::Deactivate { name }
            | LifecycleAction::Remove { name, .. } => Some(name),
            LifecycleAction::Refresh => None,
        }
    }
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleAction::Install { name, activate } => {
                write!(f, "install {}", name)?;
                if *activate {
                    f.write_str(" (activate)")?;
                }
                Ok(())
            }
            LifecycleAction::Activate { name } => write!(f, "activate {}", name),
            LifecycleAction::Update { name, forced } => {
                write!(f, "update {}", name)?;
                if *forced {
                    f.write_str(" (forced)")?;
                }
                Ok(())
            }
            LifecycleAction::Refresh => f.write_str("refresh all"),
            LifecycleAction::Deactivate { name } => write!(f, "deactivate {}", name),
            LifecycleAction::Remove {
                name,
                keep_user_data,
            } => {
                write!(f, "remove {}", name)?;
                if *keep_user_data {
                    f.write_str(" (keep user data)")?;
                }
                Ok(())
            }
        }
    }
}

/// Reconciliation pass, executed in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pass {
    Install,
    Update,
    Deactivate,
    Remove,
}

impl Pass {
    /// All passes in execution order
    pub const ALL: [Pass; 4] = [Pass::Install, Pass::Update, Pass::Deactivate, Pass::Remove];
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Pass::Install => "install",
            Pass::Update => "update",
            Pass::Deactivate => "deactivate",
            Pass::Remove => "remove",
        };
        f.write_str(s)
    }
}
