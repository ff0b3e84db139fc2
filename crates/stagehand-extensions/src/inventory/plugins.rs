//! Plugin units from the platform's `plugin:list --json` output

use std::fs;

use anyhow::{Context, Result};
use camino::Utf8Path;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::types::ExtensionUnit;

/// One row of `plugin:list --json`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginListEntry {
    pub name: String,

    #[serde(default)]
    pub composer_name: Option<String>,

    /// Plugin directory relative to the project root
    #[serde(default)]
    pub path: String,

    #[serde(default)]
    pub installed_at: Option<String>,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub upgrade_version: Option<String>,

    #[serde(default)]
    pub active: bool,
}

/// Parse the listing printed by `plugin:list --json`
pub fn parse_plugin_list(json: &str) -> Result<Vec<PluginListEntry>> {
    let trimmed = json.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(trimmed).context("Failed to parse plugin:list output")
}

/// Composer `require` keys of the plugin at `plugin_dir`
///
/// A missing or unreadable `composer.json` means no requirements.
pub fn read_requirements(plugin_dir: &Utf8Path) -> Vec<String> {
    let composer_json = plugin_dir.join("composer.json");
    let content = match fs::read_to_string(&composer_json) {
        Ok(content) => content,
        Err(_) => return Vec::new(),
    };

    match serde_json::from_str::<Value>(&content) {
        Ok(value) => value
            .get("require")
            .and_then(Value::as_object)
            .map(|require| require.keys().cloned().collect())
            .unwrap_or_default(),
        Err(e) => {
            warn!("Ignoring malformed {}: {}", composer_json, e);
            Vec::new()
        }
    }
}

/// Turn listing rows into units, reading requirements from disk
pub fn plugin_units(entries: Vec<PluginListEntry>, project_root: &Utf8Path) -> Vec<ExtensionUnit> {
    entries
        .into_iter()
        .map(|entry| {
            let requires = if entry.path.is_empty() {
                Vec::new()
            } else {
                read_requirements(&project_root.join(&entry.path))
            };
            debug!(
                "Plugin {} {} (installed: {}, active: {})",
                entry.name,
                entry.version,
                entry.installed_at.is_some(),
                entry.active
            );

            ExtensionUnit {
                name: entry.name,
                package_identifier: entry.composer_name.filter(|c| !c.is_empty()),
                version: entry.version,
                upgrade_version: entry.upgrade_version.filter(|v| !v.is_empty()),
                installed_at: entry.installed_at.filter(|v| !v.is_empty()),
                active: entry.active,
                requires,
            }
        })
        .collect()
}
