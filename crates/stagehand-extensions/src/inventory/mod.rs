//! Extension inventory: what plugins and apps the project ships
//!
//! The inventory is rebuilt from its sources every time it is asked, so each
//! reconciliation pass sees the effect of the previous one.

mod apps;
mod composer;
mod plugins;

pub use apps::{
    app_units, composer_manifests, filesystem_manifests, parse_manifest, AppManifest,
    APP_PACKAGE_TYPE,
};
pub use composer::{
    load_replace_aliases, parse_replace_aliases, ComposerPackage, ComposerRegistry,
};
pub use plugins::{parse_plugin_list, plugin_units, read_requirements, PluginListEntry};

use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};

use crate::dependency::DependencyResolver;
use crate::types::ExtensionUnit;

/// Builds plugin and app catalogs for one project
#[derive(Debug, Clone)]
pub struct ExtensionInventory {
    project_root: Utf8PathBuf,
}

impl ExtensionInventory {
    pub fn new(project_root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
        }
    }

    pub fn project_root(&self) -> &Utf8Path {
        &self.project_root
    }

    /// Plugin catalog in dependency order
    ///
    /// `listing` is the raw output of `plugin:list --json`.
    pub fn plugins(&self, listing: &str) -> Result<Vec<ExtensionUnit>> {
        let entries = parse_plugin_list(listing)?;
        let units = plugin_units(entries, &self.project_root);
        let aliases = load_replace_aliases(&self.project_root)?;

        Ok(DependencyResolver::with_aliases(aliases).resolve(units)?)
    }

    /// App catalog: filesystem manifests first, then composer packages
    pub fn apps(&self) -> Result<Vec<ExtensionUnit>> {
        let registry = ComposerRegistry::load(&self.project_root)?;
        Ok(app_units(&self.project_root, &registry))
    }

    /// Installed composer packages of the project
    pub fn composer(&self) -> Result<ComposerRegistry> {
        ComposerRegistry::load(&self.project_root)
    }
}
