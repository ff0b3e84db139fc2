//! Composer package registry (`vendor/composer/installed.json`, `composer.lock`)

use std::collections::BTreeMap;
use std::fs;

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use tracing::debug;

/// One installed composer package
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ComposerPackage {
    pub name: String,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub version_normalized: Option<String>,

    #[serde(default, rename = "type")]
    pub package_type: String,

    /// Relative to `vendor/composer`
    #[serde(default, rename = "install-path")]
    pub install_path: Option<String>,

    /// Object of replaced packages; PHP tooling may emit `[]` when empty
    #[serde(default)]
    pub replace: serde_json::Value,
}

impl ComposerPackage {
    /// Normalized version when available, the pretty version otherwise
    pub fn effective_version(&self) -> &str {
        self.version_normalized
            .as_deref()
            .filter(|v| !v.is_empty())
            .unwrap_or(&self.version)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum InstalledFile {
    V2 { packages: Vec<ComposerPackage> },
    V1(Vec<ComposerPackage>),
}

#[derive(Deserialize)]
struct LockFile {
    #[serde(default)]
    packages: Vec<ComposerPackage>,
}

/// Read-only view of the packages composer installed into a project
#[derive(Debug, Clone, Default)]
pub struct ComposerRegistry {
    vendor_composer_dir: Utf8PathBuf,
    packages: Vec<ComposerPackage>,
}

impl ComposerRegistry {
    /// Load `vendor/composer/installed.json`; a missing file is an empty registry
    pub fn load(project_root: &Utf8Path) -> Result<Self> {
        let vendor_composer_dir = project_root.join("vendor").join("composer");
        let installed = vendor_composer_dir.join("installed.json");

        if !installed.is_file() {
            debug!("No composer registry at {}", installed);
            return Ok(Self {
                vendor_composer_dir,
                packages: Vec::new(),
            });
        }

        let content = fs::read_to_string(&installed)
            .with_context(|| format!("Failed to read {}", installed))?;
        let packages = Self::parse_installed(&content)
            .with_context(|| format!("Failed to parse {}", installed))?;

        Ok(Self {
            vendor_composer_dir,
            packages,
        })
    }

    /// Build a registry from already parsed packages
    pub fn from_packages(project_root: &Utf8Path, packages: Vec<ComposerPackage>) -> Self {
        Self {
            vendor_composer_dir: project_root.join("vendor").join("composer"),
            packages,
        }
    }

    /// Parse both the composer 1 (array) and composer 2 (`packages`) layouts
    pub fn parse_installed(content: &str) -> Result<Vec<ComposerPackage>> {
        let file: InstalledFile = serde_json::from_str(content)?;
        Ok(match file {
            InstalledFile::V2 { packages } => packages,
            InstalledFile::V1(packages) => packages,
        })
    }

    pub fn packages(&self) -> &[ComposerPackage] {
        &self.packages
    }

    pub fn get(&self, name: &str) -> Option<&ComposerPackage> {
        self.packages.iter().find(|p| p.name == name)
    }

    pub fn is_installed(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Installed version of a package (normalized when known)
    pub fn version(&self, name: &str) -> Option<&str> {
        self.get(name).map(ComposerPackage::effective_version)
    }

    /// Packages of a given composer `type`, in registry order
    pub fn packages_by_type<'a>(
        &'a self,
        package_type: &'a str,
    ) -> impl Iterator<Item = &'a ComposerPackage> + 'a {
        self.packages
            .iter()
            .filter(move |p| p.package_type == package_type)
    }

    /// Absolute install directory of a package
    pub fn install_path(&self, package: &ComposerPackage) -> Option<Utf8PathBuf> {
        let rel = package.install_path.as_deref()?;
        let path = Utf8Path::new(rel);
        Some(if path.is_absolute() {
            path.to_owned()
        } else {
            self.vendor_composer_dir.join(path)
        })
    }
}

/// Alias table from `composer.lock` `replace` declarations
///
/// Maps each replaced package name to the package replacing it. A missing
/// lock file yields an empty table.
pub fn load_replace_aliases(project_root: &Utf8Path) -> Result<BTreeMap<String, String>> {
    let lock = project_root.join("composer.lock");
    if !lock.is_file() {
        return Ok(BTreeMap::new());
    }

    let content =
        fs::read_to_string(&lock).with_context(|| format!("Failed to read {}", lock))?;
    parse_replace_aliases(&content).with_context(|| format!("Failed to parse {}", lock))
}

pub fn parse_replace_aliases(content: &str) -> Result<BTreeMap<String, String>> {
    let lock: LockFile = serde_json::from_str(content)?;

    let mut aliases = BTreeMap::new();
    for package in lock.packages {
        if let Some(replaced) = package.replace.as_object() {
            for name in replaced.keys() {
                aliases.insert(name.clone(), package.name.clone());
            }
        }
    }
    Ok(aliases)
}
