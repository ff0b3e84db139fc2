//! App units from `manifest.xml` files

use std::collections::HashSet;
use std::fs;

use anyhow::{anyhow, Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::composer::ComposerRegistry;
use crate::types::ExtensionUnit;

/// Composer package type of installable apps
pub const APP_PACKAGE_TYPE: &str = "shopware-app";

const MANIFEST_FILE: &str = "manifest.xml";

/// Name and version read from an app manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppManifest {
    pub name: String,
    pub version: String,
}

/// Read `/manifest/meta/name` and `/manifest/meta/version`
pub fn parse_manifest(xml: &str) -> Result<AppManifest> {
    let doc = roxmltree::Document::parse(xml).context("Malformed manifest XML")?;

    let root = doc.root_element();
    if !root.has_tag_name("manifest") {
        return Err(anyhow!(
            "Root element is <{}>, expected <manifest>",
            root.tag_name().name()
        ));
    }

    let meta = root
        .children()
        .find(|n| n.has_tag_name("meta"))
        .ok_or_else(|| anyhow!("Manifest has no <meta> element"))?;

    let text_of = |tag: &str| -> Option<String> {
        meta.children()
            .find(|n| n.has_tag_name(tag))
            .and_then(|n| n.text())
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    };

    let name = text_of("name").ok_or_else(|| anyhow!("Manifest has no meta name"))?;
    let version = text_of("version").ok_or_else(|| anyhow!("Manifest has no meta version"))?;

    Ok(AppManifest { name, version })
}

/// Manifest files under `custom/apps`, at most one directory deep, sorted
pub fn filesystem_manifests(project_root: &Utf8Path) -> Vec<Utf8PathBuf> {
    let app_dir = project_root.join("custom").join("apps");
    if !app_dir.is_dir() {
        return Vec::new();
    }

    let mut files: Vec<Utf8PathBuf> = WalkDir::new(&app_dir)
        .max_depth(2)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", app_dir, e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == MANIFEST_FILE)
        .filter_map(|entry| Utf8PathBuf::try_from(entry.into_path()).ok())
        .collect();

    files.sort();
    files
}

/// Manifest files of composer-installed apps, in registry order
pub fn composer_manifests(registry: &ComposerRegistry) -> Vec<Utf8PathBuf> {
    registry
        .packages_by_type(APP_PACKAGE_TYPE)
        .filter_map(|package| registry.install_path(package))
        .map(|path| path.join(MANIFEST_FILE))
        .collect()
}

/// Load app units from the filesystem first, then from composer
///
/// Unreadable or incomplete manifests are skipped with a warning. Names are
/// unique; the first manifest seen for a name wins.
pub fn app_units(project_root: &Utf8Path, registry: &ComposerRegistry) -> Vec<ExtensionUnit> {
    let files = filesystem_manifests(project_root)
        .into_iter()
        .chain(composer_manifests(registry));

    let mut seen = HashSet::new();
    let mut units = Vec::new();
    for file in files {
        let manifest = fs::read_to_string(&file)
            .with_context(|| format!("Failed to read {}", file))
            .and_then(|xml| parse_manifest(&xml));

        match manifest {
            Ok(manifest) if !seen.insert(manifest.name.clone()) => {
                warn!("Ignoring duplicate app {} from {}", manifest.name, file);
            }
            Ok(manifest) => {
                debug!("App {} {} from {}", manifest.name, manifest.version, file);
                units.push(ExtensionUnit::new(manifest.name, manifest.version));
            }
            Err(e) => warn!("Skipping app manifest {}: {:#}", file, e),
        }
    }
    units
}
