//! Filesystem fixtures for inventory tests

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

/// Temporary project directory
pub struct ProjectFixture {
    _dir: TempDir,
    pub root: Utf8PathBuf,
}

impl ProjectFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("utf-8 temp dir");
        Self { _dir: dir, root }
    }

    /// Write a file relative to the project root, creating parents
    pub fn write(&self, relative: &str, content: &str) -> Utf8PathBuf {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, content).expect("write fixture");
        path
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}

/// Minimal app manifest
pub fn manifest_xml(name: &str, version: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<manifest>
    <meta>
        <name>{name}</name>
        <label>{name}</label>
        <version>{version}</version>
    </meta>
</manifest>
"#
    )
}

/// One `plugin:list --json` row
pub fn plugin_row(name: &str, composer: &str, installed: bool, active: bool) -> String {
    let installed_at = if installed {
        "\"2024-01-01 00:00:00\"".to_string()
    } else {
        "null".to_string()
    };
    format!(
        r#"{{"name": "{name}", "composerName": "{composer}", "path": "custom/plugins/{name}", "installedAt": {installed_at}, "version": "1.0.0", "upgradeVersion": null, "active": {active}}}"#
    )
}
