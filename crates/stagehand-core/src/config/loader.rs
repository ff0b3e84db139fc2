//! Project configuration file discovery and parsing

use crate::error::{Error, Result};
use crate::types::{ProjectConfig, ProjectConfigFile};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tracing::debug;

/// Configuration file names to search for in the project root
pub const CONFIG_FILE_NAMES: &[&str] = &[".shopware-project.yml", ".shopware-project.yaml"];

/// Environment variable naming the configuration file
pub const CONFIG_FILE_ENV: &str = "SHOPWARE_PROJECT_CONFIG_FILE";

/// Environment variable overriding the store license domain
pub const LICENSE_DOMAIN_ENV: &str = "SHOPWARE_STORE_LICENSE_DOMAIN";

/// Environment variable pinning the project root
pub const PROJECT_ROOT_ENV: &str = "PROJECT_ROOT";

/// Loaded project configuration together with where it came from
#[derive(Debug, Clone)]
pub struct LoadedProjectConfig {
    /// The effective configuration
    pub config: ProjectConfig,

    /// File the configuration was read from, `None` when defaults were used
    pub source: Option<Utf8PathBuf>,
}

/// Layered project configuration loader
///
/// Sources, lowest to highest precedence:
/// 1. built-in defaults
/// 2. `.shopware-project.yml` / `.shopware-project.yaml` in the project root
/// 3. an explicitly given file (`--project-config`)
/// 4. `SHOPWARE_PROJECT_CONFIG_FILE`
///
/// Only one file is read. `SHOPWARE_STORE_LICENSE_DOMAIN` is applied on top.
#[derive(Debug, Clone)]
pub struct ProjectConfigLoader {
    project_root: Utf8PathBuf,
    explicit_path: Option<Utf8PathBuf>,
    env_path: Option<String>,
    license_domain: Option<String>,
}

impl ProjectConfigLoader {
    /// Create a loader rooted at the given project directory
    pub fn new(project_root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            explicit_path: None,
            env_path: None,
            license_domain: None,
        }
    }

    /// Use an explicitly requested configuration file
    pub fn with_explicit_path(mut self, path: Option<&Utf8Path>) -> Self {
        self.explicit_path = path.map(|p| p.to_owned());
        self
    }

    /// Pick up environment overrides from the process environment
    pub fn with_env(self) -> Self {
        self.with_lookup(|key| std::env::var(key).ok())
    }

    /// Pick up environment overrides through an arbitrary lookup
    pub fn with_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        self.env_path = lookup(CONFIG_FILE_ENV).filter(|v| !v.is_empty());
        self.license_domain = lookup(LICENSE_DOMAIN_ENV).filter(|v| !v.is_empty());
        self
    }

    /// The file that would be read, if any
    pub fn resolve_path(&self) -> Option<Utf8PathBuf> {
        if let Some(env_path) = &self.env_path {
            return Some(self.relative_to_root(Utf8Path::new(env_path)));
        }

        if let Some(explicit) = &self.explicit_path {
            return Some(self.relative_to_root(explicit));
        }

        CONFIG_FILE_NAMES
            .iter()
            .map(|name| self.project_root.join(name))
            .find(|path| path.is_file())
    }

    /// Load the effective configuration
    pub fn load(&self) -> Result<LoadedProjectConfig> {
        let path = self.resolve_path();

        let (mut config, source) = match path {
            Some(path) if path.is_file() => {
                let content = fs::read_to_string(&path)?;
                debug!("Loading project configuration from {}", path);
                (parse_project_config(&content)?, Some(path))
            }
            Some(path) => {
                debug!("Project configuration {} does not exist, using defaults", path);
                (ProjectConfig::default(), None)
            }
            None => {
                debug!("No project configuration found, using defaults");
                (ProjectConfig::default(), None)
            }
        };

        if let Some(domain) = &self.license_domain {
            config.store.license_domain = domain.clone();
        }

        Ok(LoadedProjectConfig { config, source })
    }

    fn relative_to_root(&self, path: &Utf8Path) -> Utf8PathBuf {
        if path.is_absolute() {
            path.to_owned()
        } else {
            self.project_root.join(path)
        }
    }
}

/// Parse YAML content into a project configuration
///
/// Empty documents and files without a `deployment` key yield defaults.
pub fn parse_project_config(content: &str) -> Result<ProjectConfig> {
    if content.trim().is_empty() {
        return Ok(ProjectConfig::default());
    }

    let file: Option<ProjectConfigFile> = serde_yaml_ng::from_str(content)?;
    match file.and_then(|f| f.deployment) {
        Some(section) => ProjectConfig::from_section(section),
        None => Ok(ProjectConfig::default()),
    }
}

/// Locate the project root
///
/// `PROJECT_ROOT` wins when set; otherwise the nearest ancestor of `start`
/// containing `bin/console` is used.
pub fn find_project_root(start: &Utf8Path, env_root: Option<&str>) -> Result<Utf8PathBuf> {
    if let Some(root) = env_root.filter(|r| !r.is_empty()) {
        return Ok(Utf8PathBuf::from(root));
    }

    let mut current = start;
    loop {
        if current.join("bin").join("console").is_file() {
            return Ok(current.to_owned());
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => break,
        }
    }

    Err(Error::ProjectRootNotFound {
        start: start.to_string(),
    })
}

/// Locate the project root from the current directory and environment
pub fn discover_project_root() -> Result<Utf8PathBuf> {
    let cwd = std::env::current_dir().map_err(Error::Io)?;
    let cwd = Utf8PathBuf::try_from(cwd)
        .map_err(|_| Error::invalid_config("Current directory path is not valid UTF-8"))?;

    find_project_root(&cwd, std::env::var(PROJECT_ROOT_ENV).ok().as_deref())
}
