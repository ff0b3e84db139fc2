//! Command implementations

pub mod one_time_task;
pub mod run;

use std::sync::Arc;

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use stagehand_core::config::discover_project_root;
use stagehand_core::retry::RetryPolicy;
use stagehand_core::types::{DeploymentEnvironment, ProjectConfig};
use stagehand_core::ProjectConfigLoader;
use stagehand_runtime::{Database, MysqlClient};
use tracing::debug;

/// Dotenv files read from the project root, first match wins per variable
const DOTENV_FILES: &[&str] = &[".env.local", ".env"];

/// Everything a command needs to know about the project it runs in
pub struct ProjectContext {
    pub root: Utf8PathBuf,
    pub env: DeploymentEnvironment,
    pub config: ProjectConfig,
}

impl ProjectContext {
    /// Locate the project, load its dotenv files and configuration
    pub fn load(explicit_config: Option<&Utf8Path>) -> Result<Self> {
        let root = discover_project_root()?;
        load_dotenv(&root)?;

        let env = DeploymentEnvironment::from_env()
            .context("Invalid deployment environment")?;

        let loaded = ProjectConfigLoader::new(root.clone())
            .with_explicit_path(explicit_config)
            .with_env()
            .load()?;
        match &loaded.source {
            Some(path) => debug!("Using project configuration {}", path),
            None => debug!("No project configuration found, using defaults"),
        }

        Ok(Self {
            root,
            env,
            config: loaded.config,
        })
    }

    /// Connect to the shop database, waiting for it to come up
    pub async fn connect_database(&self) -> Result<Arc<dyn Database>> {
        let settings = self
            .env
            .database
            .clone()
            .context("$DATABASE_URL is not set")?;

        let client = MysqlClient::connect(settings, &RetryPolicy::default()).await?;
        Ok(Arc::new(client))
    }
}

/// Load `.env.local` then `.env`; variables already set are never overwritten
fn load_dotenv(root: &Utf8Path) -> Result<()> {
    for name in DOTENV_FILES {
        let path = root.join(name);
        if !path.is_file() {
            continue;
        }
        dotenvy::from_path(&path).with_context(|| format!("Failed to load {}", path))?;
        debug!("Loaded environment from {}", path);
    }
    Ok(())
}
