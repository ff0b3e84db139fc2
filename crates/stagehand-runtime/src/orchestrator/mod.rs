//! Deployment orchestration
//!
//! A run picks the install or the upgrade path based on the observed state,
//! surrounds it with the `pre`/`post` hooks and finishes with the post-deploy
//! steps. Every step is awaited before the next one starts, and the first
//! failure aborts the run.

mod install;
mod upgrade;

use std::sync::Arc;

use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use stagehand_core::types::{DeploymentEnvironment, HookPhase, ProjectConfig, RunConfiguration};
use stagehand_extensions::ExtensionKind;
use tracing::{debug, info};

use crate::account::StoreAccount;
use crate::hooks::HookExecutor;
use crate::ledger::TaskLedger;
use crate::lifecycle::{CatalogSource, LifecycleExecutor};
use crate::post_deploy::PostDeploySteps;
use crate::process::CommandRunner;
use crate::state::{PlatformState, UNKNOWN_VERSION};
use crate::system_config::ConfigStore;
use crate::tasks::OneTimeTaskRunner;

/// Injected collaborators of a deployment run
#[derive(Clone)]
pub struct Collaborators {
    pub runner: Arc<dyn CommandRunner>,
    pub state: Arc<dyn PlatformState>,
    pub config_store: Arc<dyn ConfigStore>,
    pub ledger: Arc<dyn TaskLedger>,
    pub account: Arc<dyn StoreAccount>,
    pub catalog: Arc<dyn CatalogSource>,
}

/// Which path a run took
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentOutcome {
    Installed { version: String },
    Upgraded { from: String, to: String },
}

impl DeploymentOutcome {
    pub fn is_install(&self) -> bool {
        matches!(self, DeploymentOutcome::Installed { .. })
    }
}

pub struct DeploymentOrchestrator {
    deps: Collaborators,
    project: ProjectConfig,
    env: DeploymentEnvironment,
    project_root: Utf8PathBuf,
}

impl DeploymentOrchestrator {
    pub fn new(
        deps: Collaborators,
        project: ProjectConfig,
        env: DeploymentEnvironment,
        project_root: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            deps,
            project,
            env,
            project_root: project_root.into(),
        }
    }

    pub fn project_root(&self) -> &Utf8Path {
        &self.project_root
    }

    /// Install or upgrade the shop, then run post-deploy steps
    pub async fn run(&self, run: &RunConfiguration) -> Result<DeploymentOutcome> {
        let install = self.should_install(run).await?;
        let hooks = self.hooks();

        hooks.execute(HookPhase::Pre).await?;

        let outcome = if install {
            self.install(run).await?
        } else {
            self.upgrade(run).await?
        };

        self.post_deploy().run().await?;
        hooks.execute(HookPhase::Post).await?;

        Ok(outcome)
    }

    async fn should_install(&self, run: &RunConfiguration) -> Result<bool> {
        if !self.deps.state.is_installed().await? {
            return Ok(true);
        }

        if run.force_reinstallation
            && self.deps.state.previous_version().await? == UNKNOWN_VERSION
        {
            info!("Forcing reinstallation: no deployed version is recorded");
            return Ok(true);
        }
        Ok(false)
    }

    fn hooks(&self) -> HookExecutor {
        HookExecutor::new(self.deps.runner.clone(), self.project.hooks.clone())
    }

    fn tasks(&self) -> OneTimeTaskRunner {
        OneTimeTaskRunner::new(
            self.deps.runner.clone(),
            self.deps.ledger.clone(),
            self.project.one_time_tasks.clone(),
        )
    }

    fn post_deploy(&self) -> PostDeploySteps {
        PostDeploySteps::new(
            self.deps.runner.clone(),
            self.deps.config_store.clone(),
            self.project_root.clone(),
        )
        .always_clear_cache(self.project.cache.always_clear)
        .usage_data_consent(self.env.usage_data_consent)
        .platform_sh(self.env.platform_sh.clone())
    }

    async fn console(&self, args: &[&str]) -> Result<()> {
        self.deps.runner.console(args).await
    }

    /// Plugin passes, account refresh, app passes
    async fn reconcile_extensions(&self, run: &RunConfiguration) -> Result<()> {
        let lifecycle = LifecycleExecutor::new(
            self.deps.runner.clone(),
            self.deps.catalog.clone(),
            self.deps.state.clone(),
            self.project.extension_management.clone(),
        )
        .with_skip_assets(run.skip_assets_install);

        lifecycle.reconcile(ExtensionKind::Plugin).await?;

        let domain = &self.project.store.license_domain;
        if domain.is_empty() {
            debug!("No license domain configured, skipping store account refresh");
        } else {
            let version = self.deps.state.current_version().await?;
            self.deps.account.refresh(&version, domain).await?;
        }

        lifecycle.reconcile(ExtensionKind::App).await
    }
}

/// Strip the trailing slash of a URL whose path is just `/`
pub fn normalize_sales_channel_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(parsed) if parsed.path() == "/" => raw.trim_end_matches('/').to_string(),
        _ => raw.to_string(),
    }
}
