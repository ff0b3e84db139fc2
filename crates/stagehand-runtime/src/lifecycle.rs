//! Applies reconciliation passes through console commands

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use stagehand_core::types::ExtensionManagementConfig;
use stagehand_extensions::{
    installed_from_catalog, ExtensionInventory, ExtensionKind, ExtensionPolicy, ExtensionUnit,
    InstalledRecord, LifecycleAction, LifecycleReconciler, Pass, ReconcileStrategy,
};
use tracing::{debug, info};

use crate::process::CommandRunner;
use crate::state::PlatformState;

/// Fresh catalog of installable units for a kind
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn catalog(&self, kind: ExtensionKind) -> Result<Vec<ExtensionUnit>>;
}

/// [`CatalogSource`] reading `plugin:list --json` and app manifests
pub struct InventoryCatalog {
    inventory: ExtensionInventory,
    runner: Arc<dyn CommandRunner>,
}

impl InventoryCatalog {
    pub fn new(inventory: ExtensionInventory, runner: Arc<dyn CommandRunner>) -> Self {
        Self { inventory, runner }
    }
}

#[async_trait]
impl CatalogSource for InventoryCatalog {
    async fn catalog(&self, kind: ExtensionKind) -> Result<Vec<ExtensionUnit>> {
        match kind {
            ExtensionKind::Plugin => {
                let listing = self
                    .runner
                    .output(&["plugin:list", "--json"])
                    .await
                    .context("Failed to list plugins")?;
                self.inventory.plugins(&listing)
            }
            ExtensionKind::App => self.inventory.apps(),
        }
    }
}

/// Console arguments for one lifecycle action
pub fn command_for(kind: ExtensionKind, action: &LifecycleAction, skip_assets: bool) -> Vec<String> {
    let ns = kind.namespace();
    let cmd = |verb: &str| format!("{}:{}", ns, verb);

    let mut argv = match (kind, action) {
        (ExtensionKind::App, LifecycleAction::Install { name, activate }) => {
            let mut argv = vec![cmd("install"), name.clone()];
            if *activate {
                argv.push("--activate".into());
            }
            argv.push("--force".into());
            argv
        }
        (_, LifecycleAction::Install { name, activate }) => {
            let mut argv = vec![cmd("install"), name.clone()];
            if *activate {
                argv.push("--activate".into());
            }
            argv
        }
        (_, LifecycleAction::Activate { name }) => vec![cmd("activate"), name.clone()],
        (ExtensionKind::App, LifecycleAction::Update { name, .. }) => {
            vec![cmd("refresh"), "--force".into(), name.clone()]
        }
        (_, LifecycleAction::Update { name, .. }) => vec![cmd("update"), name.clone()],
        (ExtensionKind::App, LifecycleAction::Refresh) => vec![cmd("refresh"), "--force".into()],
        (_, LifecycleAction::Refresh) => vec![cmd("refresh")],
        (_, LifecycleAction::Deactivate { name }) => vec![cmd("deactivate"), name.clone()],
        (_, LifecycleAction::Remove {
            name,
            keep_user_data,
        }) => {
            let mut argv = vec![cmd("uninstall"), name.clone()];
            if *keep_user_data {
                argv.push("--keep-user-data".into());
            }
            argv
        }
    };

    if kind == ExtensionKind::Plugin && skip_assets {
        argv.push("--skip-asset-build".into());
    }
    argv
}

/// Runs the four reconciliation passes for a kind
pub struct LifecycleExecutor {
    runner: Arc<dyn CommandRunner>,
    catalog: Arc<dyn CatalogSource>,
    state: Arc<dyn PlatformState>,
    management: ExtensionManagementConfig,
    skip_assets: bool,
}

impl LifecycleExecutor {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        catalog: Arc<dyn CatalogSource>,
        state: Arc<dyn PlatformState>,
        management: ExtensionManagementConfig,
    ) -> Self {
        Self {
            runner,
            catalog,
            state,
            management,
            skip_assets: false,
        }
    }

    pub fn with_skip_assets(mut self, skip: bool) -> Self {
        self.skip_assets = skip;
        self
    }

    /// Install, update, deactivate, then remove
    ///
    /// The catalog is reloaded before every pass.
    pub async fn reconcile(&self, kind: ExtensionKind) -> Result<()> {
        for pass in Pass::ALL {
            self.run_pass(kind, pass).await?;
        }
        Ok(())
    }

    pub async fn run_pass(&self, kind: ExtensionKind, pass: Pass) -> Result<Vec<LifecycleAction>> {
        let catalog = self.catalog.catalog(kind).await?;
        let installed = self.installed(kind, &catalog).await?;

        let reconciler = LifecycleReconciler::new(
            ExtensionPolicy::new(&self.management),
            ReconcileStrategy::for_kind(kind),
        );
        let actions = reconciler.plan(pass, &catalog, &installed);
        debug!("{} {} pass: {} actions", kind, pass, actions.len());

        for action in &actions {
            info!("{}: {}", kind, action);
            let argv = command_for(kind, action, self.skip_assets);
            let args: Vec<&str> = argv.iter().map(String::as_str).collect();
            self.runner.console(&args).await?;
        }

        Ok(actions)
    }

    async fn installed(
        &self,
        kind: ExtensionKind,
        catalog: &[ExtensionUnit],
    ) -> Result<Vec<InstalledRecord>> {
        match kind {
            ExtensionKind::Plugin => Ok(installed_from_catalog(catalog)),
            ExtensionKind::App => self.state.installed_apps().await,
        }
    }
}
