//! Upgrade path for an installed shop

use anyhow::Result;
use stagehand_core::types::{HookPhase, RunConfiguration, TaskPhase};
use tracing::info;

use super::{normalize_sales_channel_url, DeploymentOrchestrator, DeploymentOutcome};

const CACHE_POOLS: [&str; 3] = ["cache:pool:clear", "cache.http", "cache.object"];

impl DeploymentOrchestrator {
    pub(crate) async fn upgrade(&self, run: &RunConfiguration) -> Result<DeploymentOutcome> {
        let hooks = self.hooks();
        let tasks = self.tasks();
        let state = &self.deps.state;

        hooks.execute(HookPhase::PreUpdate).await?;

        tasks.execute(TaskPhase::First).await?;

        let snapshot = if self.project.maintenance.enabled {
            let snapshot = state.enable_maintenance_mode().await?;
            info!("Maintenance mode is enabled, clearing cache to make sure it is visible");
            self.console(&CACHE_POOLS).await?;
            Some(snapshot)
        } else {
            None
        };

        info!("Shopware is installed, running update tools");
        self.console(&["messenger:setup-transports"]).await?;

        let previous = state.previous_version().await?;
        let current = state.current_version().await?;
        if previous != current {
            info!("Updating Shopware from {} to {}", previous, current);
            let mut args = vec!["system:update:finish"];
            if run.skip_assets_install {
                args.push("--skip-asset-build");
            }
            self.console(&args).await?;
            state.set_version(&current).await?;
        }

        let storefront = state.is_storefront_capable().await?;

        if let Some(url) = &self.env.install.sales_channel_url {
            if storefront && !state.is_sales_channel_existing(url).await? {
                let url_arg = format!("--url={}", normalize_sales_channel_url(url));
                self.console(&["sales-channel:create:storefront", "--name=Storefront", url_arg.as_str()])
                    .await?;
            }
        }

        self.console(&["plugin:refresh"]).await?;
        if storefront {
            self.console(&["theme:refresh"]).await?;
        }
        self.console(&["scheduled-task:register"]).await?;
        self.console(&["messenger:stop-workers"]).await?;

        self.reconcile_extensions(run).await?;

        if !run.skip_theme_compile {
            self.console(&["theme:compile", "--active-only"]).await?;
        }

        tasks.execute(TaskPhase::Last).await?;

        hooks.execute(HookPhase::PostUpdate).await?;

        if let Some(snapshot) = snapshot {
            state.restore_maintenance_mode(&snapshot).await?;
            info!("Maintenance mode is disabled, clearing cache to make sure the storefront is visible again");
            self.console(&CACHE_POOLS).await?;
        }

        Ok(DeploymentOutcome::Upgraded {
            from: previous,
            to: current,
        })
    }
}
