//! First-time installation path

use anyhow::Result;
use stagehand_core::types::{HookPhase, RunConfiguration};
use tracing::{info, warn};

use super::{DeploymentOrchestrator, DeploymentOutcome};

impl DeploymentOrchestrator {
    pub(crate) async fn install(&self, run: &RunConfiguration) -> Result<DeploymentOutcome> {
        info!("Shopware is not installed, starting installation");
        let hooks = self.hooks();
        let state = &self.deps.state;
        let settings = &self.env.install;

        hooks.execute(HookPhase::PreInstall).await?;

        let locale = format!("--shop-locale={}", settings.locale);
        let currency = format!("--shop-currency={}", settings.currency);
        let mut args = vec![
            "system:install",
            "--create-database",
            locale.as_str(),
            currency.as_str(),
            "--force",
        ];
        if run.skip_theme_compile {
            args.push("--no-assign-theme");
        }
        if run.skip_assets_install {
            args.push("--skip-assets-install");
        }
        self.console(&args).await?;

        let password = format!("--password={}", settings.admin_password);
        self.console(&["user:create", settings.admin_username.as_str(), password.as_str()])
            .await?;

        self.console(&["messenger:setup-transports"]).await?;

        if state.is_storefront_capable().await? {
            state.remove_headless_sales_channels().await?;

            match settings.install_sales_channel_url() {
                Some(url) => {
                    if !state.is_sales_channel_existing(url).await? {
                        let url_arg = format!("--url={}", url);
                        self.console(&["sales-channel:create:storefront", "--name=Storefront", url_arg.as_str()])
                            .await?;
                    }
                }
                None => warn!("Neither SALES_CHANNEL_URL nor APP_URL is set, skipping storefront sales channel"),
            }

            let mut theme_args = vec!["theme:change", "--all", "Storefront"];
            if run.skip_theme_compile {
                theme_args.push("--no-compile");
            }
            self.console(&theme_args).await?;

            if run.skip_theme_compile {
                self.console(&["theme:dump"]).await?;
            }
        }

        state.disable_first_run_wizard().await?;
        let version = state.current_version().await?;
        state.set_version(&version).await?;

        self.console(&["plugin:refresh"]).await?;
        self.reconcile_extensions(run).await?;

        hooks.execute(HookPhase::PostInstall).await?;

        Ok(DeploymentOutcome::Installed { version })
    }
}
