//! Steps run after either deployment path

use std::sync::Arc;

use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use stagehand_core::types::{PlatformShSettings, UsageDataConsent};
use tracing::info;

use crate::process::CommandRunner;
use crate::system_config::ConfigStore;

pub const USAGE_DATA_CONSENT_KEY: &str = "core.usageData.consentState";

/// Cache clearing, usage-data consent and hosting specific cleanup
pub struct PostDeploySteps {
    runner: Arc<dyn CommandRunner>,
    config: Arc<dyn ConfigStore>,
    project_root: Utf8PathBuf,
    always_clear_cache: bool,
    usage_data_consent: Option<UsageDataConsent>,
    platform_sh: PlatformShSettings,
}

impl PostDeploySteps {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        config: Arc<dyn ConfigStore>,
        project_root: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            runner,
            config,
            project_root: project_root.into(),
            always_clear_cache: false,
            usage_data_consent: None,
            platform_sh: PlatformShSettings::default(),
        }
    }

    pub fn always_clear_cache(mut self, enabled: bool) -> Self {
        self.always_clear_cache = enabled;
        self
    }

    pub fn usage_data_consent(mut self, consent: Option<UsageDataConsent>) -> Self {
        self.usage_data_consent = consent;
        self
    }

    pub fn platform_sh(mut self, settings: PlatformShSettings) -> Self {
        self.platform_sh = settings;
        self
    }

    pub async fn run(&self) -> Result<()> {
        if self.always_clear_cache {
            self.runner
                .console(&["cache:pool:clear", "cache.http", "cache.object"])
                .await?;
        }

        if let Some(consent) = self.usage_data_consent {
            self.config
                .set(USAGE_DATA_CONSENT_KEY, consent.as_str())
                .await?;
        }

        if self.platform_sh.detected {
            self.run_platform_sh().await?;
        }

        Ok(())
    }

    async fn run_platform_sh(&self) -> Result<()> {
        info!("Detected Platform.sh environment, running additional commands");

        // Local disk caches survive deploys and must be emptied by hand
        if self.platform_sh.local_cache {
            let cmd = stale_cache_command(&self.platform_sh, &self.project_root);
            self.runner.run("sh", &["-c", cmd.as_str()]).await?;
            self.runner.console(&["cache:clear"]).await?;
        }

        if cfg!(target_os = "linux") {
            self.runner
                .run("pkill", &["-f", "-USR2", "-u", "web", "php-fpm"])
                .await?;
        }
        Ok(())
    }
}

/// Shell command removing cached files of the current environment
pub fn stale_cache_command(settings: &PlatformShSettings, project_root: &Utf8Path) -> String {
    let cache_dir = settings
        .cache_dir
        .clone()
        .unwrap_or_else(|| project_root.join("var/cache").to_string());
    format!("rm -Rf {}/var/cache/{}_*/*.*", cache_dir, settings.app_env)
}
