//! Observed state of the Shopware installation

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use stagehand_extensions::inventory::ComposerRegistry;
use stagehand_extensions::InstalledRecord;
use tracing::debug;

use crate::database::Database;
use crate::system_config::ConfigStore;

/// Version reported when no baseline has been recorded
pub const UNKNOWN_VERSION: &str = "unknown";

/// System config key holding the deployed version baseline
pub const VERSION_KEY: &str = "deployment.version";

const STOREFRONT_TYPE_ID: &str = "8a243080f92e4c719546314b577cf82b";
const HEADLESS_TYPE_ID: &str = "f183ee5650cf4bdb8a774337575067a6";
const FIRST_RUN_WIZARD_KEY: &str = "core.frw.completedAt";
const FIRST_RUN_WIZARD_COMPLETED_AT: &str = "2021-01-01 00:00:00";

/// Maintenance flags of storefront sales channels before a forced enable
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaintenanceSnapshot {
    /// `(hex id, maintenance flag)` per sales channel
    pub channels: Vec<(String, String)>,
}

/// Queries and mutations on the shop the deployment targets
#[async_trait]
pub trait PlatformState: Send + Sync {
    async fn is_installed(&self) -> Result<bool>;

    /// Recorded baseline version or [`UNKNOWN_VERSION`]
    async fn previous_version(&self) -> Result<String>;

    /// Version of the installed Shopware packages
    async fn current_version(&self) -> Result<String>;

    async fn set_version(&self, version: &str) -> Result<()>;

    async fn is_storefront_capable(&self) -> Result<bool>;

    async fn is_sales_channel_existing(&self, url: &str) -> Result<bool>;

    async fn remove_headless_sales_channels(&self) -> Result<()>;

    async fn disable_first_run_wizard(&self) -> Result<()>;

    /// Put all storefront sales channels into maintenance, returning the prior flags
    async fn enable_maintenance_mode(&self) -> Result<MaintenanceSnapshot>;

    async fn restore_maintenance_mode(&self, snapshot: &MaintenanceSnapshot) -> Result<()>;

    /// Rows of the `app` table
    async fn installed_apps(&self) -> Result<Vec<InstalledRecord>>;

    /// Normalised server version such as `mysql-8.0.36` or `mariadb-10.11`
    async fn database_version(&self) -> Result<String>;
}

/// [`PlatformState`] backed by the shop database and the composer registry
pub struct ShopwareState {
    db: Arc<dyn Database>,
    config: Arc<dyn ConfigStore>,
    composer: ComposerRegistry,
}

impl ShopwareState {
    pub fn new(
        db: Arc<dyn Database>,
        config: Arc<dyn ConfigStore>,
        composer: ComposerRegistry,
    ) -> Self {
        Self {
            db,
            config,
            composer,
        }
    }
}

#[async_trait]
impl PlatformState for ShopwareState {
    async fn is_installed(&self) -> Result<bool> {
        self.db.schema_has_table("system_config").await
    }

    async fn previous_version(&self) -> Result<String> {
        Ok(self
            .config
            .get(VERSION_KEY)
            .await?
            .unwrap_or_else(|| UNKNOWN_VERSION.to_string()))
    }

    async fn current_version(&self) -> Result<String> {
        ["shopware/platform", "shopware/core"]
            .iter()
            .find_map(|name| self.composer.get(name))
            .map(|package| package.effective_version().to_string())
            .ok_or_else(|| anyhow!("Neither shopware/platform nor shopware/core is installed"))
    }

    async fn set_version(&self, version: &str) -> Result<()> {
        self.config.set(VERSION_KEY, version).await
    }

    async fn is_storefront_capable(&self) -> Result<bool> {
        Ok(self.composer.is_installed("shopware/storefront"))
    }

    async fn is_sales_channel_existing(&self, url: &str) -> Result<bool> {
        Ok(self
            .db
            .fetch_one(
                "SELECT LOWER(HEX(id)) FROM sales_channel_domain WHERE url = ?",
                &[url],
            )
            .await?
            .is_some())
    }

    async fn remove_headless_sales_channels(&self) -> Result<()> {
        self.db
            .execute(
                "DELETE FROM sales_channel WHERE type_id = UNHEX(?)",
                &[HEADLESS_TYPE_ID],
            )
            .await
    }

    async fn disable_first_run_wizard(&self) -> Result<()> {
        self.config
            .set(FIRST_RUN_WIZARD_KEY, FIRST_RUN_WIZARD_COMPLETED_AT)
            .await
    }

    async fn enable_maintenance_mode(&self) -> Result<MaintenanceSnapshot> {
        let rows = self
            .db
            .query(
                "SELECT LOWER(HEX(id)), CAST(maintenance AS CHAR) FROM sales_channel WHERE type_id = UNHEX(?)",
                &[STOREFRONT_TYPE_ID],
            )
            .await?;

        let channels = rows
            .into_iter()
            .filter_map(|row| {
                let mut cols = row.into_iter();
                let id = cols.next().flatten()?;
                let maintenance = cols.next().flatten().unwrap_or_else(|| "0".to_string());
                Some((id, maintenance))
            })
            .collect::<Vec<_>>();
        debug!("Saved maintenance flags of {} sales channels", channels.len());

        self.db
            .execute(
                "UPDATE sales_channel SET maintenance = 1 WHERE type_id = UNHEX(?)",
                &[STOREFRONT_TYPE_ID],
            )
            .await?;

        Ok(MaintenanceSnapshot { channels })
    }

    async fn restore_maintenance_mode(&self, snapshot: &MaintenanceSnapshot) -> Result<()> {
        for (id, maintenance) in &snapshot.channels {
            self.db
                .execute(
                    "UPDATE sales_channel SET maintenance = ? WHERE id = UNHEX(?)",
                    &[maintenance.as_str(), id.as_str()],
                )
                .await?;
        }
        Ok(())
    }

    async fn installed_apps(&self) -> Result<Vec<InstalledRecord>> {
        let rows = self
            .db
            .query("SELECT name, version, CAST(active AS CHAR) FROM app", &[])
            .await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let mut cols = row.into_iter();
                let name = cols.next().flatten()?;
                let version = cols.next().flatten().unwrap_or_default();
                let active = cols.next().flatten().is_some_and(|a| a.trim() == "1");
                Some(InstalledRecord::new(name, version, active))
            })
            .collect())
    }

    async fn database_version(&self) -> Result<String> {
        let raw = self
            .db
            .fetch_one("SELECT VERSION()", &[])
            .await?
            .unwrap_or_default();
        normalize_database_version(&raw)
    }
}

/// Turn a `VERSION()` string into `mysql-<x.y.z>` or `mariadb-<x.y>`
pub fn normalize_database_version(raw: &str) -> Result<String> {
    if raw.to_ascii_lowercase().contains("mariadb") {
        // Replication-compatible servers prefix the real version with 5.5.5-
        let trimmed = raw.strip_prefix("5.5.5-").unwrap_or(raw);
        return major_minor(trimmed)
            .map(|v| format!("mariadb-{}", v))
            .ok_or_else(|| anyhow!("Invalid version string: {}", raw));
    }

    let version = raw.split('-').next().unwrap_or_default();
    if version.is_empty() || !version.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(anyhow!("Invalid version string: {}", raw));
    }
    Ok(format!("mysql-{}", version))
}

/// First `<digits>.<digits>` run in `s`
fn major_minor(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        let major_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        let major_end = i;
        if i < bytes.len() && bytes[i] == b'.' {
            let minor_start = i + 1;
            let mut j = minor_start;
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            if j > minor_start {
                return Some(format!(
                    "{}.{}",
                    &s[major_start..major_end],
                    &s[minor_start..j]
                ));
            }
        }
    }
    None
}
