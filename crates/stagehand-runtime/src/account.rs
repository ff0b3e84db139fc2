//! Shopware store account: license host and shop secret refresh

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use stagehand_core::types::StoreCredentials;
use tracing::{info, warn};
use url::Url;

use crate::process::CommandRunner;
use crate::system_config::{new_id, ConfigStore};

pub const LICENSE_HOST_KEY: &str = "core.store.licenseHost";
pub const SHOP_SECRET_KEY: &str = "core.store.shopSecret";

const DEFAULT_API_URL: &str = "https://api.shopware.com";

/// Keeps the shop registered against the store
#[async_trait]
pub trait StoreAccount: Send + Sync {
    async fn refresh(&self, shopware_version: &str, license_domain: &str) -> Result<()>;
}

/// [`StoreAccount`] talking to the Shopware store API
pub struct StoreAccountService {
    config: Arc<dyn ConfigStore>,
    runner: Arc<dyn CommandRunner>,
    credentials: StoreCredentials,
    client: reqwest::Client,
    base_url: Url,
}

impl StoreAccountService {
    pub fn new(
        config: Arc<dyn ConfigStore>,
        runner: Arc<dyn CommandRunner>,
        credentials: StoreCredentials,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("stagehand/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            runner,
            credentials,
            client,
            base_url: Url::parse(DEFAULT_API_URL)?,
        })
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    async fn set_license_domain(&self, domain: &str) -> Result<bool> {
        if self.config.get(LICENSE_HOST_KEY).await?.as_deref() == Some(domain) {
            return Ok(false);
        }
        self.config.set(LICENSE_HOST_KEY, domain).await?;
        Ok(true)
    }

    fn endpoint(&self, path: &str, version: &str, domain: &str) -> Result<Url> {
        let mut url = self
            .base_url
            .join(path)
            .with_context(|| format!("Invalid store API path {}", path))?;
        url.query_pairs_mut()
            .append_pair("shopwareVersion", version)
            .append_pair("domain", domain)
            .append_pair("language", "en-GB");
        Ok(url)
    }

    async fn is_secret_valid(&self, secret: &str, version: &str, domain: &str) -> Result<bool> {
        let url = self.endpoint("/swplatform/pluginupdates", version, domain)?;
        let response = self
            .client
            .post(url)
            .header("X-Shopware-Shop-Secret", secret)
            .json(&json!({ "plugins": [] }))
            .send()
            .await
            .context("Failed to verify shop secret")?;

        Ok(response.status() == reqwest::StatusCode::OK)
    }

    /// Returns true when a new secret was stored
    async fn refresh_shop_token(&self, version: &str, domain: &str) -> Result<bool> {
        if let Some(secret) = self.config.get(SHOP_SECRET_KEY).await? {
            if self.is_secret_valid(&secret, version, domain).await? {
                return Ok(false);
            }
        }

        let url = self.endpoint("/swplatform/login", version, domain)?;
        let data: Value = self
            .client
            .post(url)
            .json(&json!({
                "shopwareId": self.credentials.email,
                "password": self.credentials.password,
                "shopwareUserId": new_id(),
            }))
            .send()
            .await
            .context("Store login request failed")?
            .json()
            .await
            .context("Store login returned malformed JSON")?;

        let secret = data
            .get("shopSecret")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("Got invalid response from Shopware API: {}", data))?;

        self.config.set(SHOP_SECRET_KEY, secret).await?;
        Ok(true)
    }
}

#[async_trait]
impl StoreAccount for StoreAccountService {
    async fn refresh(&self, shopware_version: &str, license_domain: &str) -> Result<()> {
        let version = store_version(shopware_version);

        let mut changed = self.set_license_domain(license_domain).await?;
        if changed {
            info!("Updated license domain to {}", license_domain);
        }

        if !self.credentials.is_complete() {
            warn!(
                "No store account credentials found, skipping store account login verification. \
                 Set SHOPWARE_STORE_ACCOUNT_EMAIL and SHOPWARE_STORE_ACCOUNT_PASSWORD to refresh the store account on deployment"
            );
        } else if self.refresh_shop_token(version, license_domain).await? {
            info!("Refreshed global shop token to communicate with the store");
            changed = true;
        }

        if changed {
            self.runner
                .console(&["cache:pool:invalidate-tags", "-p", "cache.object", "system-config"])
                .await?;
        }
        Ok(())
    }
}

/// Development builds are announced with a placeholder version
pub fn store_version(version: &str) -> &str {
    if version.contains("dev") {
        "___VERSION___"
    } else {
        version
    }
}
