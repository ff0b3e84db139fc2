//! Anonymous deployment telemetry over UDP

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, SecondsFormat};
use serde_json::json;
use stagehand_core::types::TelemetrySettings;
use tokio::net::UdpSocket;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::state::PlatformState;
use crate::system_config::{new_id, ConfigStore};

/// System config key holding the installation's telemetry id
pub const TRACKING_ID_KEY: &str = "core.deployment_helper.id";

const TRACKING_PORT: u16 = 9000;

/// Sink for deployment events; never fails the deployment
#[async_trait]
pub trait Telemetry: Send + Sync {
    async fn track(&self, event: &str, tags: BTreeMap<String, String>);
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTelemetry;

#[async_trait]
impl Telemetry for NoTelemetry {
    async fn track(&self, _event: &str, _tags: BTreeMap<String, String>) {}
}

/// Sends one JSON datagram per event
pub struct UdpTelemetry {
    settings: TelemetrySettings,
    config: Arc<dyn ConfigStore>,
    state: Arc<dyn PlatformState>,
    id: OnceCell<String>,
    default_tags: OnceCell<BTreeMap<String, String>>,
}

impl UdpTelemetry {
    pub fn new(
        settings: TelemetrySettings,
        config: Arc<dyn ConfigStore>,
        state: Arc<dyn PlatformState>,
    ) -> Self {
        Self {
            settings,
            config,
            state,
            id: OnceCell::new(),
            default_tags: OnceCell::new(),
        }
    }

    async fn default_tags(&self) -> &BTreeMap<String, String> {
        self.default_tags
            .get_or_init(|| async {
                let mut tags = BTreeMap::new();
                if let Ok(version) = self.state.current_version().await {
                    tags.insert("shopware_version".to_string(), version);
                }
                tags
            })
            .await
    }

    /// Stored id, or a fresh one that is persisted when the store is readable
    async fn id(&self) -> &str {
        self.id
            .get_or_init(|| async {
                match self.config.get(TRACKING_ID_KEY).await {
                    Ok(Some(id)) => id,
                    Ok(None) => {
                        let id = new_id();
                        if let Err(e) = self.config.set(TRACKING_ID_KEY, &id).await {
                            debug!("Failed to persist telemetry id: {:#}", e);
                        }
                        id
                    }
                    Err(_) => new_id(),
                }
            })
            .await
    }

    async fn send(&self, payload: &str) -> std::io::Result<()> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket
            .send_to(
                payload.as_bytes(),
                (self.settings.domain.as_str(), TRACKING_PORT),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Telemetry for UdpTelemetry {
    async fn track(&self, event: &str, tags: BTreeMap<String, String>) {
        if !self.settings.enabled {
            return;
        }

        let mut all_tags = self.default_tags().await.clone();
        all_tags.extend(tags);

        let payload = json!({
            "event": format!("deployment_helper.{}", event),
            "tags": all_tags,
            "user_id": self.id().await,
            "timestamp": Local::now().to_rfc3339_opts(SecondsFormat::Secs, false),
        })
        .to_string();

        if let Err(e) = self.send(&payload).await {
            debug!("Telemetry event {} not sent: {}", event, e);
        }
    }
}
