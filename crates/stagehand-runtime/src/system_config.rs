//! Global `system_config` entries stored as `{"_value": ...}` envelopes

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::database::Database;

/// Read and write global (not sales-channel scoped) config values
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Value of `key`, `None` when no global entry exists
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Update the global entry for `key`, creating it when missing
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// [`ConfigStore`] on top of the `system_config` table
#[derive(Clone)]
pub struct SqlConfigStore {
    db: Arc<dyn Database>,
}

impl SqlConfigStore {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ConfigStore for SqlConfigStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let raw = self
            .db
            .fetch_one(
                "SELECT CAST(configuration_value AS CHAR) FROM system_config WHERE configuration_key = ? AND sales_channel_id IS NULL",
                &[key],
            )
            .await?;
        match raw {
            Some(raw) => unwrap_envelope(&raw)
                .with_context(|| format!("Invalid system config value for {}", key))
                .map(Some),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let payload = json!({ "_value": value }).to_string();
        let existing = self
            .db
            .fetch_one(
                "SELECT LOWER(HEX(id)) FROM system_config WHERE configuration_key = ? AND sales_channel_id IS NULL",
                &[key],
            )
            .await?;

        match existing {
            Some(id) if !id.is_empty() => {
                self.db
                    .execute(
                        "UPDATE system_config SET configuration_value = ?, updated_at = NOW() WHERE id = UNHEX(?)",
                        &[payload.as_str(), id.as_str()],
                    )
                    .await
            }
            _ => {
                let id = new_id();
                self.db
                    .execute(
                        "INSERT INTO system_config (id, configuration_key, configuration_value, sales_channel_id, created_at) VALUES (UNHEX(?), ?, ?, NULL, NOW())",
                        &[id.as_str(), key, payload.as_str()],
                    )
                    .await
            }
        }
    }
}

/// Random 16-byte id in lowercase hex
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Extract `_value` from a stored envelope as a string
pub fn unwrap_envelope(raw: &str) -> Result<String> {
    let envelope: Value = serde_json::from_str(raw)?;
    match envelope.get("_value") {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Array(_)) | Some(Value::Object(_)) => {
            Err(anyhow!("Expected string, got array"))
        }
        Some(Value::Null) | None => Ok(String::new()),
        Some(other) => Ok(other.to_string()),
    }
}
