//! Persisted record of executed one-time tasks

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Local;

use crate::database::Database;

/// One ledger row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedTask {
    pub id: String,
    pub created_at: String,
}

/// Storage for one-time task executions
#[async_trait]
pub trait TaskLedger: Send + Sync {
    /// All executed tasks in storage order
    async fn list_executed(&self) -> Result<Vec<ExecutedTask>>;

    /// Record `id` as executed now
    async fn mark_executed(&self, id: &str) -> Result<()>;

    /// Drop the record of `id`
    async fn forget(&self, id: &str) -> Result<()>;

    async fn is_executed(&self, id: &str) -> Result<bool> {
        Ok(self.list_executed().await?.iter().any(|task| task.id == id))
    }
}

/// [`TaskLedger`] stored in the `one_time_tasks` table
#[derive(Clone)]
pub struct SqlTaskLedger {
    db: Arc<dyn Database>,
}

impl SqlTaskLedger {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    async fn ensure_table(&self) -> Result<()> {
        self.db
            .execute(
                "CREATE TABLE IF NOT EXISTS one_time_tasks (id VARCHAR(255) PRIMARY KEY, created_at DATETIME NOT NULL)",
                &[],
            )
            .await
    }
}

#[async_trait]
impl TaskLedger for SqlTaskLedger {
    async fn list_executed(&self) -> Result<Vec<ExecutedTask>> {
        self.ensure_table().await?;

        let rows = self
            .db
            .query(
                "SELECT id, DATE_FORMAT(created_at, '%Y-%m-%d %H:%i:%s') FROM one_time_tasks",
                &[],
            )
            .await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let mut cols = row.into_iter();
                let id = cols.next().flatten()?;
                let created_at = cols.next().flatten().unwrap_or_default();
                Some(ExecutedTask { id, created_at })
            })
            .collect())
    }

    async fn mark_executed(&self, id: &str) -> Result<()> {
        self.ensure_table().await?;

        let now = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        self.db
            .execute(
                "INSERT INTO one_time_tasks (id, created_at) VALUES (?, ?)",
                &[id, now.as_str()],
            )
            .await
    }

    async fn forget(&self, id: &str) -> Result<()> {
        self.ensure_table().await?;

        self.db
            .execute("DELETE FROM one_time_tasks WHERE id = ?", &[id])
            .await
    }
}
