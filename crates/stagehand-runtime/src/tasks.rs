//! One-time tasks: scripts that run exactly once per environment

use std::sync::Arc;

use anyhow::Result;
use stagehand_core::types::{OneTimeTask, TaskPhase};
use stagehand_core::Error;
use tracing::{debug, info};

use crate::ledger::{ExecutedTask, TaskLedger};
use crate::process::CommandRunner;

/// Runs pending one-time tasks and manages the ledger
#[derive(Clone)]
pub struct OneTimeTaskRunner {
    runner: Arc<dyn CommandRunner>,
    ledger: Arc<dyn TaskLedger>,
    tasks: Vec<OneTimeTask>,
}

impl OneTimeTaskRunner {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        ledger: Arc<dyn TaskLedger>,
        tasks: Vec<OneTimeTask>,
    ) -> Self {
        Self {
            runner,
            ledger,
            tasks,
        }
    }

    /// Run the tasks of `phase` that are not in the ledger, in declaration order
    ///
    /// Returns the ids that were executed.
    pub async fn execute(&self, phase: TaskPhase) -> Result<Vec<String>> {
        let executed = self.ledger.list_executed().await?;
        let mut ran = Vec::new();

        for task in self.tasks.iter().filter(|t| t.when == phase) {
            if executed.iter().any(|e| e.id == task.id) {
                debug!("One-time task {} already executed", task.id);
                continue;
            }

            info!("Running one-time task {}", task.id);
            self.runner.run_and_tail(&task.script).await?;
            self.ledger.mark_executed(&task.id).await?;
            ran.push(task.id.clone());
        }

        Ok(ran)
    }

    pub async fn list(&self) -> Result<Vec<ExecutedTask>> {
        self.ledger.list_executed().await
    }

    /// Record `id` as executed without running it
    pub async fn mark(&self, id: &str) -> Result<()> {
        if self.ledger.is_executed(id).await? {
            return Err(Error::task_already_marked(id).into());
        }
        self.ledger.mark_executed(id).await
    }

    /// Forget `id` so it runs again on the next deployment
    pub async fn unmark(&self, id: &str) -> Result<()> {
        if !self.ledger.is_executed(id).await? {
            return Err(Error::task_not_marked(id).into());
        }
        self.ledger.forget(id).await
    }
}
