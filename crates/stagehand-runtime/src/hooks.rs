//! Operator shell hooks around deployment phases

use std::sync::Arc;

use anyhow::{Context, Result};
use stagehand_core::types::{HookPhase, Hooks};
use tracing::debug;

use crate::process::CommandRunner;

#[derive(Clone)]
pub struct HookExecutor {
    runner: Arc<dyn CommandRunner>,
    hooks: Hooks,
}

impl HookExecutor {
    pub fn new(runner: Arc<dyn CommandRunner>, hooks: Hooks) -> Self {
        Self { runner, hooks }
    }

    /// Run the script for `phase`; empty hooks are skipped
    pub async fn execute(&self, phase: HookPhase) -> Result<()> {
        let script = self.hooks.script(phase);
        if script.trim().is_empty() {
            debug!("No {} hook configured", phase);
            return Ok(());
        }

        self.runner
            .run_and_tail(script)
            .await
            .with_context(|| format!("Hook {} failed", phase))
    }
}
