//! One-time task ledger commands

use std::sync::Arc;

use anyhow::Result;
use camino::Utf8Path;
use stagehand_runtime::{OneTimeTaskRunner, ProcessRunner, SqlTaskLedger};

use super::ProjectContext;
use crate::cli::OneTimeTaskCommands;
use crate::output;

pub async fn run(cmd: OneTimeTaskCommands, explicit_config: Option<&Utf8Path>) -> Result<()> {
    let ctx = ProjectContext::load(explicit_config)?;
    let db = ctx.connect_database().await?;

    let declared: Vec<String> = ctx.config.one_time_tasks.iter().map(|t| t.id.clone()).collect();
    // Ledger commands never spawn processes
    let tasks = OneTimeTaskRunner::new(
        Arc::new(ProcessRunner::new(ctx.root.clone())),
        Arc::new(SqlTaskLedger::new(db)),
        ctx.config.one_time_tasks,
    );

    match cmd {
        OneTimeTaskCommands::List => {
            output::executed_tasks(tasks.list().await?);
            Ok(())
        }
        OneTimeTaskCommands::Mark(args) => {
            if !declared.contains(&args.id) {
                output::warn(&format!(
                    "One-time task {} is not declared in the project configuration",
                    args.id
                ));
            }
            tasks.mark(&args.id).await?;
            output::done(&format!("One-time task {} marked as run", args.id));
            Ok(())
        }
        OneTimeTaskCommands::Unmark(args) => {
            tasks.unmark(&args.id).await?;
            output::done(&format!("One-time task {} will run on the next deployment", args.id));
            Ok(())
        }
    }
}
