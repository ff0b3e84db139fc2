//! Human-facing status lines, deployment summaries and ledger tables
//!
//! Warnings go to stderr, everything else to stdout.

use console::{style, StyledObject};
use stagehand_runtime::{DeploymentOutcome, ExecutedTask};
use tabled::{settings::Style, Table, Tabled};

#[derive(Debug, Clone, Copy)]
enum Level {
    Done,
    Note,
    Warn,
}

impl Level {
    fn tag(self) -> StyledObject<&'static str> {
        match self {
            Level::Done => style("done").green().bold(),
            Level::Note => style("note").cyan(),
            Level::Warn => style("warn").yellow().bold(),
        }
    }
}

fn status(level: Level, msg: &str) -> String {
    format!("{} {}", level.tag(), msg)
}

pub fn done(msg: &str) {
    println!("{}", status(Level::Done, msg));
}

pub fn note(msg: &str) {
    println!("{}", status(Level::Note, msg));
}

pub fn warn(msg: &str) {
    eprintln!("{}", status(Level::Warn, msg));
}

/// Closing line of `run`
pub fn outcome(outcome: &DeploymentOutcome) {
    done(&outcome_message(outcome));
}

fn outcome_message(outcome: &DeploymentOutcome) -> String {
    match outcome {
        DeploymentOutcome::Installed { version } => format!("Shopware {} installed", version),
        DeploymentOutcome::Upgraded { from, to } if from == to => {
            format!("Shopware {} is up to date", to)
        }
        DeploymentOutcome::Upgraded { from, to } => {
            format!("Shopware upgraded from {} to {}", from, to)
        }
    }
}

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Executed at")]
    executed_at: String,
}

impl From<ExecutedTask> for TaskRow {
    fn from(task: ExecutedTask) -> Self {
        Self {
            id: task.id,
            executed_at: task.created_at,
        }
    }
}

/// Print the one-time task ledger
pub fn executed_tasks(tasks: Vec<ExecutedTask>) {
    if tasks.is_empty() {
        note("No one-time tasks have been executed yet");
        return;
    }
    println!("{}", task_table(tasks));
}

fn task_table(tasks: Vec<ExecutedTask>) -> String {
    let total = tasks.len();
    let mut table = Table::new(tasks.into_iter().map(TaskRow::from));
    table.with(Style::sharp());
    let noun = if total == 1 { "task" } else { "tasks" };
    format!("{}\n{} {} executed", table, total, noun)
}
