//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// Stagehand - install or upgrade a Shopware project in one run
#[derive(Parser, Debug)]
#[command(name = "stagehand")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the project configuration file
    #[arg(long, global = true)]
    pub project_config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install Shopware or upgrade the existing installation
    Run(RunArgs),

    /// Manage the one-time task ledger
    #[command(subcommand)]
    OneTimeTask(OneTimeTaskCommands),
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Skip theme compile (when the theme was compiled in CI)
    #[arg(long)]
    pub skip_theme_compile: bool,

    /// Skip asset install (when assets were copied in CI)
    #[arg(long, alias = "skip-asset-install")]
    pub skip_assets_install: bool,

    /// Per-command timeout in seconds; 0 or "null" disables it
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum OneTimeTaskCommands {
    /// List executed one-time tasks
    List,

    /// Mark a one-time task as run without executing it
    Mark(TaskIdArgs),

    /// Forget a one-time task so it runs on the next deployment
    Unmark(TaskIdArgs),
}

#[derive(Args, Debug)]
pub struct TaskIdArgs {
    /// Task id as declared in the project configuration
    pub id: String,
}
