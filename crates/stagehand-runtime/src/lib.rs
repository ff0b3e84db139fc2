//! Deployment runtime for stagehand
//!
//! This crate handles:
//! - Running console commands and shell scripts with timeouts
//! - Database-backed platform state, system config and the one-time-task ledger
//! - Applying extension lifecycle passes
//! - Store account refresh and telemetry
//! - The install and upgrade orchestration

pub mod account;
pub mod database;
pub mod hooks;
pub mod ledger;
pub mod lifecycle;
pub mod orchestrator;
pub mod post_deploy;
pub mod process;
pub mod state;
pub mod system_config;
pub mod tasks;
pub mod tracking;

pub use account::{StoreAccount, StoreAccountService};
pub use database::{Database, MysqlClient, SchemaStatus};
pub use hooks::HookExecutor;
pub use ledger::{ExecutedTask, SqlTaskLedger, TaskLedger};
pub use lifecycle::{CatalogSource, InventoryCatalog, LifecycleExecutor};
pub use orchestrator::{Collaborators, DeploymentOrchestrator, DeploymentOutcome};
pub use process::{CommandRunner, ProcessRunner};
pub use state::{MaintenanceSnapshot, PlatformState, ShopwareState};
pub use system_config::{ConfigStore, SqlConfigStore};
pub use tasks::OneTimeTaskRunner;
pub use tracking::{NoTelemetry, Telemetry, UdpTelemetry};
