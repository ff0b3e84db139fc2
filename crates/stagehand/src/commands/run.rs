//! The `run` command: install or upgrade the shop

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use camino::Utf8Path;
use stagehand_core::types::{parse_timeout, RunConfiguration, DEFAULT_TIMEOUT_SECS};
use stagehand_extensions::ExtensionInventory;
use stagehand_runtime::{
    Collaborators, CommandRunner, ConfigStore, DeploymentOrchestrator,
    InventoryCatalog, PlatformState, ProcessRunner, ShopwareState, SqlConfigStore,
    SqlTaskLedger, StoreAccountService, Telemetry, UdpTelemetry,
};
use tracing::{debug, info};

use super::ProjectContext;
use crate::cli::RunArgs;
use crate::output;

pub async fn run(args: RunArgs, explicit_config: Option<&Utf8Path>) -> Result<()> {
    let ctx = ProjectContext::load(explicit_config)?;
    let timeout = resolve_timeout(args.timeout.as_deref(), ctx.env.timeout.as_deref())?;

    let run_config = RunConfiguration::builder()
        .skip_theme_compile(args.skip_theme_compile)
        .skip_assets_install(args.skip_assets_install)
        .timeout(timeout)
        .force_reinstallation(ctx.env.force_reinstall)
        .build();
    debug!("Run configuration: {:?}", run_config);

    let runner: Arc<dyn CommandRunner> = Arc::new(
        ProcessRunner::new(ctx.root.clone())
            .with_php_from_env()?
            .with_timeout(timeout),
    );

    let db = ctx.connect_database().await?;
    let config_store: Arc<dyn ConfigStore> = Arc::new(SqlConfigStore::new(db.clone()));
    let inventory = ExtensionInventory::new(ctx.root.clone());
    let state: Arc<dyn PlatformState> = Arc::new(ShopwareState::new(
        db.clone(),
        config_store.clone(),
        inventory.composer()?,
    ));

    let telemetry = UdpTelemetry::new(
        ctx.env.telemetry.clone(),
        config_store.clone(),
        state.clone(),
    );
    track_environment(&telemetry, state.as_ref()).await;

    let deps = Collaborators {
        runner: runner.clone(),
        state,
        config_store: config_store.clone(),
        ledger: Arc::new(SqlTaskLedger::new(db)),
        account: Arc::new(StoreAccountService::new(
            config_store,
            runner.clone(),
            ctx.env.store_credentials.clone(),
        )?),
        catalog: Arc::new(InventoryCatalog::new(inventory, runner)),
    };

    let orchestrator = DeploymentOrchestrator::new(deps, ctx.config, ctx.env, ctx.root);
    let outcome = orchestrator.run(&run_config).await?;

    output::outcome(&outcome);

    Ok(())
}

/// `--timeout` beats `SHOPWARE_DEPLOYMENT_TIMEOUT`, which beats the default
fn resolve_timeout(flag: Option<&str>, env: Option<&str>) -> Result<Option<Duration>> {
    match flag.or(env) {
        Some(raw) => Ok(parse_timeout(raw)?),
        None => Ok(Some(Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS))),
    }
}

async fn track_environment(telemetry: &dyn Telemetry, state: &dyn PlatformState) {
    telemetry
        .track(
            "cli_version",
            BTreeMap::from([(
                "cli_version".to_string(),
                env!("CARGO_PKG_VERSION").to_string(),
            )]),
        )
        .await;

    match state.database_version().await {
        Ok(version) => {
            telemetry
                .track(
                    "mysql_version",
                    BTreeMap::from([("mysql_version".to_string(), version)]),
                )
                .await;
        }
        Err(e) => info!("Could not determine database version: {:#}", e),
    }
}
