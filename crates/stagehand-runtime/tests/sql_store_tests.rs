//! SQL issued by the config store, the task ledger and the platform state

mod common;

use std::sync::Arc;

use camino::Utf8Path;
use common::*;
use stagehand_extensions::inventory::ComposerRegistry;
use stagehand_extensions::InstalledRecord;
use stagehand_runtime::{
    ConfigStore, MaintenanceSnapshot, PlatformState, ShopwareState, SqlConfigStore,
    SqlTaskLedger, TaskLedger,
};

fn shop_state(db: &Arc<ScriptedDatabase>) -> ShopwareState {
    ShopwareState::new(
        db.clone(),
        Arc::new(SqlConfigStore::new(db.clone())),
        ComposerRegistry::from_packages(Utf8Path::new("/srv/shop"), vec![]),
    )
}

#[tokio::test]
async fn test_config_value_with_quotes_is_bound_not_spliced() {
    let db = Arc::new(ScriptedDatabase::new());
    let store = SqlConfigStore::new(db.clone());
    let value = r"it's a \ path";

    store.set("core.store.licenseHost", value).await.unwrap();

    let insert = db.last("INSERT INTO system_config");
    assert!(!insert.sql.contains("it's"));
    assert_eq!(insert.params.len(), 3);
    assert_eq!(insert.params[0].len(), 32);
    assert_eq!(insert.params[1], "core.store.licenseHost");
    let payload: serde_json::Value = serde_json::from_str(&insert.params[2]).unwrap();
    assert_eq!(payload["_value"], value);
}

#[tokio::test]
async fn test_existing_config_key_is_updated_by_id() {
    let db = Arc::new(ScriptedDatabase::new());
    db.answer(
        "LOWER(HEX(id)) FROM system_config",
        &[&[Some("0191a2b3c4d5e6f708192a3b4c5d6e7f")]],
    );
    let store = SqlConfigStore::new(db.clone());

    store.set("deployment.version", "6.6.4.0").await.unwrap();

    let update = db.last("UPDATE system_config");
    assert_eq!(
        update.params,
        vec![
            r#"{"_value":"6.6.4.0"}"#.to_string(),
            "0191a2b3c4d5e6f708192a3b4c5d6e7f".to_string(),
        ]
    );
    assert!(db
        .statements()
        .iter()
        .all(|s| !s.sql.starts_with("INSERT")));
}

#[tokio::test]
async fn test_config_get_unwraps_envelope() {
    let db = Arc::new(ScriptedDatabase::new());
    db.answer(
        "CAST(configuration_value",
        &[&[Some(r#"{"_value":"6.5.8.0"}"#)]],
    );
    let store = SqlConfigStore::new(db.clone());

    assert_eq!(
        store.get("deployment.version").await.unwrap(),
        Some("6.5.8.0".to_string())
    );
    assert_eq!(
        db.last("SELECT CAST(configuration_value").params,
        vec!["deployment.version".to_string()]
    );
}

#[tokio::test]
async fn test_config_get_missing_key_is_none() {
    let db = Arc::new(ScriptedDatabase::new());
    let store = SqlConfigStore::new(db);

    assert_eq!(store.get("deployment.version").await.unwrap(), None);
}

#[tokio::test]
async fn test_ledger_binds_task_id_verbatim() {
    let db = Arc::new(ScriptedDatabase::new());
    let ledger = SqlTaskLedger::new(db.clone());
    let id = r"o'reilly\task";

    ledger.mark_executed(id).await.unwrap();
    ledger.forget(id).await.unwrap();

    let insert = db.last("INSERT INTO one_time_tasks");
    assert_eq!(insert.params[0], id);
    assert_eq!(insert.params.len(), 2);
    assert_eq!(db.last("DELETE FROM one_time_tasks").params, vec![id.to_string()]);
    assert!(db
        .statements()
        .iter()
        .any(|s| s.sql.starts_with("CREATE TABLE IF NOT EXISTS one_time_tasks")));
}

#[tokio::test]
async fn test_ledger_lists_rows() {
    let db = Arc::new(ScriptedDatabase::new());
    db.answer(
        "FROM one_time_tasks",
        &[
            &[Some("reindex"), Some("2024-03-01 10:00:00")],
            &[None, Some("2024-03-02 10:00:00")],
        ],
    );
    let ledger = SqlTaskLedger::new(db);

    let executed = ledger.list_executed().await.unwrap();

    assert_eq!(executed.len(), 1);
    assert_eq!(executed[0].id, "reindex");
    assert_eq!(executed[0].created_at, "2024-03-01 10:00:00");
    assert!(ledger.is_executed("reindex").await.unwrap());
}

#[tokio::test]
async fn test_sales_channel_lookup_binds_url() {
    let db = Arc::new(ScriptedDatabase::new());
    let state = shop_state(&db);
    let url = "https://shop.example/?q='1' OR '1'='1";

    assert!(!state.is_sales_channel_existing(url).await.unwrap());

    let lookup = db.last("SELECT LOWER(HEX(id)) FROM sales_channel_domain");
    assert_eq!(lookup.params, vec![url.to_string()]);
}

#[tokio::test]
async fn test_maintenance_snapshot_round_trip() {
    let db = Arc::new(ScriptedDatabase::new());
    db.answer(
        "CAST(maintenance AS CHAR)",
        &[&[Some("aa01"), Some("0")], &[Some("bb02"), Some("1")]],
    );
    let state = shop_state(&db);

    let snapshot = state.enable_maintenance_mode().await.unwrap();
    assert_eq!(
        snapshot,
        MaintenanceSnapshot {
            channels: vec![
                ("aa01".to_string(), "0".to_string()),
                ("bb02".to_string(), "1".to_string()),
            ],
        }
    );
    assert!(db
        .statements()
        .iter()
        .any(|s| s.sql.starts_with("UPDATE sales_channel SET maintenance = 1")));

    state.restore_maintenance_mode(&snapshot).await.unwrap();
    let restored: Vec<Vec<String>> = db
        .statements()
        .into_iter()
        .filter(|s| s.sql.starts_with("UPDATE sales_channel SET maintenance = ?"))
        .map(|s| s.params)
        .collect();
    assert_eq!(
        restored,
        vec![
            vec!["0".to_string(), "aa01".to_string()],
            vec!["1".to_string(), "bb02".to_string()],
        ]
    );
}

#[tokio::test]
async fn test_installed_apps_from_app_table() {
    let db = Arc::new(ScriptedDatabase::new());
    db.answer(
        "FROM app",
        &[
            &[Some("Acme"), Some("1.0.0"), Some("1")],
            &[Some("Beta"), Some("2.1.0"), Some("0")],
        ],
    );
    let state = shop_state(&db);

    assert_eq!(
        state.installed_apps().await.unwrap(),
        vec![
            InstalledRecord::new("Acme", "1.0.0", true),
            InstalledRecord::new("Beta", "2.1.0", false),
        ]
    );
}

#[tokio::test]
async fn test_first_run_wizard_goes_through_system_config() {
    let db = Arc::new(ScriptedDatabase::new());
    let state = shop_state(&db);

    state.disable_first_run_wizard().await.unwrap();

    let insert = db.last("INSERT INTO system_config");
    assert_eq!(insert.params[1], "core.frw.completedAt");
    assert_eq!(insert.params[2], r#"{"_value":"2021-01-01 00:00:00"}"#);
}

#[tokio::test]
async fn test_installed_only_when_schema_has_system_config() {
    let db = Arc::new(ScriptedDatabase::new());
    let state = shop_state(&db);
    assert!(!state.is_installed().await.unwrap());

    db.add_table("system_config");
    assert!(state.is_installed().await.unwrap());
}
