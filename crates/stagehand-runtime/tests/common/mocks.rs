//! In-memory collaborators for deployment tests
//!
//! Every mock writes to a shared [`Journal`] so tests can assert on the
//! exact interleaving of commands, state mutations and account calls.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use stagehand_core::Error;
use stagehand_extensions::{ExtensionKind, ExtensionUnit, InstalledRecord};
use stagehand_runtime::database::Row;
use stagehand_runtime::{
    CatalogSource, CommandRunner, ConfigStore, Database, ExecutedTask, MaintenanceSnapshot,
    PlatformState, StoreAccount, TaskLedger,
};

/// Ordered record of everything the collaborators were asked to do
#[derive(Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    /// Console commands without the `console ` prefix
    pub fn consoles(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|e| e.strip_prefix("console ").map(str::to_string))
            .collect()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.entries().iter().any(|e| e == entry)
    }

    /// Index of the first entry equal to `entry`
    pub fn position(&self, entry: &str) -> usize {
        self.entries()
            .iter()
            .position(|e| e == entry)
            .unwrap_or_else(|| panic!("{:?} not in journal {:#?}", entry, self.entries()))
    }
}

/// Command runner that records invocations and feeds extension commands to a fake shop
pub struct RecordingRunner {
    journal: Journal,
    shop: Option<Arc<FakeExtensions>>,
    fail_on: Mutex<Option<String>>,
}

impl RecordingRunner {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            shop: None,
            fail_on: Mutex::new(None),
        }
    }

    pub fn with_shop(mut self, shop: Arc<FakeExtensions>) -> Self {
        self.shop = Some(shop);
        self
    }

    /// Fail every invocation whose journal entry starts with `prefix`
    pub fn fail_on(&self, prefix: &str) {
        *self.fail_on.lock().unwrap() = Some(prefix.to_string());
    }

    fn record(&self, entry: String) -> Result<()> {
        self.journal.push(entry.clone());
        match self.fail_on.lock().unwrap().as_deref() {
            Some(prefix) if entry.starts_with(prefix) => {
                Err(Error::command_failed(entry, "exit status: 1").into())
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<()> {
        self.record(format!("run {} {}", program, args.join(" ")))
    }

    async fn console(&self, args: &[&str]) -> Result<()> {
        self.record(format!("console {}", args.join(" ")))?;
        if let Some(shop) = &self.shop {
            shop.apply(args);
        }
        Ok(())
    }

    async fn run_and_tail(&self, script: &str) -> Result<()> {
        self.record(format!("sh {}", script))
    }

    async fn output(&self, args: &[&str]) -> Result<String> {
        Ok(format!("output {}", args.join(" ")))
    }
}

/// Plugins and apps that react to lifecycle console commands
#[derive(Default)]
pub struct FakeExtensions {
    plugins: Mutex<Vec<ExtensionUnit>>,
    apps: Mutex<Vec<ExtensionUnit>>,
    installed_apps: Mutex<Vec<InstalledRecord>>,
}

impl FakeExtensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plugins(self, plugins: Vec<ExtensionUnit>) -> Self {
        *self.plugins.lock().unwrap() = plugins;
        self
    }

    pub fn with_apps(self, apps: Vec<ExtensionUnit>) -> Self {
        *self.apps.lock().unwrap() = apps;
        self
    }

    pub fn with_installed_apps(self, records: Vec<InstalledRecord>) -> Self {
        *self.installed_apps.lock().unwrap() = records;
        self
    }

    pub fn plugin(&self, name: &str) -> Option<ExtensionUnit> {
        self.plugins
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.name == name)
            .cloned()
    }

    pub fn installed_apps(&self) -> Vec<InstalledRecord> {
        self.installed_apps.lock().unwrap().clone()
    }

    fn app_version(&self, name: &str) -> String {
        self.apps
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.version.clone())
            .unwrap_or_default()
    }

    pub fn apply(&self, args: &[&str]) {
        let Some((&command, rest)) = args.split_first() else {
            return;
        };
        let target = rest.iter().find(|a| !a.starts_with("--")).copied();
        let activate = rest.contains(&"--activate");

        if command.starts_with("plugin:") {
            let mut plugins = self.plugins.lock().unwrap();
            let Some(name) = target else {
                return;
            };
            let Some(plugin) = plugins.iter_mut().find(|p| p.name == name) else {
                return;
            };
            match command {
                "plugin:install" => {
                    plugin.installed_at = Some("2024-01-01 00:00:00".into());
                    plugin.active = activate;
                }
                "plugin:activate" => plugin.active = true,
                "plugin:update" => {
                    if let Some(next) = plugin.upgrade_version.take() {
                        plugin.version = next;
                    }
                }
                "plugin:deactivate" => plugin.active = false,
                "plugin:uninstall" => {
                    plugin.installed_at = None;
                    plugin.active = false;
                }
                _ => {}
            }
            return;
        }

        let mut installed = self.installed_apps.lock().unwrap();
        match (command, target) {
            ("app:install", Some(name)) => {
                installed.push(InstalledRecord::new(name, self.app_version(name), activate));
            }
            ("app:refresh", None) => {
                for record in installed.iter_mut() {
                    record.version = self.app_version(&record.name);
                }
            }
            ("app:refresh", Some(name)) => {
                if let Some(record) = installed.iter_mut().find(|r| r.name == name) {
                    record.version = self.app_version(name);
                }
            }
            ("app:activate", Some(name)) => {
                if let Some(record) = installed.iter_mut().find(|r| r.name == name) {
                    record.active = true;
                }
            }
            ("app:deactivate", Some(name)) => {
                if let Some(record) = installed.iter_mut().find(|r| r.name == name) {
                    record.active = false;
                }
            }
            ("app:uninstall", Some(name)) => installed.retain(|r| r.name != name),
            _ => {}
        }
    }
}

#[async_trait]
impl CatalogSource for FakeExtensions {
    async fn catalog(&self, kind: ExtensionKind) -> Result<Vec<ExtensionUnit>> {
        Ok(match kind {
            ExtensionKind::Plugin => self.plugins.lock().unwrap().clone(),
            ExtensionKind::App => self.apps.lock().unwrap().clone(),
        })
    }
}

/// Platform state held in memory
pub struct MemoryState {
    journal: Journal,
    shop: Arc<FakeExtensions>,
    installed: Mutex<bool>,
    previous: Mutex<Option<String>>,
    current: String,
    storefront: Mutex<bool>,
    channels: Mutex<Vec<String>>,
}

impl MemoryState {
    pub fn new(journal: Journal, shop: Arc<FakeExtensions>, current: &str) -> Self {
        Self {
            journal,
            shop,
            installed: Mutex::new(false),
            previous: Mutex::new(None),
            current: current.to_string(),
            storefront: Mutex::new(true),
            channels: Mutex::new(Vec::new()),
        }
    }

    pub fn set_installed(&self, previous: Option<&str>) {
        *self.installed.lock().unwrap() = true;
        *self.previous.lock().unwrap() = previous.map(str::to_string);
    }

    pub fn set_storefront(&self, capable: bool) {
        *self.storefront.lock().unwrap() = capable;
    }

    pub fn add_sales_channel(&self, url: &str) {
        self.channels.lock().unwrap().push(url.to_string());
    }

    pub fn recorded_version(&self) -> Option<String> {
        self.previous.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlatformState for MemoryState {
    async fn is_installed(&self) -> Result<bool> {
        Ok(*self.installed.lock().unwrap())
    }

    async fn previous_version(&self) -> Result<String> {
        Ok(self
            .previous
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| "unknown".to_string()))
    }

    async fn current_version(&self) -> Result<String> {
        Ok(self.current.clone())
    }

    async fn set_version(&self, version: &str) -> Result<()> {
        self.journal.push(format!("state set-version {}", version));
        *self.previous.lock().unwrap() = Some(version.to_string());
        Ok(())
    }

    async fn is_storefront_capable(&self) -> Result<bool> {
        Ok(*self.storefront.lock().unwrap())
    }

    async fn is_sales_channel_existing(&self, url: &str) -> Result<bool> {
        Ok(self.channels.lock().unwrap().iter().any(|c| c == url))
    }

    async fn remove_headless_sales_channels(&self) -> Result<()> {
        self.journal.push("state remove-headless");
        Ok(())
    }

    async fn disable_first_run_wizard(&self) -> Result<()> {
        self.journal.push("state disable-frw");
        Ok(())
    }

    async fn enable_maintenance_mode(&self) -> Result<MaintenanceSnapshot> {
        self.journal.push("state maintenance-on");
        Ok(MaintenanceSnapshot {
            channels: vec![("0a1b".to_string(), "0".to_string())],
        })
    }

    async fn restore_maintenance_mode(&self, snapshot: &MaintenanceSnapshot) -> Result<()> {
        self.journal
            .push(format!("state maintenance-restore {}", snapshot.channels.len()));
        Ok(())
    }

    async fn installed_apps(&self) -> Result<Vec<InstalledRecord>> {
        Ok(self.shop.installed_apps())
    }

    async fn database_version(&self) -> Result<String> {
        Ok("mysql-8.0.36".to_string())
    }
}

/// System config values held in memory
#[derive(Default)]
pub struct MemoryConfigStore {
    values: Mutex<BTreeMap<String, String>>,
    broken: Mutex<bool>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    pub fn insert(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    /// Make every read fail, as a missing `system_config` table would
    pub fn break_reads(&self) {
        *self.broken.lock().unwrap() = true;
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        if *self.broken.lock().unwrap() {
            return Err(anyhow!("Table system_config doesn't exist"));
        }
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.insert(key, value);
        Ok(())
    }
}

/// Ledger held in memory
pub struct MemoryLedger {
    journal: Journal,
    rows: Mutex<Vec<ExecutedTask>>,
}

impl MemoryLedger {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            rows: Mutex::new(Vec::new()),
        }
    }

    pub fn seed(&self, id: &str) {
        self.rows.lock().unwrap().push(ExecutedTask {
            id: id.to_string(),
            created_at: "2024-01-01 00:00:00".to_string(),
        });
    }

    pub fn ids(&self) -> Vec<String> {
        self.rows.lock().unwrap().iter().map(|r| r.id.clone()).collect()
    }
}

#[async_trait]
impl TaskLedger for MemoryLedger {
    async fn list_executed(&self) -> Result<Vec<ExecutedTask>> {
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn mark_executed(&self, id: &str) -> Result<()> {
        self.journal.push(format!("ledger mark {}", id));
        self.seed(id);
        Ok(())
    }

    async fn forget(&self, id: &str) -> Result<()> {
        self.journal.push(format!("ledger forget {}", id));
        self.rows.lock().unwrap().retain(|r| r.id != id);
        Ok(())
    }
}

/// Store account that only records refresh calls
pub struct RecordingAccount {
    journal: Journal,
}

impl RecordingAccount {
    pub fn new(journal: Journal) -> Self {
        Self { journal }
    }
}

#[async_trait]
impl StoreAccount for RecordingAccount {
    async fn refresh(&self, shopware_version: &str, license_domain: &str) -> Result<()> {
        self.journal
            .push(format!("account refresh {} {}", shopware_version, license_domain));
        Ok(())
    }
}

/// One statement sent to a [`ScriptedDatabase`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<String>,
}

/// Database that records statements and answers queries from a script
#[derive(Default)]
pub struct ScriptedDatabase {
    statements: Mutex<Vec<Statement>>,
    answers: Mutex<Vec<(String, Vec<Row>)>>,
    tables: Mutex<Vec<String>>,
}

impl ScriptedDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer queries whose SQL contains `fragment` with `rows`
    pub fn answer(&self, fragment: &str, rows: &[&[Option<&str>]]) {
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|col| col.map(str::to_string)).collect())
            .collect();
        self.answers.lock().unwrap().push((fragment.to_string(), rows));
    }

    pub fn add_table(&self, table: &str) {
        self.tables.lock().unwrap().push(table.to_string());
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.statements.lock().unwrap().clone()
    }

    /// Last statement whose SQL starts with `prefix`
    pub fn last(&self, prefix: &str) -> Statement {
        self.statements()
            .into_iter()
            .rev()
            .find(|s| s.sql.starts_with(prefix))
            .unwrap_or_else(|| panic!("no {:?} statement in {:#?}", prefix, self.statements()))
    }

    fn record(&self, sql: &str, params: &[&str]) {
        self.statements.lock().unwrap().push(Statement {
            sql: sql.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
        });
    }
}

#[async_trait]
impl Database for ScriptedDatabase {
    async fn query(&self, sql: &str, params: &[&str]) -> Result<Vec<Row>> {
        self.record(sql, params);
        Ok(self
            .answers
            .lock()
            .unwrap()
            .iter()
            .find(|(fragment, _)| sql.contains(fragment.as_str()))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default())
    }

    async fn execute(&self, sql: &str, params: &[&str]) -> Result<()> {
        self.record(sql, params);
        Ok(())
    }

    async fn schema_has_table(&self, table: &str) -> Result<bool> {
        Ok(self.tables.lock().unwrap().iter().any(|t| t == table))
    }
}
