//! Shared test utilities for stagehand-runtime integration tests

#![allow(dead_code)]

pub mod mocks;

use std::sync::Arc;

use stagehand_core::types::{DeploymentEnvironment, ProjectConfig};
use stagehand_extensions::ExtensionUnit;
use stagehand_runtime::{Collaborators, DeploymentOrchestrator};

pub use mocks::*;

pub const CURRENT_VERSION: &str = "6.6.4.0";

/// A fully wired set of in-memory collaborators
pub struct Harness {
    pub journal: Journal,
    pub shop: Arc<FakeExtensions>,
    pub runner: Arc<RecordingRunner>,
    pub state: Arc<MemoryState>,
    pub config_store: Arc<MemoryConfigStore>,
    pub ledger: Arc<MemoryLedger>,
    pub account: Arc<RecordingAccount>,
}

impl Harness {
    /// Fresh environment with nothing installed
    pub fn new() -> Self {
        Self::with_shop(FakeExtensions::new())
    }

    pub fn with_shop(shop: FakeExtensions) -> Self {
        let journal = Journal::default();
        let shop = Arc::new(shop);
        Self {
            runner: Arc::new(RecordingRunner::new(journal.clone()).with_shop(shop.clone())),
            state: Arc::new(MemoryState::new(journal.clone(), shop.clone(), CURRENT_VERSION)),
            config_store: Arc::new(MemoryConfigStore::new()),
            ledger: Arc::new(MemoryLedger::new(journal.clone())),
            account: Arc::new(RecordingAccount::new(journal.clone())),
            shop,
            journal,
        }
    }

    /// Shop installed at `previous` (`None` = no recorded baseline)
    pub fn installed(self, previous: Option<&str>) -> Self {
        self.state.set_installed(previous);
        self
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            runner: self.runner.clone(),
            state: self.state.clone(),
            config_store: self.config_store.clone(),
            ledger: self.ledger.clone(),
            account: self.account.clone(),
            catalog: self.shop.clone(),
        }
    }

    pub fn orchestrator(
        &self,
        project: ProjectConfig,
        env: DeploymentEnvironment,
    ) -> DeploymentOrchestrator {
        DeploymentOrchestrator::new(self.collaborators(), project, env, "/srv/shop")
    }
}

/// Plugin not yet installed
pub fn plugin(name: &str, version: &str) -> ExtensionUnit {
    ExtensionUnit::new(name, version)
}

/// Plugin installed and active
pub fn active_plugin(name: &str, version: &str) -> ExtensionUnit {
    let mut unit = ExtensionUnit::new(name, version);
    unit.installed_at = Some("2024-01-01 00:00:00".to_string());
    unit.active = true;
    unit
}

/// Environment without any optional settings
pub fn plain_env() -> DeploymentEnvironment {
    DeploymentEnvironment::from_lookup(|_| None).unwrap()
}

/// Environment built from key/value pairs
pub fn env_with(pairs: &[(&str, &str)]) -> DeploymentEnvironment {
    let pairs: Vec<(String, String)> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    DeploymentEnvironment::from_lookup(move |key| {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    })
    .unwrap()
}
