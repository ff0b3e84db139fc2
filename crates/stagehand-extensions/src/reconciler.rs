//! Desired-versus-installed diff producing lifecycle actions

use std::collections::HashMap;

use crate::policy::ExtensionPolicy;
use crate::types::{ExtensionKind, ExtensionUnit, InstalledRecord, LifecycleAction, Pass};
use crate::version;

/// What to do with a unit that is installed but inactive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InactiveHandling {
    /// Activate the unit directly
    Activate,
    /// Issue one bulk refresh for all such units
    Refresh,
}

/// How pending updates are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateHandling {
    /// One `Update` per outdated unit
    PerUnit,
    /// One `Refresh` when any unit is outdated
    BulkRefresh,
}

/// Per-kind reconciliation behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileStrategy {
    pub inactive: InactiveHandling,
    pub updates: UpdateHandling,
}

impl ReconcileStrategy {
    pub fn plugin() -> Self {
        Self {
            inactive: InactiveHandling::Activate,
            updates: UpdateHandling::PerUnit,
        }
    }

    pub fn app() -> Self {
        Self {
            inactive: InactiveHandling::Activate,
            updates: UpdateHandling::BulkRefresh,
        }
    }

    pub fn for_kind(kind: ExtensionKind) -> Self {
        match kind {
            ExtensionKind::Plugin => Self::plugin(),
            ExtensionKind::App => Self::app(),
        }
    }
}

/// Computes the ordered actions of one reconciliation pass
///
/// The reconciler is pure: it never touches the system, and the same inputs
/// always produce the same actions in the same order.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleReconciler<'a> {
    policy: ExtensionPolicy<'a>,
    strategy: ReconcileStrategy,
}

impl<'a> LifecycleReconciler<'a> {
    pub fn new(policy: ExtensionPolicy<'a>, strategy: ReconcileStrategy) -> Self {
        Self { policy, strategy }
    }

    pub fn plan(
        &self,
        pass: Pass,
        catalog: &[ExtensionUnit],
        installed: &[InstalledRecord],
    ) -> Vec<LifecycleAction> {
        match pass {
            Pass::Install => self.plan_install(catalog, installed),
            Pass::Update => self.plan_update(catalog, installed),
            Pass::Deactivate => self.plan_deactivate(installed),
            Pass::Remove => self.plan_remove(installed),
        }
    }

    pub fn plan_install(
        &self,
        catalog: &[ExtensionUnit],
        installed: &[InstalledRecord],
    ) -> Vec<LifecycleAction> {
        let installed = index(installed);
        let mut actions = Vec::new();
        let mut refresh = false;

        for unit in catalog {
            let name = unit.name.as_str();
            if !self.policy.can_install(name) {
                continue;
            }

            match installed.get(name) {
                Some(record) if record.active => {}
                Some(_) => {
                    if !self.policy.can_activate(name) {
                        continue;
                    }
                    match self.strategy.inactive {
                        InactiveHandling::Activate => actions.push(LifecycleAction::Activate {
                            name: name.to_string(),
                        }),
                        InactiveHandling::Refresh => refresh = true,
                    }
                }
                None => actions.push(LifecycleAction::Install {
                    name: name.to_string(),
                    activate: self.policy.can_activate(name),
                }),
            }
        }

        if refresh {
            actions.push(LifecycleAction::Refresh);
        }
        actions
    }

    pub fn plan_update(
        &self,
        catalog: &[ExtensionUnit],
        installed: &[InstalledRecord],
    ) -> Vec<LifecycleAction> {
        let installed = index(installed);
        let mut actions = Vec::new();
        let mut refresh = false;

        for unit in catalog {
            let name = unit.name.as_str();
            if !self.policy.can_install(name) {
                continue;
            }

            if self.policy.should_force_update(name) {
                actions.push(LifecycleAction::Update {
                    name: name.to_string(),
                    forced: true,
                });
                continue;
            }

            let Some(record) = installed.get(name) else {
                continue;
            };

            let available = unit.upgrade_version.as_deref().unwrap_or(&unit.version);
            if !version::is_newer(available, &record.version) {
                continue;
            }

            match self.strategy.updates {
                UpdateHandling::PerUnit => actions.push(LifecycleAction::Update {
                    name: name.to_string(),
                    forced: false,
                }),
                UpdateHandling::BulkRefresh => refresh = true,
            }
        }

        if refresh {
            actions.push(LifecycleAction::Refresh);
        }
        actions
    }

    pub fn plan_deactivate(&self, installed: &[InstalledRecord]) -> Vec<LifecycleAction> {
        installed
            .iter()
            .filter(|record| record.active && self.policy.can_deactivate(&record.name))
            .map(|record| LifecycleAction::Deactivate {
                name: record.name.clone(),
            })
            .collect()
    }

    pub fn plan_remove(&self, installed: &[InstalledRecord]) -> Vec<LifecycleAction> {
        installed
            .iter()
            .filter(|record| self.policy.can_remove(&record.name))
            .map(|record| LifecycleAction::Remove {
                name: record.name.clone(),
                keep_user_data: self.policy.keep_user_data(&record.name),
            })
            .collect()
    }
}

/// Installed records derived from a catalog that carries install markers
pub fn installed_from_catalog(catalog: &[ExtensionUnit]) -> Vec<InstalledRecord> {
    catalog
        .iter()
        .filter(|unit| unit.is_installed())
        .map(InstalledRecord::from)
        .collect()
}

fn index(records: &[InstalledRecord]) -> HashMap<&str, &InstalledRecord> {
    records.iter().map(|r| (r.name.as_str(), r)).collect()
}
