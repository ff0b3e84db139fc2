//! Plugin and app lifecycle management for stagehand
//!
//! This crate handles:
//! - Per-extension policy derived from project configuration
//! - Dependency ordering of plugins
//! - Inventory of plugins (console listing) and apps (manifests)
//! - Reconciliation of desired and installed state into lifecycle actions

pub mod dependency;
pub mod inventory;
pub mod policy;
pub mod reconciler;
pub mod types;
pub mod version;

pub use dependency::DependencyResolver;
pub use inventory::ExtensionInventory;
pub use policy::ExtensionPolicy;
pub use reconciler::{
    installed_from_catalog, InactiveHandling, LifecycleReconciler, ReconcileStrategy,
    UpdateHandling,
};
pub use types::{ExtensionKind, ExtensionUnit, InstalledRecord, LifecycleAction, Pass};
