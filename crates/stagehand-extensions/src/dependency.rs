//! Dependency ordering of extension units (Kahn's algorithm)

use std::collections::{BTreeMap, BTreeSet, HashMap};

use stagehand_core::{Error, Result};
use tracing::debug;

use crate::types::ExtensionUnit;

/// Orders units so that every unit follows the units it requires
///
/// Requirements are composer package names. Before matching, each name is
/// passed through the alias table (`replace` declarations from
/// `composer.lock`). Requirements on packages outside the catalog are
/// ignored. Among units whose dependencies are satisfied, the one that came
/// first in the input goes first, so the output is stable across runs.
#[derive(Debug, Default)]
pub struct DependencyResolver {
    aliases: BTreeMap<String, String>,
}

impl DependencyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver that maps replaced package names to their replacement
    pub fn with_aliases(aliases: BTreeMap<String, String>) -> Self {
        Self { aliases }
    }

    fn canonical<'a>(&'a self, requirement: &'a str) -> &'a str {
        self.aliases
            .get(requirement)
            .map(String::as_str)
            .unwrap_or(requirement)
    }

    /// Sort units into dependency order
    pub fn resolve(&self, units: Vec<ExtensionUnit>) -> Result<Vec<ExtensionUnit>> {
        let by_package: HashMap<&str, usize> = units
            .iter()
            .enumerate()
            .filter_map(|(i, u)| u.package_identifier.as_deref().map(|p| (p, i)))
            .collect();

        // dependents[i] = units that require unit i
        let mut dependents: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); units.len()];
        let mut in_degree = vec![0usize; units.len()];

        for (i, unit) in units.iter().enumerate() {
            let deps: BTreeSet<usize> = unit
                .requires
                .iter()
                .filter_map(|r| by_package.get(self.canonical(r)).copied())
                .filter(|&dep| dep != i)
                .collect();

            in_degree[i] = deps.len();
            for dep in deps {
                dependents[dep].insert(i);
            }
        }

        let mut ready: BTreeSet<usize> = (0..units.len()).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(units.len());

        while let Some(next) = ready.pop_first() {
            order.push(next);
            for &dependent in &dependents[next] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        if order.len() < units.len() {
            let stuck: Vec<&str> = (0..units.len())
                .filter(|&i| in_degree[i] > 0)
                .map(|i| units[i].name.as_str())
                .collect();
            return Err(Error::circular_dependency(stuck.join(", ")));
        }

        debug!("Resolved dependency order for {} units", order.len());

        let mut slots: Vec<Option<ExtensionUnit>> = units.into_iter().map(Some).collect();
        Ok(order
            .into_iter()
            .filter_map(|i| slots[i].take())
            .collect())
    }
}
