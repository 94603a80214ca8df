//! Explicit dependency graph and deterministic plans
//!
//! Dependencies are read off each resource's references (plus explicit
//! edges). [`DependencyGraph::plan`] orders resources with Kahn's
//! algorithm; among resources that are ready at the same time, the one with
//! the lower [`ResourceKind::create_priority`] goes first, then the one with
//! the lower name, so the same stack always produces the same plan.

use crate::error::PlanError;
use crate::resources::Resource;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use workshop_common::ResourceKind;

#[derive(Debug, Clone)]
struct Node {
    kind: ResourceKind,
    dependencies: BTreeSet<String>,
}

/// Resources keyed by logical name with their dependency sets
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    nodes: BTreeMap<String, Node>,
}

/// Direction of a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PlanAction {
    Create,
    Delete,
}

/// One step of a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanStep {
    pub name: String,
    pub kind: ResourceKind,
    /// Depth in the DAG: 0 for resources with no dependencies. Steps in the
    /// same wave are independent of each other.
    pub wave: usize,
    pub depends_on: Vec<String>,
}

/// Ordered list of steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub action: PlanAction,
    pub steps: Vec<PlanStep>,
}

impl Plan {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }

    /// Position of a resource in the plan
    pub fn position(&self, name: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.name == name)
    }

    /// Number of waves (longest dependency chain)
    pub fn wave_count(&self) -> usize {
        self.steps.iter().map(|s| s.wave + 1).max().unwrap_or(0)
    }

    /// The same steps in reverse order, for tearing the stack down
    pub fn reversed(&self) -> Self {
        Self {
            action: match self.action {
                PlanAction::Create => PlanAction::Delete,
                PlanAction::Delete => PlanAction::Create,
            },
            steps: self.steps.iter().rev().cloned().collect(),
        }
    }
}

impl DependencyGraph {
    /// Build the graph, rejecting duplicate names and dangling dependencies
    pub fn build(resources: &[Resource]) -> Result<Self, PlanError> {
        let mut nodes = BTreeMap::new();
        for resource in resources {
            let node = Node {
                kind: resource.kind(),
                dependencies: resource.dependencies(),
            };
            if nodes.insert(resource.name().to_string(), node).is_some() {
                return Err(PlanError::DuplicateName(resource.name().to_string()));
            }
        }

        for (name, node) in &nodes {
            if let Some(missing) = node.dependencies.iter().find(|d| !nodes.contains_key(*d)) {
                return Err(PlanError::UnknownDependency {
                    resource: name.clone(),
                    dependency: missing.clone(),
                });
            }
        }

        Ok(Self { nodes })
    }


    /// Create order
    pub fn plan(&self) -> Result<Plan, PlanError> {
        let mut in_degree: BTreeMap<&str, usize> = self
            .nodes
            .iter()
            .map(|(name, node)| (name.as_str(), node.dependencies.len()))
            .collect();

        let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (name, node) in &self.nodes {
            for dep in &node.dependencies {
                dependents.entry(dep.as_str()).or_default().push(name.as_str());
            }
        }

        let mut ready: BTreeSet<(u8, &str)> = in_degree
            .iter()
            .filter(|&(_, &degree)| degree == 0)
            .map(|(&name, _)| (self.nodes[name].kind.create_priority(), name))
            .collect();

        let mut waves: BTreeMap<&str, usize> = BTreeMap::new();
        let mut steps = Vec::with_capacity(self.nodes.len());

        while let Some(entry) = ready.pop_first() {
            let name = entry.1;
            let node = &self.nodes[name];
            let wave = node
                .dependencies
                .iter()
                .map(|d| waves[d.as_str()] + 1)
                .max()
                .unwrap_or(0);
            waves.insert(name, wave);

            steps.push(PlanStep {
                name: name.to_string(),
                kind: node.kind,
                wave,
                depends_on: node.dependencies.iter().cloned().collect(),
            });

            for &dependent in dependents.get(name).map(Vec::as_slice).unwrap_or_default() {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert((self.nodes[dependent].kind.create_priority(), dependent));
                    }
                }
            }
        }

        if steps.len() != self.nodes.len() {
            let remaining = in_degree
                .into_iter()
                .filter(|&(_, degree)| degree > 0)
                .map(|(name, _)| name.to_string())
                .collect();
            return Err(PlanError::Cycle { remaining });
        }

        Ok(Plan {
            action: PlanAction::Create,
            steps,
        })
    }

    /// Delete order: the exact reverse of the create order
    pub fn destroy_plan(&self) -> Result<Plan, PlanError> {
        Ok(self.plan()?.reversed())
    }
}
