//! Dependency graph for managing stack ordering constraints

mod order;


use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::ExecutionPlan;
use crate::error::{StackError, UnresolvedReason};
use crate::stack::{Registry, Stack, StackPath};

/// A node in the dependency graph
#[derive(Debug, Clone)]
pub struct StackNode {
    pub stack: Stack,
    /// Resolved `after` references, in declared order, without duplicates
    pub after: Vec<StackPath>,
    /// Stacks that list this one in their `after`
    pub dependents: BTreeSet<StackPath>,
}

/// Dependency graph: an edge `u -> v` means `u` must run before `v`
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: BTreeMap<StackPath, StackNode>,
}

impl DependencyGraph {
    /// Build the graph from a registry, resolving every `after` reference.
    ///
    /// Fails on the first reference (in path order, then declared order)
    /// that does not name a discovered stack. Cycles are not checked here.
    pub fn build(registry: &Registry) -> Result<Self, StackError> {
        let mut nodes = BTreeMap::new();

        // First pass: resolve references
        for stack in registry.iter() {
            let mut after: Vec<StackPath> = Vec::with_capacity(stack.after.len());
            for reference in &stack.after {
                let target = resolve_reference(registry, stack, reference)?;
                if !after.contains(&target) {
                    after.push(target);
                }
            }

            nodes.insert(
                stack.path.clone(),
                StackNode {
                    stack: stack.clone(),
                    after,
                    dependents: BTreeSet::new(),
                },
            );
        }

        // Second pass: reverse edges
        let edges: Vec<(StackPath, StackPath)> = nodes
            .values()
            .flat_map(|node| {
                node.after
                    .iter()
                    .map(|dep| (dep.clone(), node.stack.path.clone()))
            })
            .collect();
        for (dep, dependent) in edges {
            if let Some(node) = nodes.get_mut(&dep) {
                node.dependents.insert(dependent);
            }
        }

        debug!(nodes = nodes.len(), "built dependency graph");
        Ok(Self { nodes })
    }

    /// Resolve the full run order, covering every stack exactly once
    pub fn run_order(&self) -> Result<ExecutionPlan, StackError> {
        order::resolve(self)
    }

    pub fn get(&self, path: &StackPath) -> Option<&StackNode> {
        self.nodes.get(path)
    }

    /// Nodes in lexicographic path order
    pub fn nodes(&self) -> impl Iterator<Item = &StackNode> {
        self.nodes.values()
    }

    /// Direct dependencies of `path`, in declared order
    pub fn dependencies(&self, path: &StackPath) -> &[StackPath] {
        self.nodes
            .get(path)
            .map(|n| n.after.as_slice())
            .unwrap_or_default()
    }

    /// Every `(before, after)` edge of the graph
    pub fn edges(&self) -> Vec<(&StackPath, &StackPath)> {
        self.nodes
            .values()
            .flat_map(|node| node.after.iter().map(move |dep| (dep, &node.stack.path)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

fn resolve_reference(
    registry: &Registry,
    stack: &Stack,
    reference: &str,
) -> Result<StackPath, StackError> {
    let unresolved = |reason| StackError::UnresolvedReference {
        stack: stack.path.clone(),
        reference: reference.to_string(),
        reason,
    };

    let target = stack
        .path
        .resolve(reference)
        .ok_or_else(|| unresolved(UnresolvedReason::OutsideProject))?;

    if !registry.contains(&target) {
        return Err(unresolved(UnresolvedReason::NotAStack));
    }

    Ok(target)
}
