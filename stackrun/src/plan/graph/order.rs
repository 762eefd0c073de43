//! Run order resolution with cycle detection.
//!
//! Depth-first, dependencies first. Roots are the stacks no other stack
//! lists in `after`, visited in lexicographic path order; each stack visits
//! its `after` list in declared order before being emitted. A second pass
//! over all stacks in path order picks up whatever the first pass could not
//! reach, which only happens for stacks on (or behind) a cycle.

use std::collections::HashMap;

use super::{DependencyGraph, StackNode};
use crate::error::StackError;
use crate::plan::ExecutionPlan;
use crate::stack::StackPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    InProgress,
    Done,
}

struct Resolver<'g> {
    graph: &'g DependencyGraph,
    state: HashMap<&'g StackPath, VisitState>,
    /// Active recursion path, used to report cycles
    path: Vec<&'g StackPath>,
    order: Vec<&'g StackNode>,
}

pub(super) fn resolve(graph: &DependencyGraph) -> Result<ExecutionPlan, StackError> {
    let mut resolver = Resolver {
        graph,
        state: HashMap::with_capacity(graph.len()),
        path: Vec::new(),
        order: Vec::with_capacity(graph.len()),
    };

    for node in graph.nodes().filter(|n| n.dependents.is_empty()) {
        resolver.visit(node)?;
    }
    for node in graph.nodes() {
        resolver.visit(node)?;
    }

    Ok(ExecutionPlan::new(
        resolver.order.into_iter().map(|n| n.stack.clone()).collect(),
    ))
}

impl<'g> Resolver<'g> {
    fn visit(&mut self, node: &'g StackNode) -> Result<(), StackError> {
        let path = &node.stack.path;
        match self.state.get(path) {
            Some(VisitState::Done) => return Ok(()),
            Some(VisitState::InProgress) => return Err(self.cycle_error(path)),
            None => {}
        }

        self.state.insert(path, VisitState::InProgress);
        self.path.push(path);

        for dep in &node.after {
            if let Some(dep_node) = self.graph.get(dep) {
                self.visit(dep_node)?;
            }
        }

        self.path.pop();
        self.state.insert(path, VisitState::Done);
        self.order.push(node);
        Ok(())
    }

    /// Build the cycle from the first occurrence of `path` on the active
    /// recursion path back to `path` itself.
    fn cycle_error(&self, path: &StackPath) -> StackError {
        let start = self.path.iter().position(|p| *p == path).unwrap_or(0);
        let mut cycle: Vec<StackPath> = self.path[start..].iter().map(|p| (*p).clone()).collect();
        cycle.push(path.clone());
        StackError::Cycle { cycle }
    }
}
