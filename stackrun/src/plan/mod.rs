//! Execution planning
//!
//! This module handles:
//! - Building the dependency graph from `after` constraints
//! - Resolving a deterministic run order (and rejecting cycles)
//! - Narrowing the run order to the stacks selected for an invocation

pub mod graph;
pub mod select;

use crate::stack::{Stack, StackPath};

pub use graph::{DependencyGraph, StackNode};
pub use select::Selection;

/// An ordered sequence of stacks where every dependency precedes its
/// dependents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionPlan {
    stacks: Vec<Stack>,
}

impl ExecutionPlan {
    pub(crate) fn new(stacks: Vec<Stack>) -> Self {
        Self { stacks }
    }

    pub fn stacks(&self) -> &[Stack] {
        &self.stacks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Stack> {
        self.stacks.iter()
    }

    pub fn paths(&self) -> Vec<&StackPath> {
        self.stacks.iter().map(|s| &s.path).collect()
    }

    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// Keep only the stacks for which `keep` returns true, preserving order
    pub fn retain(mut self, keep: impl FnMut(&Stack) -> bool) -> Self {
        self.stacks.retain(keep);
        self
    }
}

impl<'a> IntoIterator for &'a ExecutionPlan {
    type Item = &'a Stack;
    type IntoIter = std::slice::Iter<'a, Stack>;

    fn into_iter(self) -> Self::IntoIter {
        self.stacks.iter()
    }
}
