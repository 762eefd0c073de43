//! Selection: narrowing a run order to the stacks an invocation acts on.
//!
//! Every projection keeps the relative order of the full plan and never adds
//! stacks. In particular, a selected stack does not pull in its unselected
//! dependencies: an unchanged dependency is assumed to already be applied.

use std::collections::BTreeSet;

use tracing::debug;

use super::ExecutionPlan;
use crate::stack::StackPath;

/// Criteria restricting which stacks of a plan are kept
#[derive(Debug, Clone, Default)]
pub struct Selection {
    changed: Option<BTreeSet<StackPath>>,
    scope: Option<StackPath>,
    ids: Option<BTreeSet<String>>,
}

impl Selection {
    /// Select everything
    pub fn all() -> Self {
        Self::default()
    }

    /// Keep only stacks in the change set. An empty set selects everything.
    pub fn changed(mut self, changed: BTreeSet<StackPath>) -> Self {
        self.changed = Some(changed);
        self
    }

    /// Keep only stacks at or below `dir`
    pub fn within(mut self, dir: StackPath) -> Self {
        self.scope = Some(dir);
        self
    }

    /// Keep only stacks whose logical id is in `ids`
    pub fn with_ids(mut self, ids: BTreeSet<String>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn apply(&self, plan: ExecutionPlan) -> ExecutionPlan {
        let before = plan.len();
        let mut plan = filter_changed(plan, self.changed.as_ref());
        if let Some(scope) = &self.scope {
            plan = filter_scope(plan, scope);
        }
        if let Some(ids) = &self.ids {
            plan = filter_ids(plan, ids);
        }
        debug!(before, after = plan.len(), "applied selection");
        plan
    }
}

/// Restrict `plan` to the change set. Absent or empty means "all stacks".
pub fn filter_changed(plan: ExecutionPlan, changed: Option<&BTreeSet<StackPath>>) -> ExecutionPlan {
    match changed {
        Some(changed) if !changed.is_empty() => plan.retain(|s| changed.contains(&s.path)),
        _ => plan,
    }
}

/// Restrict `plan` to stacks at or below `dir`
pub fn filter_scope(plan: ExecutionPlan, dir: &StackPath) -> ExecutionPlan {
    plan.retain(|s| s.path.is_within(dir))
}

/// Restrict `plan` to stacks with an id in `ids`; stacks without an id are
/// dropped.
pub fn filter_ids(plan: ExecutionPlan, ids: &BTreeSet<String>) -> ExecutionPlan {
    plan.retain(|s| s.id.as_ref().is_some_and(|id| ids.contains(id)))
}
