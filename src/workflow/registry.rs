//! Active-workflow tracking and the append-only history log.
//!
//! A workflow is registered when execution begins and archived exactly once
//! when it finishes, whatever its final status. Failed and cancelled runs
//! stay inspectable through the history even though the caller also sees
//! an error.

use std::collections::HashMap;

use super::types::{Workflow, WorkflowId};

#[derive(Debug, Default)]
pub struct WorkflowRegistry {
    active: HashMap<WorkflowId, Workflow>,
    history: Vec<Workflow>,
}

impl WorkflowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a workflow as in flight. The stored copy is a snapshot; the
    /// executor archives the final state when the run ends.
    pub fn register(&mut self, workflow: Workflow) {
        tracing::debug!(workflow_id = %workflow.id, "workflow registered");
        self.active.insert(workflow.id.clone(), workflow);
    }

    /// Move a finished workflow out of the active set and into history.
    ///
    /// Unconditional cleanup: called for completed, failed, and cancelled
    /// runs alike.
    pub fn archive(&mut self, workflow: Workflow) {
        self.active.remove(&workflow.id);
        tracing::info!(
            workflow_id = %workflow.id,
            status = %workflow.status,
            "workflow archived"
        );
        self.history.push(workflow);
    }

    pub fn is_active(&self, id: &WorkflowId) -> bool {
        self.active.contains_key(id)
    }

    pub fn active_ids(&self) -> Vec<WorkflowId> {
        self.active.keys().cloned().collect()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn history(&self) -> &[Workflow] {
        &self.history
    }

    pub fn find_in_history(&self, id: &WorkflowId) -> Option<&Workflow> {
        self.history.iter().find(|w| &w.id == id)
    }
}
