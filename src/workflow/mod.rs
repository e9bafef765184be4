//! Workflow data model, lifecycle tracking, and registry.

mod registry;
mod types;

pub use registry::WorkflowRegistry;
pub use types::{
    OrchestrationType, Workflow, WorkflowDefinition, WorkflowId, WorkflowReport, WorkflowStatus,
};
