//! Multi-agent workflow orchestration.
//!
//! Callers submit a natural-language task plus a structured workflow
//! definition; the [`Orchestrator`] classifies the orchestration type,
//! parses the task list, provisions agents from a pool keyed by
//! `(agent kind, task id)`, and drives sequential, parallel, or conditional
//! execution. Every run is archived into an inspectable registry whether it
//! completed, failed, timed out, or was cancelled.
//!
//! Concrete agents live behind the [`ManagedAgent`] / [`AgentFactory`]
//! seam and are supplied by the caller.

pub mod agent;
pub mod condition;
pub mod config;
pub mod error;
pub mod executor;
pub mod pool;
pub mod task;
pub mod workflow;

pub use agent::{AgentFactory, AgentKind, ExecutionResult, ManagedAgent, Parameters};
pub use condition::{Condition, ConditionEvaluator, ConditionKind};
pub use config::OrchestratorConfig;
pub use error::{Error, Result};
pub use executor::{Orchestrator, OrchestratorStats};
pub use pool::AgentPool;
pub use task::{parse_task_list, DependencyKind, TaskDescriptor, TaskSpec, TaskStatus};
pub use workflow::{
    OrchestrationType, Workflow, WorkflowDefinition, WorkflowId, WorkflowRegistry, WorkflowReport,
    WorkflowStatus,
};
