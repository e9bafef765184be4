//! Core workflow type definitions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::ExecutionResult;
use crate::task::{TaskDescriptor, TaskSpec};
use crate::{Error, Result};

static WORKFLOW_SEQ: AtomicU64 = AtomicU64::new(0);

/// Unique identifier for one workflow execution.
///
/// Generated as `workflow_<timestamp>_<seq>`; the sequence number keeps ids
/// unique when several workflows start within the same second.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowId(pub String);

impl WorkflowId {
    pub fn generate() -> Self {
        let seq = WORKFLOW_SEQ.fetch_add(1, Ordering::Relaxed);
        Self(format!(
            "workflow_{}_{}",
            Utc::now().format("%Y%m%d_%H%M%S"),
            seq
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a workflow in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Created but execution has not begun.
    #[default]
    Pending,
    /// Task descriptors parsed, strategy running.
    Running,
    /// Strategy returned normally. Individual tasks may still have failed
    /// in parallel mode.
    Completed,
    /// Strategy raised; the error is recorded in the workflow's error list.
    Failed,
    /// Cancelled cooperatively mid-run.
    Cancelled,
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowStatus::Pending => write!(f, "pending"),
            WorkflowStatus::Running => write!(f, "running"),
            WorkflowStatus::Completed => write!(f, "completed"),
            WorkflowStatus::Failed => write!(f, "failed"),
            WorkflowStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Which execution algorithm drives a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestrationType {
    Coordination,
    Workflow,
    ParallelExecution,
    ConditionalExecution,
    General,
}

impl OrchestrationType {
    /// Classify free task text by keyword family, first match wins:
    /// coordination, then workflow, then parallel, then conditional.
    ///
    /// This is a heuristic, not a contract; callers needing determinism set
    /// an explicit mode on the definition instead.
    pub fn classify(task_text: &str) -> Self {
        let text = task_text.to_lowercase();
        let contains_any = |keywords: &[&str]| keywords.iter().any(|k| text.contains(k));

        if contains_any(&["coordinate", "manage", "orchestrate"]) {
            OrchestrationType::Coordination
        } else if contains_any(&["workflow", "pipeline", "sequence"]) {
            OrchestrationType::Workflow
        } else if contains_any(&["parallel", "concurrent", "simultaneous"]) {
            OrchestrationType::ParallelExecution
        } else if contains_any(&["conditional", "if", "when"]) {
            OrchestrationType::ConditionalExecution
        } else {
            OrchestrationType::General
        }
    }
}

impl std::str::FromStr for OrchestrationType {
    type Err = Error;

    /// Strict parse of an explicit mode string.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "coordination" => Ok(OrchestrationType::Coordination),
            "workflow" => Ok(OrchestrationType::Workflow),
            "parallel_execution" => Ok(OrchestrationType::ParallelExecution),
            "conditional_execution" => Ok(OrchestrationType::ConditionalExecution),
            "general" => Ok(OrchestrationType::General),
            other => Err(Error::UnknownMode(other.to_string())),
        }
    }
}

impl std::fmt::Display for OrchestrationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrchestrationType::Coordination => write!(f, "coordination"),
            OrchestrationType::Workflow => write!(f, "workflow"),
            OrchestrationType::ParallelExecution => write!(f, "parallel_execution"),
            OrchestrationType::ConditionalExecution => write!(f, "conditional_execution"),
            OrchestrationType::General => write!(f, "general"),
        }
    }
}

/// The structured workflow block submitted by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// Explicit orchestration mode. Takes precedence over keyword
    /// classification and parses strictly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    #[serde(default)]
    pub tasks: Vec<TaskSpec>,
}

/// One orchestrated run of a set of tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    pub status: WorkflowStatus,

    /// The original natural-language request.
    pub task_text: String,

    pub orchestration_type: OrchestrationType,

    /// The raw caller-supplied definition, kept for inspection.
    pub definition: WorkflowDefinition,

    pub created_at: DateTime<Utc>,

    /// Populated once the definition is parsed.
    pub tasks: Vec<TaskDescriptor>,

    pub results: HashMap<String, ExecutionResult>,

    pub errors: Vec<String>,
}

impl Workflow {
    pub fn new(
        task_text: &str,
        orchestration_type: OrchestrationType,
        definition: WorkflowDefinition,
    ) -> Self {
        Self {
            id: WorkflowId::generate(),
            status: WorkflowStatus::Pending,
            task_text: task_text.to_string(),
            orchestration_type,
            definition,
            created_at: Utc::now(),
            tasks: Vec::new(),
            results: HashMap::new(),
            errors: Vec::new(),
        }
    }
}

/// The caller-visible outcome of a workflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowReport {
    pub workflow_id: WorkflowId,
    pub workflow_type: OrchestrationType,

    /// Per-task results keyed by task id.
    pub results: HashMap<String, ExecutionResult>,

    /// Count of results whose `success` flag is true (parallel mode) or of
    /// non-skipped entries (conditional mode).
    pub completed_tasks: usize,

    pub total_tasks: usize,
}
