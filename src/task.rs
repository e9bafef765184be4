//! Task data model and workflow-definition parsing.
//!
//! A caller submits raw [`TaskSpec`]s inside the workflow definition; the
//! parser turns them into validated [`TaskDescriptor`]s in input order.
//! Descriptors are mutated only by the executor and become immutable
//! history once their workflow is archived.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::{AgentKind, Parameters};
use crate::condition::Condition;
use crate::{Error, Result};

/// Per-task dependency tag, mirroring the workflow mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    #[default]
    Sequential,
    Parallel,
    Conditional,
}

impl std::str::FromStr for DependencyKind {
    type Err = Error;

    /// Strict parse: an unknown string is an error, never a silent default.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sequential" => Ok(DependencyKind::Sequential),
            "parallel" => Ok(DependencyKind::Parallel),
            "conditional" => Ok(DependencyKind::Conditional),
            other => Err(Error::UnknownDependencyType {
                task_id: String::new(),
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DependencyKind::Sequential => write!(f, "sequential"),
            DependencyKind::Parallel => write!(f, "parallel"),
            DependencyKind::Conditional => write!(f, "conditional"),
        }
    }
}

/// Task status in its lifecycle. Mutated only by the workflow executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
            TaskStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// One raw task entry as submitted by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_type: Option<String>,

    #[serde(default)]
    pub task: String,

    #[serde(default)]
    pub parameters: Parameters,

    #[serde(default)]
    pub dependencies: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency_type: Option<String>,

    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// A validated unit of work within one workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDescriptor {
    /// Unique within the workflow; synthesized as `task_<index>` when the
    /// caller omits it.
    pub id: String,

    /// Which agent implementation executes this task.
    pub agent_kind: AgentKind,

    /// Natural-language task text passed to the agent.
    pub task: String,

    /// Opaque keyword arguments forwarded to the agent.
    pub parameters: Parameters,

    /// Ids of tasks that must complete first. Stored and surfaced but not
    /// topologically enforced; callers order sequential tasks themselves.
    pub dependencies: Vec<String>,

    pub dependency_kind: DependencyKind,

    /// Only meaningful under conditional execution.
    pub conditions: Vec<Condition>,

    pub status: TaskStatus,

    /// Extra attempts consumed by the retry loop for this task.
    pub retry_count: u32,

    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TaskDescriptor {
    pub fn start(&mut self) {
        self.status = TaskStatus::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn complete(&mut self) {
        self.status = TaskStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    pub fn fail(&mut self) {
        self.status = TaskStatus::Failed;
        self.completed_at = Some(Utc::now());
    }

    pub fn cancel(&mut self) {
        self.status = TaskStatus::Cancelled;
        self.completed_at = Some(Utc::now());
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.status,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

/// Convert the caller-supplied task list into validated descriptors.
///
/// Output order matches input order; order is significant for sequential
/// and coordination modes. An absent or empty list is not an error. No
/// side effects: nothing is provisioned until execution begins.
pub fn parse_task_list(specs: &[TaskSpec]) -> Result<Vec<TaskDescriptor>> {
    let mut tasks = Vec::with_capacity(specs.len());

    for (index, spec) in specs.iter().enumerate() {
        let id = match &spec.id {
            Some(id) => id.clone(),
            None => format!("task_{index}"),
        };

        let dependency_kind = match &spec.dependency_type {
            Some(raw) => raw
                .parse::<DependencyKind>()
                .map_err(|_| Error::UnknownDependencyType {
                    task_id: id.clone(),
                    value: raw.clone(),
                })?,
            None => DependencyKind::Sequential,
        };

        let agent_kind = AgentKind::from_tag(spec.agent_type.as_deref().unwrap_or("SimpleAgent"));

        tasks.push(TaskDescriptor {
            id,
            agent_kind,
            task: spec.task.clone(),
            parameters: spec.parameters.clone(),
            dependencies: spec.dependencies.clone(),
            dependency_kind,
            conditions: spec.conditions.clone(),
            status: TaskStatus::Pending,
            retry_count: 0,
            started_at: None,
            completed_at: None,
        });
    }

    tracing::debug!(count = tasks.len(), "parsed workflow task list");
    Ok(tasks)
}
