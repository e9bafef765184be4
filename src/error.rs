use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("unknown dependency type '{value}' for task '{task_id}'")]
    UnknownDependencyType { task_id: String, value: String },

    #[error("unknown orchestration mode '{0}'")]
    UnknownMode(String),

    #[error("workflow definition has no mode and legacy classification is disabled")]
    MissingMode,

    #[error("agent setup failed for {kind} (task '{task_id}'): {reason}")]
    AgentSetup {
        kind: crate::agent::AgentKind,
        task_id: String,
        reason: String,
    },

    #[error("agent error: {0}")]
    Agent(String),

    #[error("condition evaluation failed: {0}")]
    Condition(String),

    #[error("task '{task_id}' failed after {attempts} attempt(s): {error}")]
    TaskExecution {
        task_id: String,
        attempts: u32,
        error: String,
    },

    #[error("workflow '{workflow_id}' cancelled")]
    WorkflowCancelled { workflow_id: String },

    #[error("workflow '{workflow_id}' timed out after {timeout:?}")]
    WorkflowTimeout {
        workflow_id: String,
        timeout: Duration,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
