//! Orchestrator configuration.
//!
//! All limits that the executor enforces live here: the parallel fan-out
//! cap, the whole-run deadline, and the per-task retry budget. The
//! `legacy_classification` flag keeps keyword sniffing of the task text
//! available for callers that do not pass an explicit mode.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Result;

fn default_max_concurrent() -> usize {
    5
}

fn default_workflow_timeout_secs() -> u64 {
    1800
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_legacy_classification() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Maximum number of agent executions in flight during parallel fan-out.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_agents: usize,

    /// Deadline for a whole workflow run, in seconds.
    #[serde(default = "default_workflow_timeout_secs")]
    pub workflow_timeout_secs: u64,

    /// Total attempts per task for infrastructure failures. Business
    /// failures (an agent returning `success: false`) are never retried.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Classify the orchestration type from task-text keywords when the
    /// definition carries no explicit mode. Disable to make a missing mode
    /// an error.
    #[serde(default = "default_legacy_classification")]
    pub legacy_classification: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_agents: default_max_concurrent(),
            workflow_timeout_secs: default_workflow_timeout_secs(),
            retry_attempts: default_retry_attempts(),
            legacy_classification: default_legacy_classification(),
        }
    }
}

impl OrchestratorConfig {
    pub fn workflow_timeout(&self) -> Duration {
        Duration::from_secs(self.workflow_timeout_secs)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "loading orchestrator config");
        if !path.exists() {
            tracing::debug!("config file not found, using defaults");
            return Ok(Self::default());
        }
        let config: Self = toml::from_str(&fs::read_to_string(path)?)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let toml = toml::to_string_pretty(self)?;
        fs::write(path, toml)?;
        Ok(())
    }
}
