//! Test fixtures for integration tests.
//!
//! Provides recording fake agents and factories. Agents react to keywords
//! in the task text: "explode" makes `run` return an infrastructure error,
//! "reject" makes it return a business failure (`success: false`), anything
//! else succeeds after the configured delay.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use orchestra::{
    AgentFactory, AgentKind, Error, ExecutionResult, ManagedAgent, OrchestratorConfig, Parameters,
    Result, TaskSpec, WorkflowDefinition,
};

/// One recorded agent call with entry/exit timestamps.
#[derive(Debug, Clone)]
pub struct CallRecord {
    pub agent: String,
    pub task: String,
    pub started: Instant,
    pub finished: Instant,
}

pub type CallLog = Arc<Mutex<Vec<CallRecord>>>;

pub struct RecordingAgent {
    name: String,
    delay: Duration,
    calls: CallLog,
    setups: Arc<Mutex<HashMap<String, u32>>>,
    cleanups: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ManagedAgent for RecordingAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn setup(&self) -> Result<()> {
        let mut setups = self.setups.lock().unwrap();
        *setups.entry(self.name.clone()).or_insert(0) += 1;
        Ok(())
    }

    async fn run(&self, task: &str, parameters: &Parameters) -> Result<ExecutionResult> {
        let started = Instant::now();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let outcome = if task.contains("explode") {
            Err(Error::Agent(format!("{} exploded", self.name)))
        } else if task.contains("reject") {
            Ok(ExecutionResult::failed("business rules said no"))
        } else {
            let mut data = Parameters::new();
            data.insert("agent".to_string(), serde_json::json!(self.name));
            data.insert("echo".to_string(), serde_json::json!(task));
            for (key, value) in parameters {
                data.insert(key.clone(), value.clone());
            }
            Ok(ExecutionResult::ok(data))
        };

        self.calls.lock().unwrap().push(CallRecord {
            agent: self.name.clone(),
            task: task.to_string(),
            started,
            finished: Instant::now(),
        });
        outcome
    }

    async fn cleanup(&self) -> Result<()> {
        self.cleanups.lock().unwrap().push(self.name.clone());
        Ok(())
    }
}

/// Factory producing [`RecordingAgent`]s that share one call log.
pub struct RecordingFactory {
    pub delay: Duration,
    pub calls: CallLog,
    pub setups: Arc<Mutex<HashMap<String, u32>>>,
    pub cleanups: Arc<Mutex<Vec<String>>>,
}

impl RecordingFactory {
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            calls: Arc::new(Mutex::new(Vec::new())),
            setups: Arc::new(Mutex::new(HashMap::new())),
            cleanups: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn setup_count(&self, agent_name: &str) -> u32 {
        *self.setups.lock().unwrap().get(agent_name).unwrap_or(&0)
    }
}

impl AgentFactory for RecordingFactory {
    fn create(&self, _kind: AgentKind, name: &str) -> Result<Arc<dyn ManagedAgent>> {
        Ok(Arc::new(RecordingAgent {
            name: name.to_string(),
            delay: self.delay,
            calls: Arc::clone(&self.calls),
            setups: Arc::clone(&self.setups),
            cleanups: Arc::clone(&self.cleanups),
        }))
    }
}

/// Build a task spec from JSON shorthand.
pub fn task_spec(json: serde_json::Value) -> TaskSpec {
    serde_json::from_value(json).expect("valid task spec")
}

/// Definition with an explicit mode and the given tasks.
pub fn definition(mode: &str, tasks: Vec<TaskSpec>) -> WorkflowDefinition {
    WorkflowDefinition {
        mode: Some(mode.to_string()),
        tasks,
    }
}

/// Definition without a mode, relying on legacy text classification.
pub fn unmoded_definition(tasks: Vec<TaskSpec>) -> WorkflowDefinition {
    WorkflowDefinition { mode: None, tasks }
}

/// A config without retries, so failure tests see the first error directly.
pub fn strict_config() -> OrchestratorConfig {
    OrchestratorConfig {
        retry_attempts: 1,
        ..OrchestratorConfig::default()
    }
}
