//! The workflow executor.
//!
//! `Orchestrator` drives a workflow from submission to archive: it resolves
//! the orchestration type, parses the task list, dispatches tasks to pooled
//! agents according to the mode, and records every run in the registry
//! unconditionally, whether the run completed, failed, timed out, or was
//! cancelled.
//!
//! All shared state (agent pool, registry, condition RNG) is owned by the
//! orchestrator and mutated only through `&mut self`; cloning the
//! orchestrator across OS threads is not possible, so no internal locking
//! is needed.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::agent::{AgentFactory, ExecutionResult, ManagedAgent, Parameters};
use crate::condition::ConditionEvaluator;
use crate::config::OrchestratorConfig;
use crate::pool::AgentPool;
use crate::task::{parse_task_list, TaskDescriptor};
use crate::workflow::{
    OrchestrationType, Workflow, WorkflowDefinition, WorkflowRegistry, WorkflowReport,
    WorkflowStatus,
};
use crate::{Error, Result};

/// Snapshot of orchestrator-level counters and limits.
#[derive(Debug, Clone, Serialize)]
pub struct OrchestratorStats {
    pub managed_agents: usize,
    pub active_workflows: usize,
    pub archived_workflows: usize,
    pub max_concurrent_agents: usize,
    pub workflow_timeout_secs: u64,
    pub retry_attempts: u32,
}

enum RunOutcome {
    Finished(Result<WorkflowReport>),
    TimedOut,
    Cancelled,
}

pub struct Orchestrator {
    config: OrchestratorConfig,
    pool: AgentPool,
    registry: WorkflowRegistry,
    evaluator: ConditionEvaluator,
    cancel: CancellationToken,
}

impl Orchestrator {
    /// Build an orchestrator around an injected agent factory. No globals:
    /// everything the executor touches is passed in here.
    pub fn new(config: OrchestratorConfig, factory: Arc<dyn AgentFactory>) -> Self {
        Self {
            config,
            pool: AgentPool::new(factory),
            registry: WorkflowRegistry::new(),
            evaluator: ConditionEvaluator::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Seed the condition RNG for reproducible conditional workflows.
    pub fn with_condition_seed(mut self, seed: u64) -> Self {
        self.evaluator = ConditionEvaluator::with_seed(seed);
        self
    }

    /// Token that cancels in-flight workflow runs when triggered.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn registry(&self) -> &WorkflowRegistry {
        &self.registry
    }

    pub fn stats(&self) -> OrchestratorStats {
        OrchestratorStats {
            managed_agents: self.pool.len(),
            active_workflows: self.registry.active_count(),
            archived_workflows: self.registry.history().len(),
            max_concurrent_agents: self.config.max_concurrent_agents,
            workflow_timeout_secs: self.config.workflow_timeout_secs,
            retry_attempts: self.config.retry_attempts,
        }
    }

    /// Run one workflow to completion and archive it.
    ///
    /// The orchestration type comes from the definition's explicit `mode`
    /// when present (strict parse); otherwise from task-text keywords while
    /// `legacy_classification` is enabled. The workflow is archived into
    /// history whatever the outcome, so failed runs stay inspectable even
    /// though the caller also receives the error.
    pub async fn run(
        &mut self,
        task_text: &str,
        definition: WorkflowDefinition,
    ) -> Result<WorkflowReport> {
        let orchestration_type = match &definition.mode {
            Some(mode) => mode.parse::<OrchestrationType>()?,
            None if self.config.legacy_classification => OrchestrationType::classify(task_text),
            None => return Err(Error::MissingMode),
        };

        let mut workflow = Workflow::new(task_text, orchestration_type, definition);
        let workflow_id = workflow.id.clone();
        tracing::info!(
            workflow_id = %workflow_id,
            orchestration_type = %orchestration_type,
            "workflow submitted"
        );
        self.registry.register(workflow.clone());

        let timeout = self.config.workflow_timeout();
        let cancel = self.cancel.clone();
        let outcome = tokio::select! {
            _ = cancel.cancelled() => RunOutcome::Cancelled,
            finished = tokio::time::timeout(timeout, self.execute(&mut workflow)) => {
                match finished {
                    Ok(result) => RunOutcome::Finished(result),
                    Err(_) => RunOutcome::TimedOut,
                }
            }
        };

        let result = match outcome {
            RunOutcome::Finished(Ok(report)) => {
                workflow.status = WorkflowStatus::Completed;
                workflow.results = report.results.clone();
                Ok(report)
            }
            RunOutcome::Finished(Err(e)) => {
                workflow.status = WorkflowStatus::Failed;
                workflow.errors.push(e.to_string());
                Err(e)
            }
            RunOutcome::TimedOut => {
                let e = Error::WorkflowTimeout {
                    workflow_id: workflow_id.to_string(),
                    timeout,
                };
                workflow.status = WorkflowStatus::Failed;
                workflow.errors.push(e.to_string());
                cancel_unfinished(&mut workflow.tasks);
                Err(e)
            }
            RunOutcome::Cancelled => {
                let e = Error::WorkflowCancelled {
                    workflow_id: workflow_id.to_string(),
                };
                workflow.status = WorkflowStatus::Cancelled;
                workflow.errors.push(e.to_string());
                cancel_unfinished(&mut workflow.tasks);
                Err(e)
            }
        };

        // Unconditional cleanup: the finished workflow always leaves the
        // active set and lands in history.
        self.registry.archive(workflow);
        result
    }

    /// Tear down every managed agent, best-effort.
    pub async fn shutdown(&mut self) {
        tracing::info!("orchestrator shutting down");
        self.pool.cleanup_all().await;
    }

    /// Parse the task list, then drive the strategy for the workflow's
    /// orchestration type. Returns the caller-visible report, or the first
    /// orchestration-level error.
    async fn execute(&mut self, workflow: &mut Workflow) -> Result<WorkflowReport> {
        // Fail fast on malformed specs, before any agent is provisioned.
        workflow.tasks = parse_task_list(&workflow.definition.tasks)?;
        workflow.status = WorkflowStatus::Running;
        tracing::debug!(
            workflow_id = %workflow.id,
            tasks = workflow.tasks.len(),
            "workflow running"
        );

        match workflow.orchestration_type {
            OrchestrationType::Coordination
            | OrchestrationType::Workflow
            | OrchestrationType::General => self.run_sequential(workflow).await,
            OrchestrationType::ParallelExecution => self.run_parallel(workflow).await,
            OrchestrationType::ConditionalExecution => self.run_conditional(workflow).await,
        }
    }

    /// Sequential execution, shared by coordination, workflow, and general
    /// modes: strict program order, first infrastructure failure aborts the
    /// run. Business failures (`success: false`) are recorded and do not
    /// abort.
    async fn run_sequential(&mut self, workflow: &mut Workflow) -> Result<WorkflowReport> {
        let max_attempts = self.config.retry_attempts.max(1);

        for task in &mut workflow.tasks {
            let agent = self.pool.get_or_create(task.agent_kind, &task.id).await?;

            task.start();
            match run_with_retry(agent.as_ref(), task, max_attempts).await {
                Ok(result) => {
                    workflow.results.insert(task.id.clone(), result);
                    task.complete();
                }
                Err(e) => {
                    task.fail();
                    return Err(e);
                }
            }
        }

        Ok(WorkflowReport {
            workflow_id: workflow.id.clone(),
            workflow_type: workflow.orchestration_type,
            results: workflow.results.clone(),
            completed_tasks: workflow.tasks.len(),
            total_tasks: workflow.tasks.len(),
        })
    }

    /// Parallel execution: every task is launched before any is awaited,
    /// capped by `max_concurrent_agents`. A failing branch is converted
    /// into a synthetic failed result and never aborts its siblings.
    async fn run_parallel(&mut self, workflow: &mut Workflow) -> Result<WorkflowReport> {
        let max_attempts = self.config.retry_attempts.max(1);
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_agents.max(1)));

        // Provision agents up front, in task order. A provisioning failure
        // fails only that branch.
        let mut branches: Vec<std::result::Result<Arc<dyn ManagedAgent>, String>> = Vec::new();
        for task in &workflow.tasks {
            branches.push(
                self.pool
                    .get_or_create(task.agent_kind, &task.id)
                    .await
                    .map_err(|e| e.to_string()),
            );
        }

        for task in &mut workflow.tasks {
            task.start();
        }

        // Fan-out. join_all preserves input order, so results line up with
        // the original task indexes no matter the completion order.
        let futures = workflow
            .tasks
            .iter()
            .zip(branches)
            .map(|(task, branch)| {
                let semaphore = Arc::clone(&semaphore);
                let task_text = task.task.clone();
                let parameters = task.parameters.clone();
                let task_id = task.id.clone();
                async move {
                    let agent = match branch {
                        Ok(agent) => agent,
                        Err(reason) => return (0, Err(reason)),
                    };
                    let _permit = match semaphore.acquire().await {
                        Ok(permit) => permit,
                        Err(e) => return (0, Err(format!("fan-out semaphore closed: {e}"))),
                    };
                    run_detached_with_retry(agent, &task_id, &task_text, &parameters, max_attempts)
                        .await
                }
            })
            .collect::<Vec<_>>();
        let outcomes = futures::future::join_all(futures).await;

        // Fan-in: write results back under the original task ids.
        for (task, (retries, outcome)) in workflow.tasks.iter_mut().zip(outcomes) {
            task.retry_count += retries;
            match outcome {
                Ok(result) => {
                    workflow.results.insert(task.id.clone(), result);
                    task.complete();
                }
                Err(message) => {
                    tracing::warn!(task_id = %task.id, error = %message, "parallel branch failed");
                    workflow
                        .results
                        .insert(task.id.clone(), ExecutionResult::failed(message));
                    task.fail();
                }
            }
        }

        let completed_tasks = workflow.results.values().filter(|r| r.success).count();
        Ok(WorkflowReport {
            workflow_id: workflow.id.clone(),
            workflow_type: workflow.orchestration_type,
            results: workflow.results.clone(),
            completed_tasks,
            total_tasks: workflow.tasks.len(),
        })
    }

    /// Conditional execution: each task's condition list gates it
    /// individually; skipped tasks are marked cancelled with a
    /// `condition_not_met` result. Executed tasks follow sequential
    /// semantics, including abort-on-raise.
    async fn run_conditional(&mut self, workflow: &mut Workflow) -> Result<WorkflowReport> {
        let max_attempts = self.config.retry_attempts.max(1);

        for task in &mut workflow.tasks {
            if !self.evaluator.satisfied(&task.conditions) {
                tracing::debug!(task_id = %task.id, "condition not met, skipping task");
                workflow
                    .results
                    .insert(task.id.clone(), ExecutionResult::skipped("condition_not_met"));
                task.cancel();
                continue;
            }

            let agent = self.pool.get_or_create(task.agent_kind, &task.id).await?;

            task.start();
            match run_with_retry(agent.as_ref(), task, max_attempts).await {
                Ok(result) => {
                    workflow.results.insert(task.id.clone(), result);
                    task.complete();
                }
                Err(e) => {
                    task.fail();
                    return Err(e);
                }
            }
        }

        let completed_tasks = workflow.results.values().filter(|r| !r.skipped).count();
        Ok(WorkflowReport {
            workflow_id: workflow.id.clone(),
            workflow_type: workflow.orchestration_type,
            results: workflow.results.clone(),
            completed_tasks,
            total_tasks: workflow.tasks.len(),
        })
    }
}

/// Bounded retry around one agent execution. Only infrastructure failures
/// (the agent returning `Err`) consume attempts; a returned result is final
/// whatever its `success` flag says.
async fn run_with_retry(
    agent: &dyn ManagedAgent,
    task: &mut TaskDescriptor,
    max_attempts: u32,
) -> Result<ExecutionResult> {
    let mut attempt = 1;
    loop {
        match agent.run(&task.task, &task.parameters).await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < max_attempts => {
                tracing::warn!(
                    task_id = %task.id,
                    attempt,
                    error = %e,
                    "task attempt failed, retrying"
                );
                task.retry_count += 1;
                attempt += 1;
            }
            Err(e) => {
                return Err(Error::TaskExecution {
                    task_id: task.id.clone(),
                    attempts: attempt,
                    error: e.to_string(),
                })
            }
        }
    }
}

/// Retry loop for parallel branches, which cannot hold a mutable borrow of
/// the descriptor. Returns the retries consumed alongside the outcome; the
/// error is already stringly-typed for the synthetic failed result.
async fn run_detached_with_retry(
    agent: Arc<dyn ManagedAgent>,
    task_id: &str,
    task_text: &str,
    parameters: &Parameters,
    max_attempts: u32,
) -> (u32, std::result::Result<ExecutionResult, String>) {
    let mut retries = 0;
    loop {
        match agent.run(task_text, parameters).await {
            Ok(result) => return (retries, Ok(result)),
            Err(e) if retries + 1 < max_attempts => {
                tracing::warn!(
                    task_id = %task_id,
                    attempt = retries + 1,
                    error = %e,
                    "task attempt failed, retrying"
                );
                retries += 1;
            }
            Err(e) => return (retries, Err(e.to_string())),
        }
    }
}

/// Mark tasks that never reached a terminal state as cancelled, so an
/// archived timed-out or cancelled workflow reads coherently.
fn cancel_unfinished(tasks: &mut [TaskDescriptor]) {
    for task in tasks {
        if !task.is_finished() {
            task.cancel();
        }
    }
}
