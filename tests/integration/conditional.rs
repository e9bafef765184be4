//! Conditional workflow tests.
//!
//! Verifies condition gating, skip bookkeeping, fail-open behavior for
//! unknown condition kinds, and seeded reproducibility of RANDOM runs.

use std::sync::Arc;

use orchestra::{Orchestrator, OrchestratorConfig, TaskStatus};

use crate::fixtures::{definition, task_spec, RecordingFactory};

/// Skip: a NEVER condition cancels the task with a condition_not_met
/// result and keeps it out of completed_tasks.
#[tokio::test]
async fn test_never_condition_skips_task() {
    let factory = Arc::new(RecordingFactory::new());
    let calls = Arc::clone(&factory.calls);
    let mut orchestrator = Orchestrator::new(OrchestratorConfig::default(), factory);

    let tasks = vec![task_spec(serde_json::json!({
        "id": "t1",
        "task": "should not run",
        "conditions": [{"type": "never"}],
    }))];

    let report = orchestrator
        .run("run", definition("conditional_execution", tasks))
        .await
        .unwrap();

    assert_eq!(report.completed_tasks, 0);
    assert_eq!(report.total_tasks, 1);
    let skipped = &report.results["t1"];
    assert!(skipped.skipped);
    assert_eq!(skipped.reason.as_deref(), Some("condition_not_met"));

    // The agent was never invoked
    assert!(calls.lock().unwrap().is_empty());

    let archived = &orchestrator.registry().history()[0];
    assert_eq!(archived.tasks[0].status, TaskStatus::Cancelled);
}

/// Tasks without conditions always execute in conditional mode.
#[tokio::test]
async fn test_empty_conditions_always_execute() {
    let factory = Arc::new(RecordingFactory::new());
    let mut orchestrator = Orchestrator::new(OrchestratorConfig::default(), factory);

    let tasks = vec![task_spec(serde_json::json!({"id": "t1", "task": "go"}))];
    let report = orchestrator
        .run("run", definition("conditional_execution", tasks))
        .await
        .unwrap();

    assert_eq!(report.completed_tasks, 1);
    assert!(report.results["t1"].success);
}

/// A skip affects only its own task; later tasks still run.
#[tokio::test]
async fn test_skip_does_not_affect_later_tasks() {
    let factory = Arc::new(RecordingFactory::new());
    let mut orchestrator = Orchestrator::new(OrchestratorConfig::default(), factory);

    let tasks = vec![
        task_spec(serde_json::json!({
            "id": "skipped",
            "task": "nope",
            "conditions": [{"type": "never"}],
        })),
        task_spec(serde_json::json!({"id": "ran", "task": "yes"})),
    ];

    let report = orchestrator
        .run("run", definition("conditional_execution", tasks))
        .await
        .unwrap();

    assert_eq!(report.completed_tasks, 1);
    assert!(report.results["skipped"].skipped);
    assert!(report.results["ran"].success);
}

/// Condition lists are ANDed: always + never skips.
#[tokio::test]
async fn test_condition_list_is_conjunction() {
    let factory = Arc::new(RecordingFactory::new());
    let mut orchestrator = Orchestrator::new(OrchestratorConfig::default(), factory);

    let tasks = vec![task_spec(serde_json::json!({
        "id": "t1",
        "task": "gated",
        "conditions": [{"type": "always"}, {"type": "never"}],
    }))];

    let report = orchestrator
        .run("run", definition("conditional_execution", tasks))
        .await
        .unwrap();

    assert!(report.results["t1"].skipped);
}

/// Unknown condition kinds are fail-open: the task executes.
#[tokio::test]
async fn test_unknown_condition_kind_executes_task() {
    let factory = Arc::new(RecordingFactory::new());
    let mut orchestrator = Orchestrator::new(OrchestratorConfig::default(), factory);

    let tasks = vec![task_spec(serde_json::json!({
        "id": "t1",
        "task": "run anyway",
        "conditions": [{"type": "moon_phase"}],
    }))];

    let report = orchestrator
        .run("run", definition("conditional_execution", tasks))
        .await
        .unwrap();

    assert_eq!(report.completed_tasks, 1);
    assert!(report.results["t1"].success);
}

/// Seeded orchestrators make RANDOM conditions reproducible.
#[tokio::test]
async fn test_seeded_random_conditions_are_reproducible() {
    let run_once = |seed: u64| async move {
        let factory = Arc::new(RecordingFactory::new());
        let mut orchestrator =
            Orchestrator::new(OrchestratorConfig::default(), factory).with_condition_seed(seed);

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                task_spec(serde_json::json!({
                    "id": format!("t{i}"),
                    "task": "maybe",
                    "conditions": [{"type": "random", "probability": 0.5}],
                }))
            })
            .collect();

        let report = orchestrator
            .run("run", definition("conditional_execution", tasks))
            .await
            .unwrap();

        let mut skipped: Vec<String> = report
            .results
            .iter()
            .filter(|(_, r)| r.skipped)
            .map(|(id, _)| id.clone())
            .collect();
        skipped.sort();
        skipped
    };

    let first = run_once(42).await;
    let second = run_once(42).await;
    assert_eq!(first, second);
}

/// RANDOM with probability 1.0 always executes; 0.0 always skips.
#[tokio::test]
async fn test_random_probability_extremes() {
    let factory = Arc::new(RecordingFactory::new());
    let mut orchestrator = Orchestrator::new(OrchestratorConfig::default(), factory);

    let tasks = vec![
        task_spec(serde_json::json!({
            "id": "certain",
            "task": "go",
            "conditions": [{"type": "random", "probability": 1.0}],
        })),
        task_spec(serde_json::json!({
            "id": "impossible",
            "task": "no",
            "conditions": [{"type": "random", "probability": 0.0}],
        })),
    ];

    let report = orchestrator
        .run("run", definition("conditional_execution", tasks))
        .await
        .unwrap();

    assert!(report.results["certain"].success);
    assert!(report.results["impossible"].skipped);
    assert_eq!(report.completed_tasks, 1);
}

/// A malformed probability is fail-closed: the task is skipped, not run.
#[tokio::test]
async fn test_invalid_probability_skips_task() {
    let factory = Arc::new(RecordingFactory::new());
    let mut orchestrator = Orchestrator::new(OrchestratorConfig::default(), factory);

    let tasks = vec![task_spec(serde_json::json!({
        "id": "t1",
        "task": "gated",
        "conditions": [{"type": "random", "probability": 7.5}],
    }))];

    let report = orchestrator
        .run("run", definition("conditional_execution", tasks))
        .await
        .unwrap();

    assert!(report.results["t1"].skipped);
}

/// An executing conditional task that raises aborts the run, like
/// sequential mode.
#[tokio::test]
async fn test_conditional_execution_failure_aborts() {
    let factory = Arc::new(RecordingFactory::new());
    let mut orchestrator = Orchestrator::new(crate::fixtures::strict_config(), factory);

    let tasks = vec![
        task_spec(serde_json::json!({"id": "t1", "task": "explode"})),
        task_spec(serde_json::json!({"id": "t2", "task": "never reached"})),
    ];

    let err = orchestrator
        .run("run", definition("conditional_execution", tasks))
        .await
        .unwrap_err();
    assert!(matches!(err, orchestra::Error::TaskExecution { .. }));

    let archived = &orchestrator.registry().history()[0];
    assert_eq!(archived.status, orchestra::WorkflowStatus::Failed);
}
