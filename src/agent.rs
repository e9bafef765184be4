//! The managed-agent contract.
//!
//! The orchestrator never executes work itself; it delegates every task to
//! an opaque agent behind the [`ManagedAgent`] trait. Concrete agents are
//! produced through an injected [`AgentFactory`], resolved from the closed
//! [`AgentKind`] set rather than string-keyed branching at call sites.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;

/// Opaque keyword arguments forwarded to an agent alongside the task text.
pub type Parameters = serde_json::Map<String, Value>;

/// The closed set of agent implementations the orchestrator can provision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    Simple,
    Browser,
    Orchestra,
    Meta,
}

impl AgentKind {
    /// Resolve a caller-supplied agent-type tag. Unrecognized tags fall
    /// back to `Simple`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "SimpleAgent" => AgentKind::Simple,
            "BrowserAgent" => AgentKind::Browser,
            "OrchestraAgent" => AgentKind::Orchestra,
            "MetaAgent" => AgentKind::Meta,
            _ => AgentKind::Simple,
        }
    }

    pub fn as_tag(&self) -> &'static str {
        match self {
            AgentKind::Simple => "SimpleAgent",
            AgentKind::Browser => "BrowserAgent",
            AgentKind::Orchestra => "OrchestraAgent",
            AgentKind::Meta => "MetaAgent",
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_tag())
    }
}

/// Outcome of one agent task execution.
///
/// `success: false` with an `error` message is a business-logic failure and
/// is recorded verbatim; agents signal infrastructure failure by returning
/// `Err` from [`ManagedAgent::run`] instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Set when a conditional workflow skipped the task.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skipped: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Agent-specific payload fields, flattened into the result object.
    #[serde(flatten)]
    pub data: Parameters,
}

impl ExecutionResult {
    pub fn ok(data: Parameters) -> Self {
        Self {
            success: true,
            data,
            ..Self::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            skipped: true,
            reason: Some(reason.into()),
            ..Self::default()
        }
    }
}

/// An externally-implemented task executor managed by the agent pool.
///
/// `setup` is called exactly once before first use. `run` must return for
/// normal completion or business failure and reserve `Err` for
/// infrastructure-level failure. `cleanup` is invoked once during
/// orchestrator teardown, best-effort.
#[async_trait]
pub trait ManagedAgent: Send + Sync {
    /// Instance name, e.g. `SimpleAgent_t1`.
    fn name(&self) -> &str;

    async fn setup(&self) -> Result<()>;

    async fn run(&self, task: &str, parameters: &Parameters) -> Result<ExecutionResult>;

    async fn cleanup(&self) -> Result<()>;
}

impl std::fmt::Debug for dyn ManagedAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedAgent")
            .field("name", &self.name())
            .finish()
    }
}

/// Factory seam through which the orchestrator provisions concrete agents.
///
/// Callers inject an implementation at construction time; the orchestrator
/// itself has no knowledge of what a `BrowserAgent` actually does.
pub trait AgentFactory: Send + Sync {
    fn create(&self, kind: AgentKind, name: &str) -> Result<Arc<dyn ManagedAgent>>;
}
