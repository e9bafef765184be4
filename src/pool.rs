//! Agent pool with per-task caching.
//!
//! The pool lazily creates one agent per `(agent kind, task id)` pair and
//! reuses it for the lifetime of the orchestrator, not just one workflow.
//! The composite key keeps two different agent kinds requested under the
//! same task id from aliasing.

use std::collections::HashMap;
use std::sync::Arc;

use crate::agent::{AgentFactory, AgentKind, ManagedAgent};
use crate::{Error, Result};

pub struct AgentPool {
    agents: HashMap<(AgentKind, String), Arc<dyn ManagedAgent>>,
    factory: Arc<dyn AgentFactory>,
}

impl AgentPool {
    pub fn new(factory: Arc<dyn AgentFactory>) -> Self {
        Self {
            agents: HashMap::new(),
            factory,
        }
    }

    /// Return the cached agent for this kind and task id, creating and
    /// setting it up on first use.
    ///
    /// Setup runs exactly once per cached agent; a setup failure aborts
    /// creation, leaves nothing cached, and propagates to the caller.
    pub async fn get_or_create(
        &mut self,
        kind: AgentKind,
        task_id: &str,
    ) -> Result<Arc<dyn ManagedAgent>> {
        let key = (kind, task_id.to_string());
        if let Some(agent) = self.agents.get(&key) {
            return Ok(Arc::clone(agent));
        }

        let name = format!("{kind}_{task_id}");
        let agent = self.factory.create(kind, &name)?;
        agent.setup().await.map_err(|e| Error::AgentSetup {
            kind,
            task_id: task_id.to_string(),
            reason: e.to_string(),
        })?;

        tracing::info!(agent = %name, "created managed agent");
        self.agents.insert(key, Arc::clone(&agent));
        Ok(agent)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Tear down every managed agent, best-effort: a failing cleanup is
    /// logged and does not prevent cleanup attempts for the others. The
    /// pool is empty afterwards.
    pub async fn cleanup_all(&mut self) {
        for ((kind, task_id), agent) in self.agents.drain() {
            if let Err(e) = agent.cleanup().await {
                tracing::warn!(
                    agent = %format!("{kind}_{task_id}"),
                    error = %e,
                    "agent cleanup failed"
                );
            }
        }
    }
}
