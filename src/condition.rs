//! Condition evaluation for conditional workflows.
//!
//! A task's condition list is satisfied only if every condition evaluates
//! true (logical AND, short-circuiting). Unknown condition kinds are
//! fail-open; a condition that cannot be evaluated (e.g. a malformed
//! probability) is fail-closed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Kind of a single condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionKind {
    Always,
    Never,
    Random,
    /// Any unrecognized kind. Treated as true when evaluated.
    #[serde(other)]
    Unknown,
}

/// One condition attached to a task in a conditional workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub kind: ConditionKind,

    /// Probability of passing, used only when `kind` is `Random`.
    /// Defaults to 0.5 when unspecified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
}

impl Condition {
    pub fn always() -> Self {
        Self {
            kind: ConditionKind::Always,
            probability: None,
        }
    }

    pub fn never() -> Self {
        Self {
            kind: ConditionKind::Never,
            probability: None,
        }
    }

    pub fn random(probability: f64) -> Self {
        Self {
            kind: ConditionKind::Random,
            probability: Some(probability),
        }
    }
}

/// Evaluates condition lists against an owned RNG.
///
/// RANDOM conditions make conditional workflows non-deterministic; callers
/// needing reproducible runs construct the evaluator with a fixed seed.
#[derive(Debug)]
pub struct ConditionEvaluator {
    rng: StdRng,
}

impl ConditionEvaluator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Evaluate one condition. Evaluation failures are caught and treated
    /// as false.
    pub fn evaluate(&mut self, condition: &Condition) -> bool {
        match self.try_evaluate(condition) {
            Ok(pass) => pass,
            Err(e) => {
                tracing::warn!(error = %e, "condition evaluation failed, treating as not met");
                false
            }
        }
    }

    /// Evaluate a task's full condition list. An empty list always passes.
    pub fn satisfied(&mut self, conditions: &[Condition]) -> bool {
        conditions.iter().all(|c| self.evaluate(c))
    }

    fn try_evaluate(&mut self, condition: &Condition) -> Result<bool> {
        match condition.kind {
            ConditionKind::Always => Ok(true),
            ConditionKind::Never => Ok(false),
            ConditionKind::Random => {
                let probability = condition.probability.unwrap_or(0.5);
                if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
                    return Err(Error::Condition(format!(
                        "random probability {probability} outside [0, 1]"
                    )));
                }
                Ok(self.rng.gen::<f64>() < probability)
            }
            // Fail-open for kinds this version does not know about.
            ConditionKind::Unknown => Ok(true),
        }
    }
}

impl Default for ConditionEvaluator {
    fn default() -> Self {
        Self::new()
    }
}
