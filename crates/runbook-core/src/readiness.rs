use crate::params::{self, Params};
use crate::playbook::Task;
use crate::store::CompletionSet;
use serde::{Deserialize, Serialize};

/// Gating decision for one task against one completion record.
///
/// Computed fresh on every call; never cache it across scope, task or
/// parameter changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessVerdict {
    /// Required artifacts after substitution, in declared order.
    pub resolved_requires: Vec<String>,
    /// The subset of `resolved_requires` not yet recorded. Duplicates in the
    /// declaration show up as duplicates here.
    pub missing: Vec<String>,
}

impl ReadinessVerdict {
    pub fn is_ready(&self) -> bool {
        self.missing.is_empty()
    }
}

pub fn evaluate(task: &Task, params: &Params, completed: &CompletionSet) -> ReadinessVerdict {
    let resolved_requires = params::substitute_all(&task.requires_files, params);
    let missing: Vec<String> = resolved_requires
        .iter()
        .filter(|artifact| !completed.contains(artifact.as_str()))
        .cloned()
        .collect();
    tracing::debug!(
        task = %task.id,
        required = resolved_requires.len(),
        missing = missing.len(),
        "evaluated readiness"
    );
    ReadinessVerdict {
        resolved_requires,
        missing,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
