use crate::error::{Result, RunbookError};
use crate::params::{self, Params};
use crate::playbook::Task;
use crate::store::{CompletionSet, CompletionStore, KeyValueStore, Persistence};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkDone {
    pub scope: String,
    /// Produced artifacts of the task, substituted, in declared order.
    pub recorded: Vec<String>,
    /// The scope's whole record after the union.
    pub completed: CompletionSet,
    pub persistence: Persistence,
}

/// Record every produced artifact of `task` as done in `scope`.
///
/// This is the only writer of completion records, and it only ever adds:
/// marking an artifact twice changes nothing. Rejected without touching the
/// store when the scope is blank or the task produces nothing.
pub fn mark_done<S: KeyValueStore>(
    store: &mut CompletionStore<S>,
    task: &Task,
    params: &Params,
    scope: &str,
) -> Result<MarkDone> {
    let scope = scope.trim();
    if scope.is_empty() {
        return Err(RunbookError::NoActiveScope);
    }
    if task.produces_files.is_empty() {
        return Err(RunbookError::NothingProducible(task.id.clone()));
    }

    let recorded = params::substitute_all(&task.produces_files, params);
    let mut completed = store.load(scope);
    completed.extend(recorded.iter().cloned());
    let persistence = store.save(scope, &completed);

    tracing::info!(
        task = %task.id,
        scope,
        artifacts = recorded.len(),
        "marked task done"
    );

    Ok(MarkDone {
        scope: scope.to_string(),
        recorded,
        completed,
        persistence,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
