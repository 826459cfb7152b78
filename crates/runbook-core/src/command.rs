use crate::error::{Result, RunbookError};
use crate::params::{self, Params};
use crate::playbook::{Playbook, Task};
use crate::readiness::{self, ReadinessVerdict};
use crate::store::CompletionSet;
use serde::Serialize;

/// Outcome of command generation. A blocked gate is an expected result, not
/// an error: it carries the verdict so the caller can list what is missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Generation {
    Commands { commands: Vec<String> },
    Blocked { verdict: ReadinessVerdict },
}

impl Generation {
    pub fn commands(&self) -> Option<&[String]> {
        match self {
            Generation::Commands { commands } => Some(commands),
            Generation::Blocked { .. } => None,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Generation::Blocked { .. })
    }
}

/// Produce the substituted command list for `task` in `mode_name`.
///
/// The mode must exist. Readiness is re-evaluated here rather than trusted
/// from an earlier check; when blocked, no command is produced at all.
pub fn generate(
    task: &Task,
    mode_name: &str,
    params: &Params,
    completed: &CompletionSet,
) -> Result<Generation> {
    let mode = task
        .mode(mode_name)
        .ok_or_else(|| RunbookError::ModeNotFound {
            task: task.id.clone(),
            mode: mode_name.to_string(),
        })?;

    let verdict = readiness::evaluate(task, params, completed);
    if !verdict.is_ready() {
        tracing::debug!(task = %task.id, mode = mode_name, "generation blocked");
        return Ok(Generation::Blocked { verdict });
    }

    let commands = params::substitute_all(&mode.templates(), params);
    Ok(Generation::Commands { commands })
}

/// [`generate`] with the task looked up by id.
pub fn generate_for(
    playbook: &Playbook,
    task_id: &str,
    mode_name: &str,
    params: &Params,
    completed: &CompletionSet,
) -> Result<Generation> {
    let task = playbook.require_task(task_id)?;
    generate(task, mode_name, params, completed)
}

/// Commands joined for pasting into a terminal in one go.
pub fn export(commands: &[String]) -> String {
    commands.join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
