//! Display text shared by front ends: labels, the one-line task summary and
//! the readiness status messages.

use crate::params::{self, DerivedParam, Params};
use crate::playbook::Task;
use crate::readiness::ReadinessVerdict;
use serde::Serialize;

const EMPTY: &str = "—";

/// `"[Phase] Name"`, or just the name when the task has no phase. Falls back
/// to the id for unnamed tasks.
pub fn task_label(task: &Task) -> String {
    let name = if task.name.is_empty() {
        task.id.as_str()
    } else {
        task.name.as_str()
    };
    match task.phase.as_deref() {
        Some(phase) if !phase.is_empty() => format!("[{phase}] {name}"),
        _ => name.to_string(),
    }
}

/// Mode name with its first character upper-cased.
pub fn mode_label(mode: &str) -> String {
    let mut chars = mode.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Put derived values back in template form, so long output paths read as
/// `{outdir}/hosts.txt`. Only the first occurrence is collapsed.
fn collapse(artifact: &str, params: &Params, derived: &[DerivedParam]) -> String {
    let mut out = artifact.to_string();
    for d in derived {
        if let Some(value) = params.get(&d.name).filter(|v| !v.is_empty()) {
            out = out.replacen(value.as_str(), &format!("{{{}}}", d.name), 1);
        }
    }
    out
}

fn join_or_empty(items: &[String]) -> String {
    if items.is_empty() {
        EMPTY.to_string()
    } else {
        items.join(", ")
    }
}

/// `Phase: … • Tags: … • Requires: … • Produces: …`
pub fn meta_line(task: &Task, params: &Params, derived: &[DerivedParam]) -> String {
    let phase = task
        .phase
        .as_deref()
        .filter(|p| !p.is_empty())
        .unwrap_or(EMPTY);
    let tags = join_or_empty(&task.tags);
    let requires: Vec<String> = params::substitute_all(&task.requires_files, params)
        .iter()
        .map(|a| collapse(a, params, derived))
        .collect();
    let produces: Vec<String> = params::substitute_all(&task.produces_files, params)
        .iter()
        .map(|a| collapse(a, params, derived))
        .collect();
    format!(
        "Phase: {phase} • Tags: {tags} • Requires: {} • Produces: {}",
        join_or_empty(&requires),
        join_or_empty(&produces)
    )
}

pub fn status_message(verdict: &ReadinessVerdict) -> String {
    if verdict.is_ready() {
        "Ready.".to_string()
    } else {
        format!(
            "Blocked (strict): missing required outputs. Mark these as done first: {}",
            verdict.missing.join(", ")
        )
    }
}

pub fn hint(verdict: &ReadinessVerdict) -> &'static str {
    if verdict.is_ready() {
        "Generate → run commands → mark done to unlock next steps."
    } else {
        "Run prerequisite tasks → then mark them done."
    }
}

/// Everything a front end shows for the selected task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskView {
    pub task_id: String,
    pub label: String,
    pub modes: Vec<String>,
    pub meta: String,
    pub notes: Vec<String>,
    pub produces: Vec<String>,
    pub verdict: ReadinessVerdict,
    pub status: String,
    pub hint: String,
    pub can_generate: bool,
    pub can_mark_done: bool,
    pub can_reset: bool,
}

impl TaskView {
    pub fn build(
        task: &Task,
        params: &Params,
        derived: &[DerivedParam],
        verdict: ReadinessVerdict,
        scope: &str,
    ) -> Self {
        let has_scope = !scope.trim().is_empty();
        let produces = params::substitute_all(&task.produces_files, params);
        Self {
            task_id: task.id.clone(),
            label: task_label(task),
            modes: task.modes.names().into_iter().map(str::to_string).collect(),
            meta: meta_line(task, params, derived),
            notes: task.notes.clone(),
            can_generate: verdict.is_ready(),
            can_mark_done: has_scope && !produces.is_empty(),
            can_reset: has_scope,
            status: status_message(&verdict),
            hint: hint(&verdict).to_string(),
            produces,
            verdict,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
