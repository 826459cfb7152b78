use super::{ParamArgs, Workspace};
use crate::output::print_json;
use anyhow::Context;
use runbook_core::store::Persistence;
use std::path::Path;

/// Record a task's produced artifacts as done for the active scope.
pub fn done(
    root: &Path,
    playbook: Option<&Path>,
    task_id: &str,
    args: &ParamArgs,
    json: bool,
) -> anyhow::Result<()> {
    let mut ws = Workspace::load(root, playbook)?;
    let mut session = ws.session(Some(task_id), args)?;

    let done = session
        .mark_done(&mut ws.engine)
        .with_context(|| format!("cannot mark '{task_id}' done"))?
        .loaded()
        .context("playbook not loaded")?;

    if let Persistence::Degraded(reason) = &done.persistence {
        eprintln!("warning: completion record was not saved: {reason}");
    }

    if json {
        return print_json(&done);
    }

    println!("Marked done: {}", done.recorded.join(", "));
    println!(
        "{} artifact(s) recorded for '{}'.",
        done.completed.len(),
        done.scope
    );
    Ok(())
}
