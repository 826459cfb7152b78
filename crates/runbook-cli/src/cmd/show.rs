use super::{ParamArgs, Workspace};
use crate::output::print_json;
use anyhow::Context;
use runbook_core::view::{mode_label, TaskView};
use std::path::Path;

fn build_view(
    ws: &Workspace,
    task_id: &str,
    args: &ParamArgs,
) -> anyhow::Result<(TaskView, String)> {
    let session = ws.session(Some(task_id), args)?;
    let view = session
        .refresh(&ws.engine)?
        .loaded()
        .context("playbook not loaded")?;
    Ok((view, session.scope().to_string()))
}

pub fn show(
    root: &Path,
    playbook: Option<&Path>,
    task_id: &str,
    args: &ParamArgs,
    json: bool,
) -> anyhow::Result<()> {
    let ws = Workspace::load(root, playbook)?;
    let (view, scope) = build_view(&ws, task_id, args)?;

    if json {
        return print_json(&serde_json::json!({ "scope": scope, "task": view }));
    }

    println!("Task:   {}", view.task_id);
    println!("Name:   {}", view.label);
    let modes: Vec<String> = view.modes.iter().map(|m| mode_label(m)).collect();
    println!("Modes:  {}", modes.join(", "));
    println!("{}", view.meta);
    if !view.notes.is_empty() {
        println!();
        println!("Notes:");
        for note in &view.notes {
            println!("  - {note}");
        }
    }
    println!();
    println!("Scope:  {}", if scope.is_empty() { "(none)" } else { scope.as_str() });
    println!("Status: {}", view.status);
    println!("Hint:   {}", view.hint);
    Ok(())
}

/// Print the readiness verdict; a blocked task is an error exit.
pub fn check(
    root: &Path,
    playbook: Option<&Path>,
    task_id: &str,
    args: &ParamArgs,
    json: bool,
) -> anyhow::Result<()> {
    let ws = Workspace::load(root, playbook)?;
    let (view, scope) = build_view(&ws, task_id, args)?;

    if json {
        print_json(&serde_json::json!({
            "task": task_id,
            "scope": scope,
            "ready": view.verdict.is_ready(),
            "requires": view.verdict.resolved_requires,
            "missing": view.verdict.missing,
        }))?;
    } else {
        println!("{}", view.status);
    }

    if !view.verdict.is_ready() {
        anyhow::bail!(
            "task '{task_id}' is blocked on {} missing artifact(s)",
            view.verdict.missing.len()
        );
    }
    Ok(())
}
