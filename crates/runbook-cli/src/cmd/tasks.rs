use super::{ParamArgs, Workspace};
use crate::output::{print_json, print_table};
use runbook_core::readiness;
use runbook_core::view::{mode_label, task_label};
use std::path::Path;

pub fn list(
    root: &Path,
    playbook: Option<&Path>,
    args: &ParamArgs,
    json: bool,
) -> anyhow::Result<()> {
    let ws = Workspace::load(root, playbook)?;
    let pb = ws.playbook()?;
    let overrides = args.overrides()?;
    let scope = args.scope(&ws.config, &overrides);
    let params = ws.engine.resolve_params(&overrides);
    let completed = ws.engine.completed(&scope);

    if json {
        #[derive(serde::Serialize)]
        struct TaskRow<'a> {
            id: &'a str,
            label: String,
            phase: Option<&'a str>,
            tags: &'a [String],
            modes: Vec<&'a str>,
            ready: bool,
            missing: Vec<String>,
        }

        let rows: Vec<TaskRow> = pb
            .tasks()
            .iter()
            .map(|t| {
                let verdict = readiness::evaluate(t, &params, &completed);
                TaskRow {
                    id: &t.id,
                    label: task_label(t),
                    phase: t.phase.as_deref(),
                    tags: &t.tags,
                    modes: pb.modes_of(t),
                    ready: verdict.is_ready(),
                    missing: verdict.missing,
                }
            })
            .collect();
        return print_json(&serde_json::json!({ "scope": scope, "tasks": rows }));
    }

    let rows: Vec<Vec<String>> = pb
        .tasks()
        .iter()
        .map(|t| {
            let verdict = readiness::evaluate(t, &params, &completed);
            let status = if verdict.is_ready() {
                "ready".to_string()
            } else {
                format!("blocked ({} missing)", verdict.missing.len())
            };
            vec![
                t.id.clone(),
                task_label(t),
                pb.modes_of(t).join(", "),
                status,
            ]
        })
        .collect();
    print_table(&["ID", "TASK", "MODES", "STATUS"], rows);
    Ok(())
}

pub fn modes(
    root: &Path,
    playbook: Option<&Path>,
    task_id: &str,
    json: bool,
) -> anyhow::Result<()> {
    let ws = Workspace::load(root, playbook)?;
    let pb = ws.playbook()?;
    let task = pb.require_task(task_id)?;

    if json {
        let modes: Vec<serde_json::Value> = task
            .modes
            .iter()
            .map(|(name, mode)| {
                serde_json::json!({
                    "name": name,
                    "label": mode_label(name),
                    "commands": mode.commands.len(),
                })
            })
            .collect();
        return print_json(&serde_json::json!({ "task": task_id, "modes": modes }));
    }

    if task.modes.is_empty() {
        println!("Task '{task_id}' has no modes.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = task
        .modes
        .iter()
        .map(|(name, mode)| {
            vec![
                name.to_string(),
                mode_label(name),
                mode.commands.len().to_string(),
            ]
        })
        .collect();
    print_table(&["MODE", "LABEL", "COMMANDS"], rows);
    Ok(())
}
