use super::{ParamArgs, Workspace};
use crate::output::print_json;
use anyhow::Context;
use runbook_core::command::{export, Generation};
use runbook_core::view::status_message;
use runbook_core::RunbookError;
use std::path::Path;

pub struct GenerateOptions<'a> {
    pub task_id: &'a str,
    pub mode: Option<&'a str>,
    pub plain: bool,
}

pub fn run(
    root: &Path,
    playbook: Option<&Path>,
    opts: GenerateOptions<'_>,
    args: &ParamArgs,
    json: bool,
) -> anyhow::Result<()> {
    let ws = Workspace::load(root, playbook)?;
    let task = ws.playbook()?.require_task(opts.task_id)?;
    let mut session = ws.session(Some(opts.task_id), args)?;
    if let Some(mode) = opts.mode {
        session.select_mode(&ws.engine, mode)?;
    }
    let mode = session
        .mode()
        .ok_or_else(|| RunbookError::NoModes(opts.task_id.to_string()))?
        .to_string();
    let scope = session.scope().to_string();

    let generation = session
        .generate(&ws.engine)?
        .loaded()
        .context("playbook not loaded")?;

    let commands = match generation {
        Generation::Commands { commands } => commands,
        Generation::Blocked { verdict } => {
            if json {
                print_json(&serde_json::json!({
                    "task": opts.task_id,
                    "mode": mode,
                    "scope": scope,
                    "blocked": true,
                    "missing": verdict.missing,
                }))?;
            }
            anyhow::bail!("{}", status_message(&verdict));
        }
    };

    if json {
        return print_json(&serde_json::json!({
            "task": opts.task_id,
            "mode": mode,
            "scope": scope,
            "blocked": false,
            "commands": commands,
        }));
    }

    if opts.plain {
        if !commands.is_empty() {
            println!("{}", export(&commands));
        }
        return Ok(());
    }

    if !task.notes.is_empty() {
        for note in &task.notes {
            println!("note: {note}");
        }
        println!();
    }
    if commands.is_empty() {
        println!("Mode '{mode}' has no commands.");
        return Ok(());
    }
    for (idx, cmd) in commands.iter().enumerate() {
        println!("# Command {}", idx + 1);
        println!("{cmd}");
    }
    println!();
    println!("Run them in your terminal, then: runbook done {}", opts.task_id);
    Ok(())
}
