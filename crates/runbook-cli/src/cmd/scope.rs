use super::{ParamArgs, Workspace};
use crate::output::print_json;
use runbook_core::store::{scope_key, Persistence};
use std::path::Path;

pub fn completed(root: &Path, args: &ParamArgs, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    let overrides = args.overrides()?;
    let scope = args.scope(&ws.config, &overrides);
    let completed = ws.engine.completed(&scope);

    if json {
        return print_json(&serde_json::json!({
            "scope": scope,
            "key": scope_key(&scope),
            "completed": completed,
        }));
    }

    if completed.is_empty() {
        println!("No completed artifacts for '{}'.", display_scope(&scope));
        return Ok(());
    }
    for artifact in &completed {
        println!("{artifact}");
    }
    Ok(())
}

pub fn reset(root: &Path, args: &ParamArgs, json: bool) -> anyhow::Result<()> {
    let mut ws = Workspace::open(root)?;
    let mut session = ws.session(None, args)?;
    let persistence = session.reset(&mut ws.engine)?;
    let scope = session.scope();
    if let Persistence::Degraded(reason) = &persistence {
        eprintln!("warning: completion record was not removed: {reason}");
    }

    if json {
        return print_json(&serde_json::json!({
            "scope": scope,
            "persistence": persistence,
        }));
    }
    println!("Completion markers reset for '{scope}'.");
    Ok(())
}

fn display_scope(scope: &str) -> &str {
    if scope.is_empty() {
        runbook_core::store::FALLBACK_SCOPE
    } else {
        scope
    }
}
