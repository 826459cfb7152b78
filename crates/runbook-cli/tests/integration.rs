#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn runbook(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("runbook").unwrap();
    cmd.current_dir(dir.path())
        .env("RUNBOOK_ROOT", dir.path())
        .env_remove("RUNBOOK_PLAYBOOK");
    cmd
}

fn init_project(dir: &TempDir) {
    runbook(dir).arg("init").assert().success();
}

fn json_of(cmd: &mut Command) -> serde_json::Value {
    let out = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&out).unwrap()
}

// ---------------------------------------------------------------------------
// runbook init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_config_and_playbook() {
    let dir = TempDir::new().unwrap();
    runbook(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("created: .runbook/config.yaml"));

    assert!(dir.path().join(".runbook/config.yaml").exists());
    assert!(dir.path().join("playbooks/playbook.yaml").exists());
}

#[test]
fn init_is_idempotent_and_keeps_edits() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let book = dir.path().join("playbooks/playbook.yaml");
    std::fs::write(&book, "tasks:\n  - id: only\n    modes:\n      default: {commands: []}\n")
        .unwrap();

    runbook(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("exists:  playbooks/playbook.yaml"));
    let content = std::fs::read_to_string(&book).unwrap();
    assert!(content.contains("id: only"));
}

// ---------------------------------------------------------------------------
// runbook tasks / modes / show
// ---------------------------------------------------------------------------

#[test]
fn tasks_lists_in_playbook_order() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let v = json_of(runbook(&dir).args(["--json", "tasks", "--domain", "example.com"]));
    let ids: Vec<&str> = v["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["recon", "probe", "scan", "fuzz"]);
    assert_eq!(v["scope"], "example.com");
    assert_eq!(v["tasks"][0]["ready"], true);
    assert_eq!(v["tasks"][2]["ready"], false);
    assert_eq!(
        v["tasks"][2]["missing"][0],
        "./out/example.com/hosts.txt"
    );
}

#[test]
fn tasks_table_shows_status() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    runbook(&dir)
        .args(["tasks", "--domain", "example.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[Recon] Subdomain enumeration"))
        .stdout(predicate::str::contains("blocked (1 missing)"));
}

#[test]
fn modes_keep_document_order() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let v = json_of(runbook(&dir).args(["--json", "modes", "recon"]));
    assert_eq!(v["modes"][0]["name"], "default");
    assert_eq!(v["modes"][1]["name"], "passive");
    assert_eq!(v["modes"][1]["label"], "Passive");
}

#[test]
fn show_prints_meta_and_status() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    runbook(&dir)
        .args(["show", "scan", "--domain", "example.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Requires: {outdir}/hosts.txt"))
        .stdout(predicate::str::contains("Blocked (strict)"));
}

#[test]
fn unknown_task_fails() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    runbook(&dir)
        .args(["show", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("task not found: ghost"));
}

// ---------------------------------------------------------------------------
// runbook generate / check / done / reset
// ---------------------------------------------------------------------------

#[test]
fn generate_substitutes_domain_and_outdir() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    runbook(&dir)
        .args(["generate", "recon", "--domain", "example.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "subfinder -d example.com -silent -o ./out/example.com/hosts.txt",
        ))
        .stdout(predicate::str::contains("# Command 2"));
}

#[test]
fn generate_plain_is_newline_joined() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    runbook(&dir)
        .args(["generate", "recon", "--plain", "--domain", "example.com"])
        .assert()
        .success()
        .stdout(
            "mkdir -p ./out/example.com\n\
             subfinder -d example.com -silent -o ./out/example.com/hosts.txt\n",
        );
}

#[test]
fn generate_unknown_mode_fails() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    runbook(&dir)
        .args(["generate", "recon", "--mode", "aggressive", "--domain", "a.io"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "mode 'aggressive' not found for task 'recon'",
        ));
}

#[test]
fn blocked_until_upstream_done_then_reset_blocks_again() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    runbook(&dir)
        .args(["generate", "scan", "--domain", "example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("./out/example.com/hosts.txt"));
    runbook(&dir)
        .args(["check", "scan", "--domain", "example.com"])
        .assert()
        .failure();

    runbook(&dir)
        .args(["done", "recon", "--domain", "example.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Marked done: ./out/example.com/hosts.txt",
        ));

    runbook(&dir)
        .args(["check", "scan", "--domain", "example.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ready."));
    runbook(&dir)
        .args(["generate", "scan", "--plain", "--domain", "example.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("naabu -list ./out/example.com/hosts.txt"));

    runbook(&dir)
        .args(["reset", "--domain", "example.com"])
        .assert()
        .success();
    runbook(&dir)
        .args(["check", "scan", "--domain", "example.com"])
        .assert()
        .failure();
}

#[test]
fn completions_are_scoped_per_domain() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    runbook(&dir)
        .args(["done", "recon", "--domain", "a.io"])
        .assert()
        .success();

    let v = json_of(runbook(&dir).args(["--json", "completed", "--domain", "A.IO"]));
    assert_eq!(v["completed"][0], "./out/a.io/hosts.txt");

    runbook(&dir)
        .args(["completed", "--domain", "b.io"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No completed artifacts for 'b.io'."));
}

#[test]
fn done_without_scope_is_rejected() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    runbook(&dir)
        .args(["done", "recon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no active scope selected"));
    runbook(&dir).args(["reset"]).assert().failure();
}

#[test]
fn done_on_task_without_outputs_is_rejected() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    std::fs::write(
        dir.path().join("playbooks/playbook.yaml"),
        "tasks:\n  - id: report\n    modes:\n      default:\n        commands:\n          - cmd: echo {domain}\n",
    )
    .unwrap();
    runbook(&dir)
        .args(["done", "report", "--domain", "a.io"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("declares nothing producible"));
}

#[test]
fn done_json_reports_persistence() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let v = json_of(runbook(&dir).args(["--json", "done", "recon", "--domain", "j.io"]));
    assert_eq!(v["scope"], "j.io");
    assert_eq!(v["persistence"]["status"], "persisted");
    assert_eq!(v["recorded"][0], "./out/j.io/hosts.txt");
}

// ---------------------------------------------------------------------------
// Playbook loading failures
// ---------------------------------------------------------------------------

#[test]
fn empty_playbook_fails_to_load() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    std::fs::write(dir.path().join("playbooks/playbook.yaml"), "tasks: []\n").unwrap();
    runbook(&dir)
        .arg("tasks")
        .assert()
        .failure()
        .stderr(predicate::str::contains("playbook has no tasks"));
}

#[test]
fn missing_playbook_fails_to_load() {
    let dir = TempDir::new().unwrap();
    runbook(&dir)
        .arg("tasks")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load playbook"));
}

#[test]
fn numeric_task_fields_load() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    std::fs::write(
        dir.path().join("playbooks/playbook.yaml"),
        "tasks:\n  - id: 7\n    name: Ports\n    phase: 1\n    tags: [web, 2024]\n    modes:\n      1:\n        commands:\n          - cmd: echo {domain}\n",
    )
    .unwrap();

    let v = json_of(runbook(&dir).args(["--json", "tasks", "--domain", "n.io"]));
    assert_eq!(v["tasks"][0]["id"], "7");
    assert_eq!(v["tasks"][0]["label"], "[1] Ports");
    assert_eq!(v["tasks"][0]["tags"][1], "2024");

    runbook(&dir)
        .args(["generate", "7", "--mode", "1", "--plain", "--domain", "n.io"])
        .assert()
        .success()
        .stdout("echo n.io\n");
}

#[test]
fn playbook_flag_overrides_configured_path() {
    let dir = TempDir::new().unwrap();
    let book = dir.path().join("alt.yaml");
    std::fs::write(
        &book,
        "placeholders:\n  domain: alt.test\ntasks:\n  - id: ping\n    modes:\n      default:\n        commands:\n          - cmd: ping -c1 {domain}\n",
    )
    .unwrap();
    runbook(&dir)
        .args(["--playbook", book.to_str().unwrap(), "generate", "ping", "--plain"])
        .assert()
        .success()
        .stdout("ping -c1 alt.test\n");
}

// ---------------------------------------------------------------------------
// runbook config
// ---------------------------------------------------------------------------

#[test]
fn config_validate_defaults_are_clean() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    runbook(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid."));
}

#[test]
fn config_validate_reports_errors() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    std::fs::write(
        dir.path().join(".runbook/config.yaml"),
        "version: 1\nplaybook: \"\"\n",
    )
    .unwrap();
    runbook(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error]"));
}
