use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const RUNBOOK_DIR: &str = ".runbook";
pub const CONFIG_FILE: &str = ".runbook/config.yaml";
pub const DEFAULT_STORE_DIR: &str = ".runbook/completions";
pub const DEFAULT_PLAYBOOK: &str = "playbooks/playbook.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn runbook_dir(root: &Path) -> PathBuf {
    root.join(RUNBOOK_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Resolve a configured path against the project root. Absolute paths pass
/// through unchanged.
pub fn resolve(root: &Path, configured: &str) -> PathBuf {
    let p = Path::new(configured);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        root.join(p)
    }
}
