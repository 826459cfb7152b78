use crate::error::Result;
use crate::params::DerivedParam;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Catalogue path, relative to the project root unless absolute.
    #[serde(default = "default_playbook")]
    pub playbook: String,
    /// Directory holding one completion record per scope.
    #[serde(default = "default_store_dir")]
    pub store_dir: String,
    /// Parameter whose value doubles as the scope when none is given.
    #[serde(default = "default_scope_param")]
    pub scope_param: String,
    #[serde(default)]
    pub outdir: DerivedParam,
}

fn default_version() -> u32 {
    1
}

fn default_playbook() -> String {
    paths::DEFAULT_PLAYBOOK.to_string()
}

fn default_store_dir() -> String {
    paths::DEFAULT_STORE_DIR.to_string()
}

fn default_scope_param() -> String {
    "domain".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            playbook: default_playbook(),
            store_dir: default_store_dir(),
            scope_param: default_scope_param(),
            outdir: DerivedParam::default(),
        }
    }
}

impl Config {
    /// Load `.runbook/config.yaml`; defaults when the file does not exist.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn playbook_path(&self, root: &Path) -> PathBuf {
        paths::resolve(root, &self.playbook)
    }

    pub fn store_path(&self, root: &Path) -> PathBuf {
        paths::resolve(root, &self.store_dir)
    }

    pub fn derived(&self) -> Vec<DerivedParam> {
        vec![self.outdir.clone()]
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.playbook.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "playbook path is empty".to_string(),
            });
        }

        if self.store_dir.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "store_dir is empty".to_string(),
            });
        }

        if self.scope_param.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "scope_param is empty; every command will need --scope".to_string(),
            });
        }

        if self.outdir.name.trim().is_empty() || self.outdir.source.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "outdir.name and outdir.source must both be set".to_string(),
            });
        }

        if self.outdir.name == self.outdir.source {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "outdir.name '{}' overwrites its own source parameter",
                    self.outdir.name
                ),
            });
        }

        if self.outdir.base.ends_with('/') {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "outdir.base '{}' ends with '/'; derived paths will contain '//'",
                    self.outdir.base
                ),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.outdir.base, "./out");
        assert_eq!(parsed.outdir.fallback, "target");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let yaml = "version: 1\nplaybook: books/web.yaml\noutdir:\n  base: /srv/out\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.playbook, "books/web.yaml");
        assert_eq!(cfg.store_dir, ".runbook/completions");
        assert_eq!(cfg.scope_param, "domain");
        assert_eq!(cfg.outdir.base, "/srv/out");
        assert_eq!(cfg.outdir.name, "outdir");
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::default();
        cfg.scope_param = "host".to_string();
        cfg.save(dir.path()).unwrap();
        assert!(dir.path().join(".runbook/config.yaml").exists());
        assert_eq!(Config::load(dir.path()).unwrap().scope_param, "host");
    }

    #[test]
    fn paths_resolve_against_root() {
        let cfg = Config::default();
        let root = Path::new("/tmp/proj");
        assert_eq!(
            cfg.playbook_path(root),
            PathBuf::from("/tmp/proj/playbooks/playbook.yaml")
        );
        assert_eq!(
            cfg.store_path(root),
            PathBuf::from("/tmp/proj/.runbook/completions")
        );
    }

    #[test]
    fn validate_default_is_clean() {
        assert!(Config::default().validate().is_empty());
    }

    #[test]
    fn validate_flags_self_shadowing_outdir() {
        let mut cfg = Config::default();
        cfg.outdir.name = "domain".to_string();
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("overwrites its own source")));
    }

    #[test]
    fn validate_flags_trailing_slash_and_empty_paths() {
        let mut cfg = Config::default();
        cfg.outdir.base = "./out/".to_string();
        cfg.playbook = "".to_string();
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.message.contains("'//'")));
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("playbook")));
    }
}
