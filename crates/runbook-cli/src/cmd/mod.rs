pub mod config;
pub mod generate;
pub mod init;
pub mod record;
pub mod scope;
pub mod show;
pub mod tasks;

use anyhow::Context;
use clap::Args;
use runbook_core::config::Config;
use runbook_core::params::{parse_assignment, Params};
use runbook_core::playbook::Playbook;
use runbook_core::session::Session;
use runbook_core::store::FileStore;
use runbook_core::Engine;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Shared parameter flags
// ---------------------------------------------------------------------------

#[derive(Args, Debug, Clone, Default)]
pub struct ParamArgs {
    /// Completion scope (default: the value of the scope parameter, e.g. --domain)
    #[arg(long)]
    pub scope: Option<String>,

    /// Parameter override as KEY=VALUE (repeatable; blank values keep the default)
    #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Shorthand for --param domain=VALUE
    #[arg(long)]
    pub domain: Option<String>,

    /// Shorthand for --param url=VALUE
    #[arg(long)]
    pub url: Option<String>,
}

impl ParamArgs {
    pub fn overrides(&self) -> anyhow::Result<Params> {
        let mut overrides = Params::new();
        for raw in &self.params {
            let (key, value) = parse_assignment(raw)?;
            overrides.insert(key, value);
        }
        if let Some(domain) = &self.domain {
            overrides.insert("domain".to_string(), domain.clone());
        }
        if let Some(url) = &self.url {
            overrides.insert("url".to_string(), url.clone());
        }
        Ok(overrides)
    }

    /// `--scope`, else the override of the configured scope parameter.
    /// Empty when neither is given.
    pub fn scope(&self, config: &Config, overrides: &Params) -> String {
        self.scope
            .as_deref()
            .or_else(|| overrides.get(&config.scope_param).map(String::as_str))
            .unwrap_or("")
            .trim()
            .to_string()
    }
}

// ---------------------------------------------------------------------------
// Workspace
// ---------------------------------------------------------------------------

/// Config plus engine for one CLI invocation.
pub struct Workspace {
    pub root: PathBuf,
    pub config: Config,
    pub engine: Engine<FileStore>,
}

impl Workspace {
    /// Open the store without loading a catalogue.
    pub fn open(root: &Path) -> anyhow::Result<Self> {
        let config = Config::load(root).context("failed to load config")?;
        let engine = Engine::open(root, &config);
        Ok(Self {
            root: root.to_path_buf(),
            config,
            engine,
        })
    }

    /// Open the store and load the catalogue (`--playbook` or the configured one).
    pub fn load(root: &Path, playbook: Option<&Path>) -> anyhow::Result<Self> {
        let mut ws = Self::open(root)?;
        let path = match playbook {
            Some(p) => p.to_path_buf(),
            None => ws.config.playbook_path(root),
        };
        let count = ws
            .engine
            .load_catalogue(&path)
            .with_context(|| format!("failed to load playbook {}", path.display()))?;
        tracing::debug!(path = %path.display(), tasks = count, "catalogue ready");
        Ok(ws)
    }

    pub fn playbook(&self) -> anyhow::Result<&Playbook> {
        self.engine.playbook().context("playbook not loaded")
    }

    /// Session for this invocation: scope and overrides from the flags, and
    /// `task_id` selected when given.
    pub fn session(&self, task_id: Option<&str>, args: &ParamArgs) -> anyhow::Result<Session> {
        let overrides = args.overrides()?;
        let scope = args.scope(&self.config, &overrides);
        let mut session = Session::new();
        session.set_scope(&self.engine, &scope);
        for (key, value) in overrides {
            session.set_param(key, value);
        }
        if let Some(id) = task_id {
            session.select_task(&self.engine, id)?;
        }
        Ok(session)
    }
}
