//! The operations a front end drives: load a catalogue, list tasks and modes,
//! evaluate readiness, generate commands, record completion, reset a scope.
//!
//! Until a catalogue is loaded every task operation answers
//! [`WhenLoaded::NotLoaded`]. That is a normal waiting state, distinct from
//! the selection errors returned for unknown task or mode names.

use crate::command::{self, Generation};
use crate::config::Config;
use crate::error::Result;
use crate::params::{self, DerivedParam, Params};
use crate::playbook::{Playbook, Task};
use crate::readiness::{self, ReadinessVerdict};
use crate::recorder::{self, MarkDone};
use crate::store::{CompletionSet, CompletionStore, FileStore, KeyValueStore, Persistence};
use serde::Serialize;
use std::path::Path;

// ---------------------------------------------------------------------------
// Catalogue state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Catalogue {
    #[default]
    Unloaded,
    /// The last load attempt failed; terminal until the next attempt.
    Failed(String),
    Loaded(Playbook),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum WhenLoaded<T> {
    NotLoaded,
    Loaded(T),
}

impl<T> WhenLoaded<T> {
    pub fn loaded(self) -> Option<T> {
        match self {
            WhenLoaded::Loaded(v) => Some(v),
            WhenLoaded::NotLoaded => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct Engine<S> {
    catalogue: Catalogue,
    store: CompletionStore<S>,
    derived: Vec<DerivedParam>,
}

impl Engine<FileStore> {
    /// Engine over the file-backed store configured for `root`. The
    /// catalogue is not loaded yet.
    pub fn open(root: &Path, config: &Config) -> Self {
        Engine::new(FileStore::new(config.store_path(root))).with_derived(config.derived())
    }
}

impl<S: KeyValueStore> Engine<S> {
    pub fn new(backend: S) -> Self {
        Self {
            catalogue: Catalogue::Unloaded,
            store: CompletionStore::new(backend),
            derived: vec![DerivedParam::default()],
        }
    }

    pub fn with_derived(mut self, derived: Vec<DerivedParam>) -> Self {
        self.derived = derived;
        self
    }

    pub fn derived(&self) -> &[DerivedParam] {
        &self.derived
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    pub fn playbook(&self) -> Option<&Playbook> {
        match &self.catalogue {
            Catalogue::Loaded(pb) => Some(pb),
            _ => None,
        }
    }

    pub fn store(&self) -> &CompletionStore<S> {
        &self.store
    }

    // -----------------------------------------------------------------------
    // Catalogue
    // -----------------------------------------------------------------------

    /// Load the catalogue at `path`, replacing any previous one. Returns the
    /// task count. On failure no partial model is kept.
    pub fn load_catalogue(&mut self, path: &Path) -> Result<usize> {
        let result = Playbook::load(path);
        self.settle(result)
    }

    pub fn load_catalogue_str(&mut self, text: &str) -> Result<usize> {
        let result = Playbook::parse(text);
        self.settle(result)
    }

    pub fn install(&mut self, playbook: Playbook) -> usize {
        let count = playbook.task_count();
        self.catalogue = Catalogue::Loaded(playbook);
        count
    }

    fn settle(&mut self, result: Result<Playbook>) -> Result<usize> {
        match result {
            Ok(pb) => Ok(self.install(pb)),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load playbook");
                self.catalogue = Catalogue::Failed(e.to_string());
                Err(e)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Tasks in document order; empty until a catalogue is loaded.
    pub fn list_tasks(&self) -> &[Task] {
        self.playbook().map(Playbook::tasks).unwrap_or(&[])
    }

    pub fn list_modes(&self, task_id: &str) -> Result<WhenLoaded<Vec<String>>> {
        let Some(pb) = self.playbook() else {
            return Ok(WhenLoaded::NotLoaded);
        };
        let task = pb.require_task(task_id)?;
        Ok(WhenLoaded::Loaded(
            pb.modes_of(task).into_iter().map(str::to_string).collect(),
        ))
    }

    /// Full parameter context: catalogue defaults, non-blank overrides, then
    /// derived parameters.
    pub fn resolve_params(&self, overrides: &Params) -> Params {
        let empty = Params::new();
        let base = self.playbook().map(Playbook::placeholders).unwrap_or(&empty);
        params::resolve_with(base, overrides, &self.derived)
    }

    pub fn completed(&self, scope: &str) -> CompletionSet {
        self.store.load(scope)
    }

    pub fn evaluate_readiness(
        &self,
        task_id: &str,
        overrides: &Params,
        scope: &str,
    ) -> Result<WhenLoaded<ReadinessVerdict>> {
        self.evaluate_with(task_id, overrides, &self.completed(scope))
    }

    /// Readiness against an explicit completion set, e.g. a session cache.
    pub fn evaluate_with(
        &self,
        task_id: &str,
        overrides: &Params,
        completed: &CompletionSet,
    ) -> Result<WhenLoaded<ReadinessVerdict>> {
        let Some(pb) = self.playbook() else {
            return Ok(WhenLoaded::NotLoaded);
        };
        let task = pb.require_task(task_id)?;
        let params = self.resolve_params(overrides);
        Ok(WhenLoaded::Loaded(readiness::evaluate(task, &params, completed)))
    }

    pub fn generate_commands(
        &self,
        task_id: &str,
        mode: &str,
        overrides: &Params,
        scope: &str,
    ) -> Result<WhenLoaded<Generation>> {
        self.generate_with(task_id, mode, overrides, &self.completed(scope))
    }

    pub fn generate_with(
        &self,
        task_id: &str,
        mode: &str,
        overrides: &Params,
        completed: &CompletionSet,
    ) -> Result<WhenLoaded<Generation>> {
        let Some(pb) = self.playbook() else {
            return Ok(WhenLoaded::NotLoaded);
        };
        let params = self.resolve_params(overrides);
        let generation = command::generate_for(pb, task_id, mode, &params, completed)?;
        Ok(WhenLoaded::Loaded(generation))
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    pub fn mark_task_done(
        &mut self,
        task_id: &str,
        overrides: &Params,
        scope: &str,
    ) -> Result<WhenLoaded<MarkDone>> {
        let Some(pb) = self.playbook() else {
            return Ok(WhenLoaded::NotLoaded);
        };
        let task = pb.require_task(task_id)?.clone();
        let params = self.resolve_params(overrides);
        let done = recorder::mark_done(&mut self.store, &task, &params, scope)?;
        Ok(WhenLoaded::Loaded(done))
    }

    pub fn reset_scope(&mut self, scope: &str) -> Persistence {
        self.store.reset(scope)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
