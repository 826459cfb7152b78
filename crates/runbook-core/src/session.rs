use crate::command::Generation;
use crate::engine::{Engine, WhenLoaded};
use crate::error::{Result, RunbookError};
use crate::params::Params;
use crate::recorder::MarkDone;
use crate::store::{CompletionSet, KeyValueStore, Persistence};
use crate::view::TaskView;

/// One operator's interaction context: active scope, parameter overrides,
/// selected task and mode, and a cache of the scope's completion record.
///
/// Owned by the caller and passed explicitly; the engine holds no
/// per-operator state. The cache is reloaded on every scope change.
#[derive(Debug, Clone, Default)]
pub struct Session {
    scope: String,
    overrides: Params,
    task_id: Option<String>,
    mode: Option<String>,
    completed: CompletionSet,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn overrides(&self) -> &Params {
        &self.overrides
    }

    pub fn completed(&self) -> &CompletionSet {
        &self.completed
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    pub fn mode(&self) -> Option<&str> {
        self.mode.as_deref()
    }

    /// Switch scope and reload the completion cache from the store.
    pub fn set_scope<S: KeyValueStore>(&mut self, engine: &Engine<S>, scope: &str) {
        self.scope = scope.trim().to_string();
        self.completed = engine.completed(&self.scope);
    }

    pub fn set_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.overrides.insert(key.into(), value.into());
    }

    /// Select a task; its first mode becomes the selected mode.
    pub fn select_task<S: KeyValueStore>(
        &mut self,
        engine: &Engine<S>,
        task_id: &str,
    ) -> Result<()> {
        if let Some(pb) = engine.playbook() {
            let task = pb.require_task(task_id)?;
            self.mode = task.default_mode().map(str::to_string);
        }
        self.task_id = Some(task_id.to_string());
        Ok(())
    }

    pub fn select_mode<S: KeyValueStore>(
        &mut self,
        engine: &Engine<S>,
        mode: &str,
    ) -> Result<()> {
        if let (Some(pb), Some(task_id)) = (engine.playbook(), self.task_id.as_deref()) {
            let task = pb.require_task(task_id)?;
            if task.mode(mode).is_none() {
                return Err(RunbookError::ModeNotFound {
                    task: task_id.to_string(),
                    mode: mode.to_string(),
                });
            }
        }
        self.mode = Some(mode.to_string());
        Ok(())
    }

    /// The selected task, or the catalogue's first task when none is.
    fn current_task<'a, S: KeyValueStore>(&'a self, engine: &'a Engine<S>) -> Option<&'a str> {
        self.task_id
            .as_deref()
            .or_else(|| engine.list_tasks().first().map(|t| t.id.as_str()))
    }

    /// Recompute what the front end shows, against the cached record.
    pub fn refresh<S: KeyValueStore>(&self, engine: &Engine<S>) -> Result<WhenLoaded<TaskView>> {
        let Some(pb) = engine.playbook() else {
            return Ok(WhenLoaded::NotLoaded);
        };
        let task_id = self
            .current_task(engine)
            .ok_or_else(|| RunbookError::TaskNotFound(String::new()))?;
        let task = pb.require_task(task_id)?;
        let params = engine.resolve_params(&self.overrides);
        let verdict = crate::readiness::evaluate(task, &params, &self.completed);
        Ok(WhenLoaded::Loaded(TaskView::build(
            task,
            &params,
            engine.derived(),
            verdict,
            &self.scope,
        )))
    }

    /// Generate for the selected task and mode. The cache is reloaded first so
    /// the gate reflects the store, not a stale view.
    pub fn generate<S: KeyValueStore>(
        &mut self,
        engine: &Engine<S>,
    ) -> Result<WhenLoaded<Generation>> {
        if engine.playbook().is_none() {
            return Ok(WhenLoaded::NotLoaded);
        }
        self.completed = engine.completed(&self.scope);
        let task_id = self
            .current_task(engine)
            .ok_or_else(|| RunbookError::TaskNotFound(String::new()))?
            .to_string();
        let mode = match self.mode.clone() {
            Some(m) => m,
            None => engine
                .playbook()
                .and_then(|pb| pb.task(&task_id))
                .and_then(|t| t.default_mode())
                .ok_or_else(|| RunbookError::NoModes(task_id.clone()))?
                .to_string(),
        };
        engine.generate_with(&task_id, &mode, &self.overrides, &self.completed)
    }

    pub fn mark_done<S: KeyValueStore>(
        &mut self,
        engine: &mut Engine<S>,
    ) -> Result<WhenLoaded<MarkDone>> {
        let Some(task_id) = self.current_task(engine).map(str::to_string) else {
            return Ok(WhenLoaded::NotLoaded);
        };
        let outcome = engine.mark_task_done(&task_id, &self.overrides, &self.scope)?;
        if let WhenLoaded::Loaded(done) = &outcome {
            self.completed = done.completed.clone();
        }
        Ok(outcome)
    }

    /// Clear the active scope's record, in the store and in the cache.
    pub fn reset<S: KeyValueStore>(&mut self, engine: &mut Engine<S>) -> Result<Persistence> {
        if self.scope.is_empty() {
            return Err(RunbookError::NoActiveScope);
        }
        let persistence = engine.reset_scope(&self.scope);
        self.completed.clear();
        Ok(persistence)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
