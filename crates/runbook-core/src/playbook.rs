use crate::error::{Result, RunbookError};
use crate::params::{self, Params};
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSpec {
    #[serde(deserialize_with = "scalar")]
    pub cmd: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mode {
    #[serde(default, deserialize_with = "seq_or_empty")]
    pub commands: Vec<CommandSpec>,
}

impl Mode {
    pub fn templates(&self) -> Vec<String> {
        self.commands.iter().map(|c| c.cmd.clone()).collect()
    }
}

/// Mode name → Mode, in document order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Option<serde_yaml::Mapping>")]
pub struct ModeMap {
    entries: Vec<(String, Mode)>,
}

impl ModeMap {
    pub fn get(&self, name: &str) -> Option<&Mode> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, m)| m)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn first(&self) -> Option<&str> {
        self.entries.first().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Mode)> {
        self.entries.iter().map(|(n, m)| (n.as_str(), m))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, name: impl Into<String>, mode: Mode) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = mode,
            None => self.entries.push((name, mode)),
        }
    }
}

// serde_yaml::Mapping keeps insertion order; a null mapping is empty.
impl TryFrom<Option<serde_yaml::Mapping>> for ModeMap {
    type Error = serde_yaml::Error;

    fn try_from(raw: Option<serde_yaml::Mapping>) -> std::result::Result<Self, Self::Error> {
        let mut map = ModeMap::default();
        for (key, value) in raw.unwrap_or_default() {
            let name = params::stringify(&key).ok_or_else(|| {
                <serde_yaml::Error as serde::de::Error>::custom("mode name must not be null")
            })?;
            let mode: Option<Mode> = serde_yaml::from_value(value)?;
            map.insert(name, mode.unwrap_or_default());
        }
        Ok(map)
    }
}

impl Serialize for ModeMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, mode) in &self.entries {
            map.serialize_entry(name, mode)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(deserialize_with = "scalar")]
    pub id: String,
    #[serde(default, deserialize_with = "scalar_or_empty")]
    pub name: String,
    #[serde(
        default,
        deserialize_with = "optional_scalar",
        skip_serializing_if = "Option::is_none"
    )]
    pub phase: Option<String>,
    #[serde(default, deserialize_with = "scalars")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "scalars")]
    pub notes: Vec<String>,
    #[serde(default, deserialize_with = "scalars")]
    pub requires_files: Vec<String>,
    #[serde(default, deserialize_with = "scalars")]
    pub produces_files: Vec<String>,
    #[serde(default)]
    pub modes: ModeMap,
}

impl Task {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            phase: None,
            tags: Vec::new(),
            notes: Vec::new(),
            requires_files: Vec::new(),
            produces_files: Vec::new(),
            modes: ModeMap::default(),
        }
    }

    pub fn mode(&self, name: &str) -> Option<&Mode> {
        self.modes.get(name)
    }

    /// The mode a front end preselects: the first one declared.
    pub fn default_mode(&self) -> Option<&str> {
        self.modes.first()
    }
}

/// Accept a missing or `null` list as empty.
fn seq_or_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

// Catalogue text fields take any YAML scalar (`phase: 1`, `tags: [web, 2024]`)
// and render it the way placeholders are rendered.

fn optional_scalar<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;
    Ok(params::stringify(&value))
}

fn scalar<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    optional_scalar(deserializer)?
        .ok_or_else(|| serde::de::Error::custom("expected a value, found null"))
}

fn scalar_or_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_scalar(deserializer)?.unwrap_or_default())
}

/// A list of scalars; a missing or `null` list is empty and `null` items are
/// dropped.
fn scalars<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items: Vec<serde_yaml::Value> = seq_or_empty(deserializer)?;
    Ok(items.iter().filter_map(params::stringify).collect())
}

// ---------------------------------------------------------------------------
// Playbook
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawPlaybook {
    #[serde(default)]
    placeholders: Option<BTreeMap<String, serde_yaml::Value>>,
    #[serde(default)]
    tasks: Option<Vec<Task>>,
}

/// The parsed catalogue: default parameters plus tasks in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct Playbook {
    placeholders: Params,
    tasks: Vec<Task>,
}

impl Playbook {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RunbookError::PlaybookNotFound(path.display().to_string()));
        }
        let data = std::fs::read_to_string(path)?;
        let playbook = Self::parse(&data)?;
        tracing::debug!(
            path = %path.display(),
            tasks = playbook.task_count(),
            "loaded playbook"
        );
        Ok(playbook)
    }

    /// Parse a YAML (or JSON) catalogue document.
    pub fn parse(text: &str) -> Result<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(text)?;
        if value.is_null() {
            return Err(RunbookError::EmptyPlaybook);
        }
        let raw: RawPlaybook = serde_yaml::from_value(value)?;

        let placeholders = raw
            .placeholders
            .unwrap_or_default()
            .iter()
            .filter_map(|(k, v)| params::stringify(v).map(|s| (k.clone(), s)))
            .collect();

        Self::from_tasks(placeholders, raw.tasks.unwrap_or_default())
    }

    pub fn from_tasks(placeholders: Params, tasks: Vec<Task>) -> Result<Self> {
        if tasks.is_empty() {
            return Err(RunbookError::EmptyPlaybook);
        }
        check_unique_ids(&tasks)?;
        Ok(Self {
            placeholders,
            tasks,
        })
    }

    pub fn placeholders(&self) -> &Params {
        &self.placeholders
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn require_task(&self, id: &str) -> Result<&Task> {
        self.task(id)
            .ok_or_else(|| RunbookError::TaskNotFound(id.to_string()))
    }

    pub fn modes_of<'a>(&self, task: &'a Task) -> Vec<&'a str> {
        task.modes.names()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }
}

fn check_unique_ids(tasks: &[Task]) -> Result<()> {
    let mut seen = HashSet::new();
    for task in tasks {
        if !seen.insert(task.id.as_str()) {
            return Err(RunbookError::DuplicateTask(task.id.clone()));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
