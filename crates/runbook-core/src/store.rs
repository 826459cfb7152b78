//! Completion records: the per-scope set of artifact identifiers marked done,
//! persisted through a pluggable key-value backend.
//!
//! Persistence is best-effort. Backend failures and corrupt entries never
//! surface as errors from [`CompletionStore`]; loads degrade to an empty set
//! and writes report [`Persistence::Degraded`] so the caller can decide
//! whether to care.

use crate::error::Result;
use crate::io;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Artifact identifiers recorded as done for one scope.
pub type CompletionSet = BTreeSet<String>;

/// Versioned namespace for persisted records. Bump when the value format
/// changes so old entries are never misread.
pub const KEY_PREFIX: &str = "runbook_completed_files_v1";

/// Scope used when the operator has not chosen one.
pub const FALLBACK_SCOPE: &str = "default";

// ---------------------------------------------------------------------------
// Backend trait
// ---------------------------------------------------------------------------

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn delete(&mut self, key: &str) -> Result<()>;
}

/// In-process backend, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One JSON file per key inside `dir`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", encode_key(key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(path)?))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        io::atomic_write(&self.path_for(key), value.as_bytes())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        io::remove_if_exists(&self.path_for(key))?;
        Ok(())
    }
}

/// Percent-encode everything outside `[A-Za-z0-9._-]` so distinct keys map to
/// distinct, portable filenames.
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for b in key.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Persistence outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Persistence {
    Persisted,
    Degraded(String),
}

impl Persistence {
    pub fn is_persisted(&self) -> bool {
        matches!(self, Persistence::Persisted)
    }
}

// ---------------------------------------------------------------------------
// CompletionStore
// ---------------------------------------------------------------------------

/// Storage key for a scope: lower-cased, with [`FALLBACK_SCOPE`] for blank
/// scopes, under [`KEY_PREFIX`].
pub fn scope_key(scope: &str) -> String {
    let scope = scope.trim();
    let scope = if scope.is_empty() {
        FALLBACK_SCOPE.to_string()
    } else {
        scope.to_lowercase()
    };
    format!("{KEY_PREFIX}:{scope}")
}

#[derive(Debug, Clone, Default)]
pub struct CompletionStore<S> {
    backend: S,
}

impl<S: KeyValueStore> CompletionStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn key(scope: &str) -> String {
        scope_key(scope)
    }

    /// Load the record for `scope`; empty on any failure.
    pub fn load(&self, scope: &str) -> CompletionSet {
        self.load_checked(scope).0
    }

    /// Like [`load`](Self::load), also reporting whether the read degraded.
    pub fn load_checked(&self, scope: &str) -> (CompletionSet, Persistence) {
        let key = scope_key(scope);
        let raw = match self.backend.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return (CompletionSet::new(), Persistence::Persisted),
            Err(e) => return degraded_load(&key, e.to_string()),
        };
        match parse_record(&raw) {
            Ok(set) => (set, Persistence::Persisted),
            Err(reason) => degraded_load(&key, reason),
        }
    }

    pub fn save(&mut self, scope: &str, completed: &CompletionSet) -> Persistence {
        let key = scope_key(scope);
        let items: Vec<&String> = completed.iter().collect();
        let result = serde_json::to_string(&items)
            .map_err(crate::RunbookError::from)
            .and_then(|data| self.backend.set(&key, &data));
        match result {
            Ok(()) => {
                tracing::debug!(key = %key, artifacts = completed.len(), "saved completion record");
                Persistence::Persisted
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "completion record not saved");
                Persistence::Degraded(e.to_string())
            }
        }
    }

    pub fn reset(&mut self, scope: &str) -> Persistence {
        let key = scope_key(scope);
        match self.backend.delete(&key) {
            Ok(()) => {
                tracing::debug!(key = %key, "reset completion record");
                Persistence::Persisted
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "completion record not reset");
                Persistence::Degraded(e.to_string())
            }
        }
    }
}

fn degraded_load(key: &str, reason: String) -> (CompletionSet, Persistence) {
    tracing::warn!(key = %key, reason = %reason, "completion record unreadable; starting empty");
    (CompletionSet::new(), Persistence::Degraded(reason))
}

/// A record is a JSON array; non-string elements can never match an artifact
/// identifier and are dropped.
fn parse_record(raw: &str) -> std::result::Result<CompletionSet, String> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    match value {
        serde_json::Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|v| match v {
                serde_json::Value::String(s) => Some(s),
                _ => None,
            })
            .collect()),
        _ => Err("completion record is not an array".to_string()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RunbookError;
    use tempfile::TempDir;

    /// Backend whose every call fails, like a full or read-only disk.
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(RunbookError::Io(std::io::Error::other("disk on fire")))
        }
        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(RunbookError::Io(std::io::Error::other("quota exceeded")))
        }
        fn delete(&mut self, _key: &str) -> Result<()> {
            Err(RunbookError::Io(std::io::Error::other("read-only")))
        }
    }

    fn set_of(items: &[&str]) -> CompletionSet {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn key_is_lowercased_and_namespaced() {
        assert_eq!(
            scope_key("Example.COM"),
            "runbook_completed_files_v1:example.com"
        );
        assert_eq!(scope_key(""), "runbook_completed_files_v1:default");
        assert_eq!(scope_key("   "), "runbook_completed_files_v1:default");
        assert_eq!(scope_key("a.io"), CompletionStore::<MemoryStore>::key("A.IO"));
    }

    #[test]
    fn first_access_is_empty() {
        let store = CompletionStore::new(MemoryStore::new());
        let (set, persistence) = store.load_checked("example.com");
        assert!(set.is_empty());
        assert!(persistence.is_persisted());
    }

    #[test]
    fn save_then_load() {
        let mut store = CompletionStore::new(MemoryStore::new());
        let set = set_of(&["./out/example.com/hosts.txt", "./out/example.com/urls.txt"]);
        assert_eq!(store.save("example.com", &set), Persistence::Persisted);
        assert_eq!(store.load("EXAMPLE.com"), set);
        assert!(store.load("other.com").is_empty());
    }

    #[test]
    fn persisted_value_is_json_array() {
        let mut store = CompletionStore::new(MemoryStore::new());
        store.save("x.io", &set_of(&["b", "a"]));
        let raw = store
            .backend()
            .raw("runbook_completed_files_v1:x.io")
            .unwrap();
        assert_eq!(raw, r#"["a","b"]"#);
    }

    #[test]
    fn corrupt_entries_load_empty() {
        let mut backend = MemoryStore::new();
        backend.set(&scope_key("bad"), "{not json").unwrap();
        backend.set(&scope_key("obj"), r#"{"a":1}"#).unwrap();
        backend.set(&scope_key("mixed"), r#"["a", 3, null, "b"]"#).unwrap();
        let store = CompletionStore::new(backend);

        let (set, persistence) = store.load_checked("bad");
        assert!(set.is_empty());
        assert!(matches!(persistence, Persistence::Degraded(_)));
        assert!(store.load("obj").is_empty());
        assert_eq!(store.load("mixed"), set_of(&["a", "b"]));
    }

    #[test]
    fn reset_deletes_entry() {
        let mut store = CompletionStore::new(MemoryStore::new());
        store.save("s", &set_of(&["a"]));
        assert_eq!(store.reset("s"), Persistence::Persisted);
        assert!(store.load("s").is_empty());
        assert!(store.backend().raw(&scope_key("s")).is_none());
    }

    #[test]
    fn backend_failures_are_absorbed() {
        let mut store = CompletionStore::new(BrokenStore);
        assert!(store.load("s").is_empty());
        assert!(matches!(
            store.save("s", &set_of(&["a"])),
            Persistence::Degraded(reason) if reason.contains("quota")
        ));
        assert!(!store.reset("s").is_persisted());
    }

    #[test]
    fn file_store_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut store = CompletionStore::new(FileStore::new(dir.path().join("completions")));
        store.save("Example.com", &set_of(&["./out/example.com/hosts.txt"]));

        let reopened = CompletionStore::new(FileStore::new(dir.path().join("completions")));
        assert_eq!(
            reopened.load("example.com"),
            set_of(&["./out/example.com/hosts.txt"])
        );

        let mut reopened = reopened;
        reopened.reset("example.com");
        assert!(reopened.load("example.com").is_empty());
    }

    #[test]
    fn file_store_tolerates_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let backend = FileStore::new(dir.path());
        std::fs::write(backend.path_for(&scope_key("x.io")), "garbage").unwrap();
        let store = CompletionStore::new(backend);
        assert!(store.load("x.io").is_empty());
    }

    #[test]
    fn encoded_keys_do_not_collide() {
        let a = encode_key("runbook_completed_files_v1:a:b");
        let b = encode_key("runbook_completed_files_v1:a_b");
        assert_ne!(a, b);
        assert_eq!(a, "runbook_completed_files_v1%3Aa%3Ab");
    }
}
