// 💾 Durability Layer - registry ⇄ flat JSON store
//
// Persisted form: one JSON object `{ "<id>": <record>, ... }`, every record a
// flat field map carrying its `__class__` discriminator.
//
// - persist: always the FULL registry, write-then-replace
// - restore: missing store is normal (first run), corrupt store is reported
//   but never fatal, unknown discriminators are skipped

use crate::entities::{Entity, Kind};
use crate::Result;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

// ============================================================================
// BACKEND
// ============================================================================

/// Byte-addressable persisted store.
pub trait Backend: Send {
    /// Full contents, or `None` when nothing has been stored yet.
    fn load(&self) -> io::Result<Option<Vec<u8>>>;

    /// Replace the full contents. Readers must never see a partial write.
    fn store(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Human-readable location for logs.
    fn describe(&self) -> String;
}

/// JSON file on disk. Writes go to a sibling temp file that is renamed over
/// the target, so the target is always either the old or the new snapshot.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileBackend { path: path.into() }
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Backend for FileBackend {
    fn load(&self) -> io::Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn store(&mut self, bytes: &[u8]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let staging = self.staging_path();
        fs::write(&staging, bytes)?;
        fs::rename(&staging, &self.path).map_err(|e| {
            if let Err(cleanup) = fs::remove_file(&staging) {
                tracing::warn!("Cannot remove {}: {}", staging.display(), cleanup);
            }
            e
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory store. Clones share the same bytes, which lets a test "restart"
/// a registry against what a previous instance persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    bytes: Arc<Mutex<Option<Vec<u8>>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-seeded with raw contents
    pub fn with_contents(bytes: impl Into<Vec<u8>>) -> Self {
        MemoryBackend {
            bytes: Arc::new(Mutex::new(Some(bytes.into()))),
        }
    }

    pub fn contents(&self) -> Option<Vec<u8>> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Backend for MemoryBackend {
    fn load(&self) -> io::Result<Option<Vec<u8>>> {
        Ok(self.contents())
    }

    fn store(&mut self, bytes: &[u8]) -> io::Result<()> {
        *self.bytes.lock().unwrap_or_else(PoisonError::into_inner) = Some(bytes.to_vec());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

// ============================================================================
// RESTORE OUTCOME
// ============================================================================

/// What `restore` found. Every variant leaves a usable registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// No store yet (expected on first run); registry is empty
    Absent,

    /// Store read; `skipped` counts records with an unknown discriminator or
    /// an unreadable body
    Loaded { restored: usize, skipped: usize },

    /// Store present but unreadable as a whole; registry is empty
    Corrupt { reason: String },
}

impl RestoreOutcome {
    pub fn is_corrupt(&self) -> bool {
        matches!(self, RestoreOutcome::Corrupt { .. })
    }
}

// ============================================================================
// CODEC
// ============================================================================

/// Serialize the whole registry. Keys are sorted so the file diffs cleanly.
pub fn encode(objects: &HashMap<String, Entity>) -> Result<Vec<u8>> {
    let sorted: BTreeMap<&str, &Entity> = objects
        .iter()
        .map(|(id, entity)| (id.as_str(), entity))
        .collect();
    Ok(serde_json::to_vec(&sorted)?)
}

/// Rebuild entities from stored bytes.
///
/// Returns the decoded map plus the number of skipped records, or the reason
/// the store as a whole could not be read.
pub fn decode(bytes: &[u8]) -> std::result::Result<(HashMap<String, Entity>, usize), String> {
    let raw: BTreeMap<String, Value> =
        serde_json::from_slice(bytes).map_err(|e| e.to_string())?;

    let mut objects = HashMap::with_capacity(raw.len());
    let mut skipped = 0;

    for (key, record) in raw {
        let class = record.get("__class__").and_then(Value::as_str);
        if class.and_then(|c| c.parse::<Kind>().ok()).is_none() {
            tracing::debug!("Skipping record {} with discriminator {:?}", key, class);
            skipped += 1;
            continue;
        }

        match serde_json::from_value::<Entity>(record) {
            Ok(entity) => {
                objects.insert(entity.id().to_string(), entity);
            }
            Err(e) => {
                tracing::warn!("Skipping unreadable record {}: {}", key, e);
                skipped += 1;
            }
        }
    }

    Ok((objects, skipped))
}

// ============================================================================
// TESTS
// ============================================================================
