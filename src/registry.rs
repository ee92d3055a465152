// 🗃️ Object Registry - authoritative in-memory store of live entities
//
// One global id space, partitioned by kind only through the discriminator.
// Every mutating call flushes the FULL registry to the backend before it
// returns; there is never an implicit unflushed write.
//
// Not internally synchronized: a multi-threaded host must hold a single lock
// around each registry call (the HTTP server keeps it in Arc<Mutex<_>>).

use crate::entities::{Entity, Kind};
use crate::storage::{self, Backend, FileBackend, MemoryBackend, RestoreOutcome};
use crate::Result;
use std::collections::HashMap;
use std::path::PathBuf;

/// Returned by `count_by_name` for a kind name outside the closed set
pub const UNKNOWN_KIND_COUNT: i64 = -1;

pub struct ObjectRegistry {
    objects: HashMap<String, Entity>,
    backend: Box<dyn Backend>,
}

impl ObjectRegistry {
    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Open a registry over `backend`, restoring whatever it holds.
    /// Never fails: an absent or corrupt store yields an empty registry.
    pub fn open(backend: impl Backend + 'static) -> Self {
        let mut registry = ObjectRegistry {
            objects: HashMap::new(),
            backend: Box::new(backend),
        };
        registry.restore();
        registry
    }

    /// Registry backed by a JSON file
    pub fn open_file(path: impl Into<PathBuf>) -> Self {
        Self::open(FileBackend::new(path))
    }

    /// Empty registry backed by memory only
    pub fn in_memory() -> Self {
        Self::open(MemoryBackend::new())
    }

    /// Replace in-memory state with the backend's contents.
    pub fn restore(&mut self) -> RestoreOutcome {
        self.objects.clear();

        let bytes = match self.backend.load() {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                tracing::debug!("No store at {}, starting empty", self.backend.describe());
                return RestoreOutcome::Absent;
            }
            Err(e) => {
                tracing::warn!("Cannot read store {}: {}", self.backend.describe(), e);
                return RestoreOutcome::Corrupt {
                    reason: e.to_string(),
                };
            }
        };

        match storage::decode(&bytes) {
            Ok((objects, skipped)) => {
                let restored = objects.len();
                self.objects = objects;
                tracing::debug!(
                    "Restored {} entities from {} ({} skipped)",
                    restored,
                    self.backend.describe(),
                    skipped
                );
                RestoreOutcome::Loaded { restored, skipped }
            }
            Err(reason) => {
                tracing::warn!(
                    "Store {} is corrupt, starting empty: {}",
                    self.backend.describe(),
                    reason
                );
                RestoreOutcome::Corrupt { reason }
            }
        }
    }

    /// End of a unit of work: resync from the store.
    ///
    /// This is a reload, not a flush. Anything inserted but never saved is
    /// dropped.
    pub fn close_session(&mut self) -> RestoreOutcome {
        self.restore()
    }

    /// Flush the full registry to the backend.
    pub fn persist(&mut self) -> Result<()> {
        let bytes = storage::encode(&self.objects)?;
        self.backend.store(&bytes).map_err(|e| {
            tracing::error!("Failed to persist to {}: {}", self.backend.describe(), e);
            e
        })?;
        Ok(())
    }

    // ========================================================================
    // MUTATION
    // ========================================================================

    /// Add or overwrite by id. Visible to lookups at once; NOT persisted.
    pub fn insert(&mut self, entity: Entity) {
        self.objects.insert(entity.id().to_string(), entity);
    }

    /// Refresh `updated_at`, insert and flush. Returns the stored value.
    ///
    /// If the flush fails the previous value (or absence) is put back.
    pub fn save(&mut self, mut entity: Entity) -> Result<Entity> {
        entity.touch();
        let previous = self.objects.insert(entity.id().to_string(), entity.clone());
        if let Err(e) = self.persist() {
            self.revert(entity.id(), previous);
            return Err(e);
        }
        Ok(entity)
    }

    /// Remove by id if present, then flush. Returns the removed entity.
    ///
    /// If the flush fails the entity stays in the registry.
    pub fn delete(&mut self, entity: &Entity) -> Result<Option<Entity>> {
        let removed = self.objects.remove(entity.id());
        if let Err(e) = self.persist() {
            self.revert(entity.id(), removed);
            return Err(e);
        }
        Ok(removed)
    }

    fn revert(&mut self, id: &str, previous: Option<Entity>) {
        match previous {
            Some(entity) => {
                self.objects.insert(id.to_string(), entity);
            }
            None => {
                self.objects.remove(id);
            }
        }
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Entity with this id, only if it is of `kind`.
    pub fn lookup(&self, kind: Kind, id: &str) -> Option<&Entity> {
        self.objects.get(id).filter(|e| e.kind() == kind)
    }

    /// Lookup by kind name; an unrecognized name is simply "not found".
    pub fn lookup_by_name(&self, kind: &str, id: &str) -> Option<&Entity> {
        kind.parse::<Kind>()
            .ok()
            .and_then(|kind| self.lookup(kind, id))
    }

    /// Owned snapshot of every entity, or of one kind.
    pub fn enumerate(&self, kind: Option<Kind>) -> HashMap<String, Entity> {
        self.iter(kind)
            .map(|e| (e.id().to_string(), e.clone()))
            .collect()
    }

    /// Borrowing view used by the resolver.
    pub fn iter(&self, kind: Option<Kind>) -> impl Iterator<Item = &Entity> + '_ {
        self.objects
            .values()
            .filter(move |e| kind.map_or(true, |k| e.kind() == k))
    }

    pub fn count(&self, kind: Option<Kind>) -> usize {
        match kind {
            None => self.objects.len(),
            Some(kind) => self.iter(Some(kind)).count(),
        }
    }

    /// Count by kind name; `UNKNOWN_KIND_COUNT` for an unrecognized name.
    pub fn count_by_name(&self, kind: Option<&str>) -> i64 {
        match kind {
            None => self.objects.len() as i64,
            Some(name) => match name.parse::<Kind>() {
                Ok(kind) => self.count(Some(kind)) as i64,
                Err(_) => UNKNOWN_KIND_COUNT,
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================
