// hbnb - Core Library
// Entity registry with file durability, relationship resolution, and the
// HTTP transport that exposes them (feature `server`).

pub mod config;
pub mod entities;
pub mod operations;
pub mod registry;
pub mod resolver;
pub mod storage;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use config::Config;
pub use entities::{
    Amenity, Base, City, Entity, ForeignKey, Kind, Payload, Place, Review, State, User,
};
pub use registry::{ObjectRegistry, UNKNOWN_KIND_COUNT};
pub use resolver::{Resolver, SearchFilter};
pub use storage::{Backend, FileBackend, MemoryBackend, RestoreOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result type alias for registry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for registry operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{kind} not found: {id}")]
    NotFound { kind: Kind, id: String },

    /// Rejected payload; the message is meant for the client as-is
    #[error("{0}")]
    MalformedInput(String),

    #[error("Unknown kind: {0}")]
    UnknownKind(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn not_found(kind: Kind, id: &str) -> Self {
        Error::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}
