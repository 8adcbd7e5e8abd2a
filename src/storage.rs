//! The storage medium: an origin-scoped, synchronous key-value store shared
//! by every execution context (process, window) of the application.
//!
//! Values are opaque strings. Each medium handle is one context; writes made
//! through it are announced to every *other* context through a
//! [`ChangeFeed`], never to itself.
//!
//! ```text
//! context A ──set_item──▶ medium ──StorageEvent──▶ context B's feed
//! ```

#[cfg(test)]
mod memory;
mod sqlite;

#[cfg(test)]
pub use memory::{MemoryMedium, MemoryOrigin};
pub use sqlite::SqliteMedium;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage quota exceeded writing {key} ({needed} bytes, {available} available)")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = core::result::Result<T, StorageError>;

/// A change made to the medium by another context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub old_value: Option<String>,
    /// `None` when the key was removed.
    pub new_value: Option<String>,
}

/// A synchronous key-value medium shared across contexts.
pub trait StorageMedium {
    /// Returns the raw value stored at `key`, if any.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` at `key`. Writing the value already stored is a no-op
    /// and produces no event.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing an absent key is a no-op.
    fn remove_item(&self, key: &str) -> Result<()>;

    /// Opens a feed of changes made by other contexts from now on.
    fn subscribe(&self) -> Result<Box<dyn ChangeFeed>>;
}

/// A source of [`StorageEvent`]s, drained by the owning context.
pub trait ChangeFeed {
    /// Returns every event received since the previous drain, oldest first.
    fn drain(&mut self) -> Result<Vec<StorageEvent>>;
}
