//! A reactive value persisted under one key of a [`StorageMedium`].
//!
//! The in-memory value is authoritative. Every update replaces it at once and
//! (re)arms a debounce deadline; the physical write happens when
//! [`PersistedStore::poll`] runs after the deadline has passed, so a burst of
//! updates costs one write holding the last value. Changes other contexts make
//! to the same key arrive through the medium's change feed and replace the
//! local value (last writer wins).
//!
//! Nothing here returns an error to the caller: parse and write failures are
//! logged and absorbed. Without a medium the store works purely in memory.

use std::rc::Rc;

use jiff::{SignedDuration, Timestamp};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::clock::Clock;
use crate::storage::{ChangeFeed, StorageError, StorageMedium};

/// Quiet period after the last update before the value is written.
pub const DEFAULT_DEBOUNCE: SignedDuration = SignedDuration::from_millis(300);

/// Why a write did not reach the medium.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("no storage medium available")]
    NoMedium,

    #[error("failed to serialize {key}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

type Listener<T> = Box<dyn FnMut(&T)>;

/// A value of type `T` that survives restarts via a named medium slot.
pub struct PersistedStore<T> {
    key: String,
    value: T,
    medium: Option<Rc<dyn StorageMedium>>,
    feed: Option<Box<dyn ChangeFeed>>,
    clock: Rc<dyn Clock>,
    debounce: SignedDuration,
    pending_write: Option<Timestamp>,
    listeners: Vec<Listener<T>>,
}

impl<T: Serialize + DeserializeOwned> PersistedStore<T> {
    /// Opens the store for `key`.
    ///
    /// The stored value is read synchronously; if it is absent or fails to
    /// parse, `default` is used instead. With `medium: None` the store runs
    /// in memory only.
    pub fn open(
        key: impl Into<String>,
        default: T,
        medium: Option<Rc<dyn StorageMedium>>,
        clock: Rc<dyn Clock>,
        debounce: SignedDuration,
    ) -> Self {
        let key = key.into();
        let value = match &medium {
            Some(medium) => read_initial(medium.as_ref(), &key).unwrap_or(default),
            None => {
                log::warn!("no storage medium; {key} will not be persisted");
                default
            }
        };
        let feed = medium.as_ref().and_then(|medium| match medium.subscribe() {
            Ok(feed) => Some(feed),
            Err(e) => {
                log::warn!("cannot watch {key} for external changes: {e}");
                None
            }
        });

        Self {
            key,
            value,
            medium,
            feed,
            clock,
            debounce,
            pending_write: None,
            listeners: Vec::new(),
        }
    }

    /// The current in-memory value.
    pub fn get(&self) -> &T {
        &self.value
    }

    /// The medium backing this store, if any.
    pub fn medium(&self) -> Option<&dyn StorageMedium> {
        self.medium.as_deref()
    }

    /// Replaces the value.
    pub fn set(&mut self, value: T) {
        self.commit(value);
    }

    /// Replaces the value with `f` applied to the latest value.
    pub fn update(&mut self, f: impl FnOnce(&T) -> T) {
        let next = f(&self.value);
        self.commit(next);
    }

    /// Registers a listener called with the new value after every local
    /// update and every adopted external change.
    pub fn on_change(&mut self, listener: impl FnMut(&T) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// When the pending write is due, if one is scheduled.
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.pending_write
    }

    /// Adopts external changes, then performs the pending write if it is due.
    ///
    /// Returns true if an external value was adopted.
    pub fn poll(&mut self) -> bool {
        let adopted = self.adopt_external();
        if let Some(deadline) = self.next_deadline()
            && self.clock.now() >= deadline
        {
            self.flush();
        }
        adopted
    }

    /// Performs the pending write now, if there is one.
    pub fn flush(&mut self) {
        if self.pending_write.is_none() {
            return;
        }
        match self.write_now() {
            Ok(()) => log::debug!("persisted {}", self.key),
            Err(PersistError::NoMedium) => {
                log::debug!("dropping write of {}: no storage medium", self.key);
            }
            Err(e) => log::error!("error writing {}: {e}", self.key),
        }
    }

    /// Writes the current value immediately, clearing any pending write.
    ///
    /// The only store operation that reports failure; a failed write is not
    /// retried.
    pub fn write_now(&mut self) -> Result<(), PersistError> {
        self.pending_write = None;
        let medium = self.medium.as_ref().ok_or(PersistError::NoMedium)?;
        let raw = serde_json::to_string(&self.value).map_err(|source| PersistError::Serialize {
            key: self.key.clone(),
            source,
        })?;
        medium.set_item(&self.key, &raw)?;
        Ok(())
    }

    fn commit(&mut self, value: T) {
        self.value = value;
        self.pending_write = Some(self.clock.now() + self.debounce);
        self.notify();
    }

    fn adopt_external(&mut self) -> bool {
        let events = match self.feed.as_mut().map(|feed| feed.drain()) {
            None => return false,
            Some(Ok(events)) => events,
            Some(Err(e)) => {
                log::warn!("error reading storage changes for {}: {e}", self.key);
                return false;
            }
        };

        let mut adopted = false;
        for event in events {
            if event.key != self.key {
                continue;
            }
            let Some(raw) = event.new_value.filter(|raw| !raw.is_empty()) else {
                log::debug!("{} removed elsewhere; keeping local value", self.key);
                continue;
            };
            if event.old_value.is_none() {
                log::debug!("{} created elsewhere", self.key);
            }
            match serde_json::from_str(&raw) {
                Ok(value) => {
                    self.value = value;
                    // The medium already holds this value.
                    self.pending_write = None;
                    self.notify();
                    adopted = true;
                }
                Err(e) => {
                    log::error!("error parsing new value for {} from storage event: {e}", self.key);
                }
            }
        }
        adopted
    }

    fn notify(&mut self) {
        for listener in &mut self.listeners {
            listener(&self.value);
        }
    }
}

/// Reads and parses the stored value, logging why it can't be used.
fn read_initial<T: DeserializeOwned>(medium: &dyn StorageMedium, key: &str) -> Option<T> {
    let raw = match medium.get_item(key) {
        Ok(raw) => raw?,
        Err(e) => {
            log::warn!("error reading {key}: {e}");
            return None;
        }
    };
    if raw.is_empty() {
        return None;
    }
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("error parsing stored {key}, using default: {e}");
            None
        }
    }
}
