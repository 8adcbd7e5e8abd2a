//! In-process medium for tests.
//!
//! A [`MemoryOrigin`] is the shared storage; each [`MemoryMedium`] obtained
//! from it is a separate context, like one browser tab.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};

use super::{ChangeFeed, Result, StorageError, StorageEvent, StorageMedium};

#[derive(Default)]
struct OriginState {
    items: BTreeMap<String, String>,
    subscribers: Vec<(u64, Sender<StorageEvent>)>,
    next_context: u64,
    quota: Option<usize>,
}

impl OriginState {
    fn used_bytes_without(&self, key: &str) -> usize {
        self.items
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }

    fn broadcast(&mut self, from: u64, event: &StorageEvent) {
        self.subscribers
            .retain(|(context, tx)| *context == from || tx.send(event.clone()).is_ok());
    }
}

/// Shared in-memory storage for a single origin.
#[derive(Clone, Default)]
pub struct MemoryOrigin {
    state: Rc<RefCell<OriginState>>,
}

impl MemoryOrigin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits the total size (keys plus values, in bytes) the origin accepts.
    pub fn with_quota(self, bytes: usize) -> Self {
        self.state.borrow_mut().quota = Some(bytes);
        self
    }

    /// Opens a new context on this origin.
    pub fn context(&self) -> MemoryMedium {
        let mut state = self.state.borrow_mut();
        let context = state.next_context;
        state.next_context += 1;
        MemoryMedium {
            state: Rc::clone(&self.state),
            context,
        }
    }
}

/// One context attached to a [`MemoryOrigin`].
pub struct MemoryMedium {
    state: Rc<RefCell<OriginState>>,
    context: u64,
}

impl StorageMedium for MemoryMedium {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.state.borrow().items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if let Some(quota) = state.quota {
            let needed = key.len() + value.len();
            let available = quota.saturating_sub(state.used_bytes_without(key));
            if needed > available {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    available,
                });
            }
        }

        let old_value = state.items.insert(key.to_string(), value.to_string());
        if old_value.as_deref() == Some(value) {
            return Ok(());
        }
        let event = StorageEvent {
            key: key.to_string(),
            old_value,
            new_value: Some(value.to_string()),
        };
        state.broadcast(self.context, &event);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if let Some(old_value) = state.items.remove(key) {
            let event = StorageEvent {
                key: key.to_string(),
                old_value: Some(old_value),
                new_value: None,
            };
            state.broadcast(self.context, &event);
        }
        Ok(())
    }

    fn subscribe(&self) -> Result<Box<dyn ChangeFeed>> {
        let (tx, rx) = mpsc::channel();
        self.state.borrow_mut().subscribers.push((self.context, tx));
        Ok(Box::new(MemoryFeed { rx }))
    }
}

struct MemoryFeed {
    rx: Receiver<StorageEvent>,
}

impl ChangeFeed for MemoryFeed {
    fn drain(&mut self) -> Result<Vec<StorageEvent>> {
        Ok(self.rx.try_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contexts_share_items() {
        let origin = MemoryOrigin::new();
        let a = origin.context();
        let b = origin.context();

        a.set_item("appData", "{}").unwrap();

        assert_eq!(b.get_item("appData").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn events_reach_other_contexts_only() {
        let origin = MemoryOrigin::new();
        let a = origin.context();
        let b = origin.context();
        let mut a_feed = a.subscribe().unwrap();
        let mut b_feed = b.subscribe().unwrap();

        a.set_item("appData", "1").unwrap();

        assert!(a_feed.drain().unwrap().is_empty());
        assert_eq!(b_feed.drain().unwrap().len(), 1);
    }

    #[test]
    fn quota_rejects_oversized_writes() {
        let origin = MemoryOrigin::new().with_quota(16);
        let medium = origin.context();

        medium.set_item("k", "short").unwrap();
        let err = medium.set_item("k", "this value is far too long").unwrap_err();

        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        assert_eq!(medium.get_item("k").unwrap().as_deref(), Some("short"));
    }
}
