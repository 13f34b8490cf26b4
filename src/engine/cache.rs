use super::profile::SequenceProfile;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

type Slot = Arc<OnceLock<Arc<SequenceProfile>>>;

/// Compute-once store of reference profiles keyed by reference id
///
/// The first caller for a key runs the computation; callers arriving while it
/// is in flight block on the same slot and receive its result. Completed
/// profiles stay until [`ReferenceCache::invalidate`]. A slot whose computation
/// panicked is removed once no other caller is waiting on it.
#[derive(Debug, Default)]
pub struct ReferenceCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl ReferenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute<F>(&self, key: &str, compute: F) -> Arc<SequenceProfile>
    where
        F: FnOnce() -> SequenceProfile,
    {
        let slot = {
            let mut slots = self.lock();
            Arc::clone(slots.entry(key.to_string()).or_default())
        };

        let _guard = AbandonedSlotGuard {
            cache: self,
            key,
            slot: &slot,
        };
        let profile = slot.get_or_init(|| {
            tracing::info!("Computing reference profile '{}'", key);
            Arc::new(compute())
        });
        Arc::clone(profile)
    }

    /// Completed profile for `key`, if any
    pub fn get(&self, key: &str) -> Option<Arc<SequenceProfile>> {
        let slots = self.lock();
        slots.get(key).and_then(|slot| slot.get().cloned())
    }

    pub fn invalidate(&self, key: &str) -> bool {
        let mut slots = self.lock();
        slots.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Drops a slot left uninitialized by a panicking computation
struct AbandonedSlotGuard<'a> {
    cache: &'a ReferenceCache,
    key: &'a str,
    slot: &'a Slot,
}

impl Drop for AbandonedSlotGuard<'_> {
    fn drop(&mut self) {
        if self.slot.get().is_some() {
            return;
        }
        let mut slots = self.cache.lock();
        // Only the map and this caller hold the slot; nobody else will fill it
        let abandoned = slots
            .get(self.key)
            .is_some_and(|held| Arc::ptr_eq(held, self.slot) && Arc::strong_count(held) == 2);
        if abandoned {
            tracing::warn!("Dropping abandoned reference slot '{}'", self.key);
            slots.remove(self.key);
        }
    }
}
