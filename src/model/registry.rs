use std::{
    any::{self, Any},
    collections::{BTreeSet, HashMap, hash_map},
    sync::Arc,
};

use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::model::ModelId;

pub type AnyModel = dyn Any + Send + Sync;

static GLOBAL: Lazy<ModelRegistry> = Lazy::new(ModelRegistry::new);

pub fn global() -> &'static ModelRegistry {
    &GLOBAL
}

struct Entry<M: ?Sized> {
    // `None` once removed. A retired entry has already been unlinked from the
    // table, so whoever finds it must treat the identity as absent.
    handle: Mutex<Option<Arc<M>>>,
}

// Lock order is entry lock, then table lock. The table lock is never held while
// waiting on an entry lock.
pub struct ModelRegistry<M: ?Sized = AnyModel> {
    entries: RwLock<HashMap<ModelId, Arc<Entry<M>>>>,
}

impl<M: ?Sized> Default for ModelRegistry<M> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<M: ?Sized> ModelRegistry<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, id: &ModelId) -> bool {
        self.fetch(id).is_some()
    }

    pub fn fetch(&self, id: &ModelId) -> Option<Arc<M>> {
        let entry = self.entry(id)?;
        entry.handle.lock().clone()
    }

    /// Stores `handle` under `id`, returning the handle it replaced.
    pub fn store(&self, id: ModelId, handle: Arc<M>) -> Option<Arc<M>> {
        loop {
            let entry = match self.entry(&id) {
                Some(entry) => entry,
                None => match self.entries.write().entry(id.clone()) {
                    hash_map::Entry::Vacant(slot) => {
                        slot.insert(Arc::new(Entry {
                            handle: Mutex::new(Some(handle)),
                        }));
                        debug!(model = %id, "model stored");
                        return None;
                    }
                    hash_map::Entry::Occupied(slot) => Arc::clone(slot.get()),
                },
            };

            let mut current = entry.handle.lock();
            if current.is_some() {
                let previous = current.replace(handle);
                debug!(model = %id, "model replaced");
                return previous;
            }
            // Lost to a concurrent remove; the entry is gone from the table.
            drop(current);
            debug!(model = %id, "entry removed concurrently, retrying store");
        }
    }

    /// Drops the registry's reference. Other holders keep the model alive.
    pub fn remove(&self, id: &ModelId) -> Option<Arc<M>> {
        let entry = self.entry(id)?;
        let mut current = entry.handle.lock();
        let removed = current.take()?;

        // Unlink before releasing the entry lock so nobody can acquire it and
        // find a retired entry still reachable from the table.
        let mut entries = self.entries.write();
        if entries.get(id).is_some_and(|linked| Arc::ptr_eq(linked, &entry)) {
            entries.remove(id);
        }
        drop(entries);
        drop(current);

        debug!(model = %id, external_refs = Arc::strong_count(&removed) - 1, "model removed");
        Some(removed)
    }

    pub fn list_model_names(&self) -> BTreeSet<String> {
        self.loaded()
            .into_iter()
            .map(|id| id.name().to_string())
            .collect()
    }

    pub fn list_versions(&self, name: &str) -> Vec<String> {
        let mut versions: Vec<String> = self
            .loaded()
            .into_iter()
            .filter(|id| id.name() == name)
            .map(|id| id.version().to_string())
            .collect();
        versions.sort();
        versions
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry(&self, id: &ModelId) -> Option<Arc<Entry<M>>> {
        self.entries.read().get(id).cloned()
    }

    // Snapshot the table first; entry locks are only taken once it is released.
    fn loaded(&self) -> Vec<ModelId> {
        let snapshot: Vec<(ModelId, Arc<Entry<M>>)> = self
            .entries
            .read()
            .iter()
            .map(|(id, entry)| (id.clone(), Arc::clone(entry)))
            .collect();

        snapshot
            .into_iter()
            .filter(|(_, entry)| entry.handle.lock().is_some())
            .map(|(id, _)| id)
            .collect()
    }
}

impl ModelRegistry<AnyModel> {
    pub fn fetch_as<T: Any + Send + Sync>(&self, id: &ModelId) -> Option<Arc<T>> {
        match self.fetch(id)?.downcast::<T>() {
            Ok(model) => Some(model),
            Err(_) => {
                warn!(model = %id, expected = any::type_name::<T>(), "stored model has a different type");
                None
            }
        }
    }
}
