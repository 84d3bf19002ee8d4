//! In-memory stores for received OCPI objects

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use ocpi_core::resources::{PartyResource, ResourceKey};

/// Objects of one module, keyed by owner and id
pub struct ResourceStore<T> {
    objects: RwLock<HashMap<ResourceKey, T>>,
}

impl<T: PartyResource> ResourceStore<T> {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &ResourceKey) -> Option<T> {
        self.objects.read().get(key).cloned()
    }

    /// Insert or replace; `true` if the object is new
    pub fn put(&self, object: T) -> bool {
        let key = object.key();
        let created = self.objects.write().insert(key.clone(), object).is_none();
        debug!("Store: {} {} {}", if created { "Created" } else { "Replaced" }, T::KIND, key);
        created
    }

    /// Read-modify-write under one lock. `f` sees the current object (if any)
    /// and returns the replacement plus a value handed back to the caller.
    pub fn modify<R, E>(
        &self,
        key: &ResourceKey,
        f: impl FnOnce(Option<&T>) -> Result<(T, R), E>,
    ) -> Result<R, E> {
        let mut objects = self.objects.write();
        let (replacement, result) = f(objects.get(key))?;
        objects.insert(key.clone(), replacement);
        debug!("Store: Modified {} {}", T::KIND, key);
        Ok(result)
    }

    pub fn remove(&self, key: &ResourceKey) -> Option<T> {
        self.objects.write().remove(key)
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

impl<T: PartyResource> Default for ResourceStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
