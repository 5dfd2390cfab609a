//! The concurrent read-heavy state cache (spec §4.4). All mutation is
//! serialized through one `parking_lot::RwLock`; readers take the same lock
//! for a snapshot copy and release it immediately — the lock is never held
//! across an await, and it is always innermost relative to a session lock
//! (spec §5 Lock ordering).

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;

use crate::types::{DeviceRegistryEntry, EntityRegistryEntry, HaState};

#[derive(Debug, Default)]
struct Inner {
    states: HashMap<String, HaState>,
    by_domain: HashMap<String, HashSet<String>>,
    entity_registry: HashMap<String, EntityRegistryEntry>,
    device_registry: HashMap<String, DeviceRegistryEntry>,
}

#[derive(Debug, Default)]
pub struct StateCache {
    inner: RwLock<Inner>,
}

impl StateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a `state_changed` event. `new_state = None` removes the
    /// entity from both maps; `Some` upserts it (spec §4.4 Update rules).
    pub fn apply_state_changed(&self, entity_id: &str, new_state: Option<HaState>) {
        let mut inner = self.inner.write();
        match new_state {
            Some(state) => {
                let domain = state.domain().to_string();
                inner.states.insert(entity_id.to_string(), state);
                inner
                    .by_domain
                    .entry(domain)
                    .or_default()
                    .insert(entity_id.to_string());
            }
            None => {
                inner.states.remove(entity_id);
                for set in inner.by_domain.values_mut() {
                    set.remove(entity_id);
                }
            }
        }
    }

    pub fn get_state(&self, entity_id: &str) -> Option<HaState> {
        self.inner.read().states.get(entity_id).cloned()
    }

    pub fn contains_domain(&self, domain: &str, entity_id: &str) -> bool {
        self.inner
            .read()
            .by_domain
            .get(domain)
            .map(|s| s.contains(entity_id))
            .unwrap_or(false)
    }

    /// Replace the entire entity registry atomically (spec §4.4: "registries
    /// are replaced atomically on full refresh").
    pub fn replace_entity_registry(&self, entries: Vec<EntityRegistryEntry>) {
        let map = entries.into_iter().map(|e| (e.entity_id.clone(), e)).collect();
        self.inner.write().entity_registry = map;
    }

    pub fn replace_device_registry(&self, entries: Vec<DeviceRegistryEntry>) {
        let map = entries.into_iter().map(|e| (e.id.clone(), e)).collect();
        self.inner.write().device_registry = map;
    }

    /// Snapshot all entity ids known to either the state map or the entity
    /// registry (resolver candidates include entities with registry
    /// metadata but no current state, per spec §4.4).
    pub fn candidate_ids(&self) -> Vec<String> {
        let inner = self.inner.read();
        let mut ids: HashSet<String> = inner.states.keys().cloned().collect();
        ids.extend(inner.entity_registry.keys().cloned());
        ids.into_iter().collect()
    }

    pub fn state_of(&self, entity_id: &str) -> Option<HaState> {
        self.inner.read().states.get(entity_id).cloned()
    }

    pub fn registry_entry(&self, entity_id: &str) -> Option<EntityRegistryEntry> {
        self.inner.read().entity_registry.get(entity_id).cloned()
    }

    pub fn device_entry(&self, device_id: &str) -> Option<DeviceRegistryEntry> {
        self.inner.read().device_registry.get(device_id).cloned()
    }

    pub fn domain_entities(&self, domain: &str) -> Vec<String> {
        self.inner
            .read()
            .by_domain
            .get(domain)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default()
    }
}
