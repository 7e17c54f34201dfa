use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use crate::error::LedgerError;
use crate::store::{Entity, EntityStore, Mutation, StoreError};

/// In-process store. `DashMap::get_mut` holds the shard lock for the whole
/// mutation, which is what makes `update` atomic per entity.
pub struct MemoryStore<T: Entity> {
    entries: DashMap<Uuid, Slot<T>>,
    next_seq: AtomicU64,
}

/// Insertion sequence breaks `created_at` ties, so entities created within
/// the same clock tick still list in the order they were first stored.
struct Slot<T> {
    seq: u64,
    value: T,
}

impl<T: Entity> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Entity> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> EntityStore<T> for MemoryStore<T> {
    fn get(&self, id: Uuid) -> Result<Option<T>, StoreError> {
        Ok(self.entries.get(&id).map(|entry| entry.value().value.clone()))
    }

    fn list(&self) -> Result<Vec<T>, StoreError> {
        let mut items: Vec<(u64, T)> = self
            .entries
            .iter()
            .map(|entry| (entry.value().seq, entry.value().value.clone()))
            .collect();
        items.sort_by(|(a_seq, a), (b_seq, b)| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a_seq.cmp(b_seq))
        });
        Ok(items.into_iter().map(|(_, item)| item).collect())
    }

    fn put(&self, entity: T) -> Result<(), StoreError> {
        match self.entries.entry(entity.id()) {
            Entry::Occupied(mut slot) => slot.get_mut().value = entity,
            Entry::Vacant(slot) => {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                slot.insert(Slot { seq, value: entity });
            }
        }
        Ok(())
    }

    fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.entries.remove(&id).is_some())
    }

    fn update(&self, id: Uuid, mutation: Mutation<'_, T>) -> Result<Option<T>, LedgerError> {
        let Some(mut entry) = self.entries.get_mut(&id) else {
            return Ok(None);
        };

        let mut draft = entry.value().value.clone();
        mutation(&mut draft)?;
        entry.value_mut().value = draft.clone();

        Ok(Some(draft))
    }
}
