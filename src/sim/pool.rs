//! Recycling entity pools
//!
//! Live records sit in a dense array so per-frame loops are plain slice walks.
//! Removal is a swap-remove; a slot table maps generation-tagged handles to
//! dense positions so a handle to a released record can never alias its
//! replacement. Released records are kept (not dropped) and handed back out
//! by the next `acquire`, so steady-state play allocates nothing.

use serde::{Deserialize, Serialize};

/// Records stored in a [`Pool`]
pub trait Pooled: Default {
    /// Mark the record live
    fn activate(&mut self);
    /// Clear the live flag and drop per-life state (keep allocations)
    fn deactivate(&mut self);
}

/// Stable reference to a pooled record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle {
    slot: u32,
    generation: u32,
}

impl Handle {
    /// Slot index; stable for the record's whole life, reused after release
    pub fn slot(self) -> usize {
        self.slot as usize
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    dense: Option<u32>,
}

/// Dense pool with generational handles
#[derive(Debug, Clone)]
pub struct Pool<T: Pooled> {
    /// Live records
    items: Vec<T>,
    /// Dense index -> slot index
    owners: Vec<u32>,
    slots: Vec<Slot>,
    free_slots: Vec<u32>,
    /// Released records waiting for reuse
    spare: Vec<T>,
}

impl<T: Pooled> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Pooled> Pool<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            owners: Vec::new(),
            slots: Vec::new(),
            free_slots: Vec::new(),
            spare: Vec::new(),
        }
    }

    /// Pool with `count` records pre-allocated in the spare list
    pub fn prewarmed(count: usize) -> Self {
        let mut pool = Self::new();
        pool.items.reserve(count);
        pool.owners.reserve(count);
        pool.spare.extend((0..count).map(|_| T::default()));
        pool
    }

    /// Take a record, reusing a spare one when available
    pub fn acquire(&mut self) -> (Handle, &mut T) {
        let mut record = self.spare.pop().unwrap_or_default();
        record.activate();

        let slot = match self.free_slots.pop() {
            Some(slot) => slot,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    dense: None,
                });
                (self.slots.len() - 1) as u32
            }
        };

        let dense = self.items.len();
        self.items.push(record);
        self.owners.push(slot);
        let entry = &mut self.slots[slot as usize];
        entry.dense = Some(dense as u32);

        let handle = Handle {
            slot,
            generation: entry.generation,
        };
        (handle, &mut self.items[dense])
    }

    /// Return a record to the pool. Stale handles are ignored.
    pub fn release(&mut self, handle: Handle) -> bool {
        let Some(dense) = self.dense_index(handle) else {
            return false;
        };

        let mut record = self.items.swap_remove(dense);
        self.owners.swap_remove(dense);
        if dense < self.items.len() {
            let moved = self.owners[dense] as usize;
            self.slots[moved].dense = Some(dense as u32);
        }

        let entry = &mut self.slots[handle.slot()];
        entry.dense = None;
        entry.generation = entry.generation.wrapping_add(1);
        self.free_slots.push(handle.slot);

        record.deactivate();
        self.spare.push(record);
        true
    }

    /// Release every live record
    pub fn release_all(&mut self) {
        while let Some(handle) = self.handle_at(0) {
            self.release(handle);
        }
    }

    fn dense_index(&self, handle: Handle) -> Option<usize> {
        let entry = self.slots.get(handle.slot())?;
        if entry.generation != handle.generation {
            return None;
        }
        entry.dense.map(|d| d as usize)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.dense_index(handle).is_some()
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.dense_index(handle).map(|d| &self.items[d])
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.dense_index(handle).map(|d| &mut self.items[d])
    }

    /// Handle of the record at a dense position
    pub fn handle_at(&self, dense: usize) -> Option<Handle> {
        let slot = *self.owners.get(dense)?;
        Some(Handle {
            slot,
            generation: self.slots[slot as usize].generation,
        })
    }

    /// Handles of all live records, in dense order
    pub fn handles(&self) -> Vec<Handle> {
        (0..self.items.len()).filter_map(|i| self.handle_at(i)).collect()
    }

    /// Live records in dense order
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut()
    }

    /// Live record count
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Records waiting for reuse
    pub fn spare_len(&self) -> usize {
        self.spare.len()
    }

    /// Live + spare; only grows when the spare list runs dry
    pub fn total(&self) -> usize {
        self.items.len() + self.spare.len()
    }

    /// Number of slot indices ever handed out (upper bound on `Handle::slot`)
    pub fn slot_capacity(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Dummy {
        active: bool,
        value: u32,
        scratch: Vec<u32>,
    }

    impl Pooled for Dummy {
        fn activate(&mut self) {
            self.active = true;
        }

        fn deactivate(&mut self) {
            self.active = false;
            self.scratch.clear();
        }
    }

    #[test]
    fn test_acquire_reuses_spare() {
        let mut pool: Pool<Dummy> = Pool::prewarmed(2);
        assert_eq!(pool.total(), 2);
        let (a, rec) = pool.acquire();
        rec.value = 7;
        assert!(rec.active);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.spare_len(), 1);
        assert_eq!(pool.total(), 2);
        assert_eq!(pool.get(a).unwrap().value, 7);
    }

    #[test]
    fn test_grows_when_empty() {
        let mut pool: Pool<Dummy> = Pool::new();
        pool.acquire();
        pool.acquire();
        assert_eq!(pool.total(), 2);
    }

    #[test]
    fn test_release_clears_active_and_recycles() {
        let mut pool: Pool<Dummy> = Pool::new();
        let (h, rec) = pool.acquire();
        rec.scratch.extend([1, 2, 3]);
        assert!(pool.release(h));
        assert_eq!(pool.len(), 0);
        assert_eq!(pool.spare_len(), 1);
        let (_, again) = pool.acquire();
        assert!(again.active);
        assert!(again.scratch.is_empty());
        assert!(again.scratch.capacity() >= 3);
    }

    #[test]
    fn test_stale_handle_rejected() {
        let mut pool: Pool<Dummy> = Pool::new();
        let (old, _) = pool.acquire();
        pool.release(old);
        let (new, _) = pool.acquire();
        assert_eq!(old.slot(), new.slot());
        assert!(!pool.contains(old));
        assert!(pool.contains(new));
        assert!(!pool.release(old));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_swap_remove_keeps_handles_valid() {
        let mut pool: Pool<Dummy> = Pool::new();
        let handles: Vec<Handle> = (0..5)
            .map(|i| {
                let (h, rec) = pool.acquire();
                rec.value = i;
                h
            })
            .collect();
        pool.release(handles[1]);
        for (i, h) in handles.iter().enumerate() {
            if i == 1 {
                assert!(pool.get(*h).is_none());
            } else {
                assert_eq!(pool.get(*h).unwrap().value, i as u32);
            }
        }
    }

    #[test]
    fn test_release_all() {
        let mut pool: Pool<Dummy> = Pool::prewarmed(3);
        for _ in 0..5 {
            pool.acquire();
        }
        pool.release_all();
        assert!(pool.is_empty());
        assert_eq!(pool.spare_len(), 5);
    }
}
