//! Binary min-heap with stable handles for arbitrary-position removal.
//!
//! Every inserted entry gets a [`Handle`] that stays valid while the entry is
//! in the heap, no matter how often sift operations move it around. Handles
//! index a slot table that records each entry's current array position; the
//! table is updated on every swap, so removing by handle is `O(log n)`.
//!
//! Slots are recycled after their entry leaves the heap. Each slot carries a
//! generation counter that is bumped on release, so a handle to a removed
//! entry is detected as stale instead of aliasing whatever reuses the slot.
//!
//! Entries with equal keys come out in insertion order.

/// Stable reference to an entry in an [`IndexedHeap`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Handle {
    slot: u32,
    generation: u32,
}

#[derive(Debug)]
struct Entry<K, T> {
    key: K,
    seq: u64,
    payload: T,
    slot: u32,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    /// Current array position; `None` while the slot is free.
    position: Option<usize>,
    generation: u32,
}

/// Array-backed binary min-heap over `(key, payload)` pairs.
#[derive(Debug)]
pub struct IndexedHeap<K, T> {
    heap: Vec<Entry<K, T>>,
    slots: Vec<Slot>,
    free_slots: Vec<u32>,
    next_seq: u64,
}

impl<K: Ord, T> Default for IndexedHeap<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, T> IndexedHeap<K, T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
            free_slots: Vec::new(),
            next_seq: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Insert an entry and return its handle.
    pub fn insert(&mut self, key: K, payload: T) -> Handle {
        let handle = self.acquire_slot();
        let seq = self.next_seq;
        self.next_seq += 1;

        let position = self.heap.len();
        self.heap.push(Entry {
            key,
            seq,
            payload,
            slot: handle.slot,
        });
        self.slots[handle.slot as usize].position = Some(position);
        self.sift_up(position);
        handle
    }

    /// Remove and return the smallest entry.
    pub fn pop_min(&mut self) -> Option<(K, T)> {
        if self.heap.is_empty() {
            return None;
        }
        let last = self.heap.len() - 1;
        self.swap(0, last);
        let entry = self.heap.pop()?;
        self.release_slot(entry.slot);
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        Some((entry.key, entry.payload))
    }

    /// Remove the entry behind `handle`.
    ///
    /// The entry is floated to the root as if its key were minus infinity and
    /// then popped. Returns `None` if the handle is stale.
    pub fn remove(&mut self, handle: Handle) -> Option<(K, T)> {
        let mut position = self.position(handle)?;
        while position > 0 {
            let parent = (position - 1) / 2;
            self.swap(position, parent);
            position = parent;
        }
        self.pop_min()
    }

    /// Whether `handle` still refers to an entry in the heap.
    #[inline]
    pub fn contains(&self, handle: Handle) -> bool {
        self.position(handle).is_some()
    }

    /// Live entries with their handles, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &K, &T)> + '_ {
        let mut entries: Vec<&Entry<K, T>> = self.heap.iter().collect();
        entries.sort_unstable_by_key(|e| e.seq);
        entries.into_iter().map(move |e| {
            let handle = Handle {
                slot: e.slot,
                generation: self.slots[e.slot as usize].generation,
            };
            (handle, &e.key, &e.payload)
        })
    }

    fn position(&self, handle: Handle) -> Option<usize> {
        let slot = self.slots.get(handle.slot as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.position
    }

    fn acquire_slot(&mut self) -> Handle {
        match self.free_slots.pop() {
            Some(slot) => Handle {
                slot,
                generation: self.slots[slot as usize].generation,
            },
            None => {
                let slot = self.slots.len() as u32;
                self.slots.push(Slot {
                    position: None,
                    generation: 0,
                });
                Handle {
                    slot,
                    generation: 0,
                }
            }
        }
    }

    fn release_slot(&mut self, slot: u32) {
        let s = &mut self.slots[slot as usize];
        s.position = None;
        s.generation = s.generation.wrapping_add(1);
        self.free_slots.push(slot);
    }

    #[inline]
    fn less(&self, a: usize, b: usize) -> bool {
        let (ea, eb) = (&self.heap[a], &self.heap[b]);
        (&ea.key, ea.seq) < (&eb.key, eb.seq)
    }

    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.heap.swap(a, b);
        self.slots[self.heap[a].slot as usize].position = Some(a);
        self.slots[self.heap[b].slot as usize].position = Some(b);
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if !self.less(index, parent) {
                break;
            }
            self.swap(index, parent);
            index = parent;
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * index + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let child = if right < len && self.less(right, left) {
                right
            } else {
                left
            };
            if !self.less(child, index) {
                break;
            }
            self.swap(child, index);
            index = child;
        }
    }

    /// Check heap order and slot back-references.
    #[cfg(test)]
    fn assert_consistent(&self) {
        for (i, entry) in self.heap.iter().enumerate() {
            assert_eq!(self.slots[entry.slot as usize].position, Some(i));
            if i > 0 {
                assert!(!self.less(i, (i - 1) / 2), "heap order violated at {}", i);
            }
        }
        let live = self.slots.iter().filter(|s| s.position.is_some()).count();
        assert_eq!(live, self.heap.len());
    }
}
