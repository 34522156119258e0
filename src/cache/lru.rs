//! LRU List Module
//!
//! Arena-backed doubly-linked list that keeps cache entries in recency order.

use crate::cache::entry::{CacheEntry, SlotId};

// == LRU List ==
/// Owns every cache entry and threads them in access order.
///
/// Entries live in a slot arena; freed slots are recycled through a free
/// list. Ordering:
/// - Head = Most recently used
/// - Tail = Least recently used
#[derive(Debug)]
pub struct LruList<K, V> {
    /// Slot arena, `None` marks a free slot
    slots: Vec<Option<CacheEntry<K, V>>>,
    /// Recycled slot handles
    free: Vec<SlotId>,
    head: Option<SlotId>,
    tail: Option<SlotId>,
    len: usize,
}

impl<K, V> Default for LruList<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> LruList<K, V> {
    // == Constructor ==
    /// Creates a new empty list.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    // == Length ==
    /// Returns the number of linked entries.
    pub fn len(&self) -> usize {
        self.len
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Handle of the most recently used entry.
    pub fn head(&self) -> Option<SlotId> {
        self.head
    }

    /// Handle of the least recently used entry.
    pub fn tail(&self) -> Option<SlotId> {
        self.tail
    }

    pub fn get(&self, id: SlotId) -> Option<&CacheEntry<K, V>> {
        self.slots.get(id).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut CacheEntry<K, V>> {
        self.slots.get_mut(id).and_then(Option::as_mut)
    }

    // == Push Front ==
    /// Stores an entry and links it at the head.
    pub fn push_front(&mut self, entry: CacheEntry<K, V>) -> SlotId {
        let id = match self.free.pop() {
            Some(id) => {
                self.slots[id] = Some(entry);
                id
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        };
        self.len += 1;
        self.link_front(id);
        id
    }

    // == Move To Front ==
    /// Marks an entry as most recently used.
    pub fn move_to_front(&mut self, id: SlotId) {
        if self.head == Some(id) || self.get(id).is_none() {
            return;
        }
        self.unlink(id);
        self.link_front(id);
    }

    // == Remove ==
    /// Unlinks an entry and releases its slot.
    pub fn remove(&mut self, id: SlotId) -> Option<CacheEntry<K, V>> {
        self.get(id)?;
        self.unlink(id);
        let mut entry = self.slots[id].take()?;
        self.free.push(id);
        self.len -= 1;
        entry.prev = None;
        entry.next = None;
        Some(entry)
    }

    // == Pop Back ==
    /// Removes and returns the least recently used entry.
    pub fn pop_back(&mut self) -> Option<CacheEntry<K, V>> {
        let tail = self.tail?;
        self.remove(tail)
    }

    // == Drain ==
    /// Empties the list, yielding entries from most to least recently used.
    pub fn drain(&mut self) -> Vec<CacheEntry<K, V>> {
        let mut drained = Vec::with_capacity(self.len);
        let mut cursor = self.head;
        while let Some(id) = cursor {
            match self.slots[id].take() {
                Some(entry) => {
                    cursor = entry.next;
                    drained.push(entry);
                }
                None => break,
            }
        }
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
        drained
    }

    /// Iterates entries from most to least recently used.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            list: self,
            cursor: self.head,
            forward: true,
        }
    }

    /// Iterates entries from least to most recently used.
    pub fn iter_rev(&self) -> Iter<'_, K, V> {
        Iter {
            list: self,
            cursor: self.tail,
            forward: false,
        }
    }

    fn link_front(&mut self, id: SlotId) {
        let old_head = self.head;
        if let Some(entry) = self.slots[id].as_mut() {
            entry.prev = None;
            entry.next = old_head;
        }
        match old_head.and_then(|h| self.slots[h].as_mut()) {
            Some(head) => head.prev = Some(id),
            None => self.tail = Some(id),
        }
        self.head = Some(id);
    }

    fn unlink(&mut self, id: SlotId) {
        let (prev, next) = match self.slots[id].as_ref() {
            Some(entry) => (entry.prev, entry.next),
            None => return,
        };

        match prev.and_then(|p| self.slots[p].as_mut()) {
            Some(entry) => entry.next = next,
            None => self.head = next,
        }
        match next.and_then(|n| self.slots[n].as_mut()) {
            Some(entry) => entry.prev = prev,
            None => self.tail = prev,
        }

        if let Some(entry) = self.slots[id].as_mut() {
            entry.prev = None;
            entry.next = None;
        }
    }
}

// == Iterator ==
/// Cursor over the list links, yielding `(handle, entry)` pairs.
pub struct Iter<'a, K, V> {
    list: &'a LruList<K, V>,
    cursor: Option<SlotId>,
    forward: bool,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (SlotId, &'a CacheEntry<K, V>);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let entry = self.list.get(id)?;
        self.cursor = if self.forward { entry.next } else { entry.prev };
        Some((id, entry))
    }
}
