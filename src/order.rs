//! Ordering policies layered over the physical slots of a
//! [`HashTable`](crate::hash_table::HashTable).
//!
//! The table tells its ordering about every structural change through the
//! [`SlotOrder`] hooks. [`Unordered`] ignores them; [`Linked`] keeps an
//! intrusive doubly-linked list whose nodes are indexed by slot, so the list
//! has to follow entries whenever the table moves them to another slot.

use alloc::vec;
use alloc::vec::Vec;

/// Hooks invoked by a [`HashTable`](crate::hash_table::HashTable) whenever
/// the set of occupied slots changes.
///
/// Every code path that moves an entry between slots reports it through
/// [`on_relocated`](SlotOrder::on_relocated), so an implementation indexed by
/// slot never observes a stale position.
pub trait SlotOrder: Clone {
    /// Creates an empty ordering for a table with `slots` slots.
    fn with_slots(slots: usize) -> Self;

    /// An entry was written into the previously empty `slot`.
    fn on_added(&mut self, slot: usize);

    /// The entry in `slot` was removed. Called before any entry is shifted
    /// into the vacated slot.
    fn on_removed(&mut self, slot: usize);

    /// The entry in `from` now lives in `to`, which was empty.
    fn on_relocated(&mut self, from: usize, to: usize);

    /// Forgets every entry.
    fn clear(&mut self);

    /// Calls `f` with slot indices in the order entries should be visited
    /// when the table is rebuilt. Indices may include empty slots, which the
    /// table skips.
    fn for_each_slot(&self, slots: usize, f: impl FnMut(usize));
}

/// Ordering for plain hash maps: iteration follows physical slots.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unordered;

impl SlotOrder for Unordered {
    #[inline(always)]
    fn with_slots(_slots: usize) -> Self {
        Unordered
    }

    #[inline(always)]
    fn on_added(&mut self, _slot: usize) {}

    #[inline(always)]
    fn on_removed(&mut self, _slot: usize) {}

    #[inline(always)]
    fn on_relocated(&mut self, _from: usize, _to: usize) {}

    #[inline(always)]
    fn clear(&mut self) {}

    fn for_each_slot(&self, slots: usize, f: impl FnMut(usize)) {
        (0..slots).for_each(f);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Links {
    prev: Option<usize>,
    next: Option<usize>,
}

/// Intrusive doubly-linked list over table slots.
///
/// Each slot owns one node holding the slots of its neighbours. New entries
/// are appended at the back, which yields insertion order; the `move_*`
/// operations splice a node to either end without touching the entry, which
/// is what access-ordered (LRU-style) usage needs.
#[derive(Debug, Clone, Default)]
pub struct Linked {
    links: Vec<Links>,
    first: Option<usize>,
    last: Option<usize>,
}

impl Linked {
    /// Slot of the first entry, if any.
    #[inline]
    pub fn first(&self) -> Option<usize> {
        self.first
    }

    /// Slot of the last entry, if any.
    #[inline]
    pub fn last(&self) -> Option<usize> {
        self.last
    }

    /// Slot following `slot` in list order.
    #[inline]
    pub fn next(&self, slot: usize) -> Option<usize> {
        self.links[slot].next
    }

    /// Slot preceding `slot` in list order.
    #[inline]
    pub fn prev(&self, slot: usize) -> Option<usize> {
        self.links[slot].prev
    }

    /// Links a detached `slot` at the back of the list.
    pub fn append(&mut self, slot: usize) {
        self.links[slot] = Links {
            prev: self.last,
            next: None,
        };
        match self.last {
            Some(last) => self.links[last].next = Some(slot),
            None => self.first = Some(slot),
        }
        self.last = Some(slot);
    }

    /// Links a detached `slot` at the front of the list.
    pub fn push_front(&mut self, slot: usize) {
        self.links[slot] = Links {
            prev: None,
            next: self.first,
        };
        match self.first {
            Some(first) => self.links[first].prev = Some(slot),
            None => self.last = Some(slot),
        }
        self.first = Some(slot);
    }

    /// Detaches `slot` from the list, joining its neighbours.
    pub fn unlink(&mut self, slot: usize) {
        let Links { prev, next } = core::mem::take(&mut self.links[slot]);
        match prev {
            Some(prev) => self.links[prev].next = next,
            None => self.first = next,
        }
        match next {
            Some(next) => self.links[next].prev = prev,
            None => self.last = prev,
        }
    }

    /// Splices `slot` to the front. Returns `false` if it already was there.
    pub fn move_to_front(&mut self, slot: usize) -> bool {
        if self.first == Some(slot) {
            return false;
        }
        self.unlink(slot);
        self.push_front(slot);
        true
    }

    /// Splices `slot` to the back. Returns `false` if it already was there.
    pub fn move_to_back(&mut self, slot: usize) -> bool {
        if self.last == Some(slot) {
            return false;
        }
        self.unlink(slot);
        self.append(slot);
        true
    }

    /// Moves the node of `from` to `to`, repointing its neighbours.
    pub fn relocate(&mut self, from: usize, to: usize) {
        let links = core::mem::take(&mut self.links[from]);
        self.links[to] = links;
        match links.prev {
            Some(prev) => self.links[prev].next = Some(to),
            None => self.first = Some(to),
        }
        match links.next {
            Some(next) => self.links[next].prev = Some(to),
            None => self.last = Some(to),
        }
    }

    /// Iterates over slots from front to back.
    pub fn iter(&self) -> Slots<'_> {
        Slots {
            order: self,
            front: self.first,
            back: self.last,
        }
    }
}

impl SlotOrder for Linked {
    fn with_slots(slots: usize) -> Self {
        Self {
            links: vec![Links::default(); slots],
            first: None,
            last: None,
        }
    }

    #[inline]
    fn on_added(&mut self, slot: usize) {
        self.append(slot);
    }

    #[inline]
    fn on_removed(&mut self, slot: usize) {
        self.unlink(slot);
    }

    #[inline]
    fn on_relocated(&mut self, from: usize, to: usize) {
        self.relocate(from, to);
    }

    fn clear(&mut self) {
        self.links.fill(Links::default());
        self.first = None;
        self.last = None;
    }

    fn for_each_slot(&self, _slots: usize, f: impl FnMut(usize)) {
        self.iter().for_each(f);
    }
}

/// Double-ended iterator over the slots of a [`Linked`] list.
pub struct Slots<'a> {
    order: &'a Linked,
    front: Option<usize>,
    back: Option<usize>,
}

impl Iterator for Slots<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let slot = self.front?;
        if self.front == self.back {
            self.front = None;
            self.back = None;
        } else {
            self.front = self.order.next(slot);
        }
        Some(slot)
    }
}

impl DoubleEndedIterator for Slots<'_> {
    fn next_back(&mut self) -> Option<usize> {
        let slot = self.back?;
        if self.front == self.back {
            self.front = None;
            self.back = None;
        } else {
            self.back = self.order.prev(slot);
        }
        Some(slot)
    }
}
