//! Open-addressing table with linear probing and backward-shift deletion.
//!
//! [`HashTable`] is the storage engine behind [`HashMap`](crate::HashMap) and
//! [`LinkedHashMap`](crate::LinkedHashMap). Like a raw table it is driven by
//! a caller-supplied hash and equality predicate; the hash is expected to be
//! well mixed already (see [`mix`](crate::policy::mix)), since the ideal slot
//! of an entry is simply `hash & mask`.
//!
//! Deletion never leaves tombstones: entries that follow the vacated slot in
//! its probe run are shifted back into the gap whenever leaving them in
//! place would make them unreachable.

use alloc::collections::TryReserveError;
use alloc::vec::Vec;
use core::fmt::Debug;

use crate::error::Error;
use crate::error::Result;
use crate::order::SlotOrder;
use crate::order::Unordered;
use crate::policy::Config;
use crate::policy::DEFAULT_LOAD_FACTOR;
use crate::policy::FLOOR_CAPACITY;
use crate::policy::capacity_for;
use crate::policy::max_fill;

#[cold]
#[inline(never)]
fn capacity_overflow() -> ! {
    panic!("capacity overflow");
}

/// Returns `true` if `ideal` lies in the cyclic half-open interval
/// `(gap, scan]`.
///
/// During backward-shift deletion an entry found at `scan` whose ideal slot
/// lies in this interval is still reachable from its ideal slot without
/// crossing the gap, so it must stay where it is. When `gap == scan` the
/// interval is empty.
#[inline(always)]
pub(crate) fn cyclic_between(gap: usize, ideal: usize, scan: usize) -> bool {
    if gap <= scan {
        gap < ideal && ideal <= scan
    } else {
        gap < ideal || ideal <= scan
    }
}

fn try_allocate_slots<V>(slots: usize) -> Result<Vec<Option<Bucket<V>>>, TryReserveError> {
    let mut fresh = Vec::new();
    fresh.try_reserve_exact(slots)?;
    fresh.resize_with(slots, || None);
    Ok(fresh)
}

fn allocate_slots<V>(slots: usize) -> Vec<Option<Bucket<V>>> {
    let mut fresh = Vec::with_capacity(slots);
    fresh.resize_with(slots, || None);
    fresh
}

#[derive(Clone)]
struct Bucket<V> {
    hash: u64,
    value: V,
}

/// An open-addressing hash table over values of type `V`.
///
/// The table stores one optional bucket per slot together with the entry's
/// hash. The slot count is a power of two and the number of entries is kept
/// strictly below it, so every probe sequence ends at an empty slot.
///
/// The ordering policy `O` is notified of every structural change; see
/// [`SlotOrder`].
///
/// ## Example
///
/// ```rust
/// use shift_hash::hash_table::HashTable;
/// use shift_hash::policy::mix;
///
/// let mut table: HashTable<(u32, &str)> = HashTable::with_capacity(8);
/// let hash = mix(7);
///
/// match table.find_index(hash, |(k, _)| *k == 7) {
///     Ok(_) => unreachable!(),
///     Err(slot) => {
///         table.insert_at(slot, hash, (7, "seven"));
///     }
/// }
///
/// assert_eq!(table.find(hash, |(k, _)| *k == 7), Some(&(7, "seven")));
/// assert_eq!(table.remove(hash, |(k, _)| *k == 7), Some((7, "seven")));
/// assert!(table.is_empty());
/// ```
#[derive(Clone)]
pub struct HashTable<V, O = Unordered> {
    slots: Vec<Option<Bucket<V>>>,
    order: O,

    populated: usize,
    max_fill: usize,
    mask: usize,
    min_slots: usize,
    load_factor: f32,

    epoch: u64,
}

impl<V, O> Debug for HashTable<V, O> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        use alloc::format;
        use alloc::string::String;
        use alloc::string::ToString;

        let rows = self
            .slots
            .chunks(16)
            .map(|row| {
                row.iter()
                    .map(|slot| match slot {
                        Some(bucket) => format!("{:02x}", bucket.hash >> 56),
                        None => "..".to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .collect::<Vec<String>>();

        f.debug_struct("HashTable")
            .field("slots", &rows)
            .field("populated", &self.populated)
            .field("capacity", &self.max_fill)
            .field("load_factor", &self.load_factor)
            .finish()
    }
}

impl<V, O: SlotOrder> HashTable<V, O> {
    /// Creates a table that holds at least `capacity` values before growing,
    /// using the default load factor.
    ///
    /// # Panics
    ///
    /// Panics if the required table size overflows.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use shift_hash::hash_table::HashTable;
    /// #
    /// let table: HashTable<u64> = HashTable::with_capacity(100);
    /// assert!(table.capacity() >= 100);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        let slots =
            capacity_for(capacity, DEFAULT_LOAD_FACTOR).unwrap_or_else(|| capacity_overflow());
        Self::from_slots(slots, DEFAULT_LOAD_FACTOR)
    }

    /// Creates a table from a validated [`Config`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the load factor is not strictly
    /// between 0 and 1 or the minimum capacity is too large.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use shift_hash::Config;
    /// # use shift_hash::hash_table::HashTable;
    /// #
    /// let table: HashTable<u64> = HashTable::with_config(Config::new(4, 0.75)).unwrap();
    /// assert_eq!(table.slots(), 8);
    /// assert_eq!(table.capacity(), 6);
    /// ```
    pub fn with_config(config: Config) -> Result<Self> {
        let slots = config.validate()?;
        Ok(Self::from_slots(slots, config.load_factor))
    }

    fn from_slots(slots: usize, load_factor: f32) -> Self {
        Self {
            slots: allocate_slots(slots),
            order: O::with_slots(slots),
            populated: 0,
            max_fill: max_fill(slots, load_factor),
            mask: slots - 1,
            min_slots: slots,
            load_factor,
            epoch: 0,
        }
    }

    /// Returns the number of values in the table.
    #[inline]
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Returns `true` if the table holds no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Returns the number of values at which the table grows.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.max_fill
    }

    /// Returns the number of physical slots.
    #[inline]
    pub fn slots(&self) -> usize {
        self.slots.len()
    }

    /// Returns the configured load factor.
    #[inline]
    pub fn load_factor(&self) -> f32 {
        self.load_factor
    }

    /// Returns the ordering policy's state.
    #[inline]
    pub fn order(&self) -> &O {
        &self.order
    }

    #[inline]
    pub(crate) fn order_mut(&mut self) -> &mut O {
        &mut self.order
    }

    /// Incremented by every rehash; cursors use it to notice that slot
    /// indices they hold are no longer meaningful.
    #[inline]
    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Locates the slot holding a value matching `hash` and `eq`.
    ///
    /// Returns `Ok(slot)` on a hit. On a miss returns `Err(slot)` where `slot`
    /// is the empty slot that ended the probe, which is exactly where the
    /// value would be inserted by [`insert_at`](Self::insert_at).
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use shift_hash::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<u64> = HashTable::with_capacity(4);
    /// let slot = table.find_index(3, |&v| v == 30).unwrap_err();
    /// let slot = table.insert_at(slot, 3, 30);
    /// assert_eq!(table.find_index(3, |&v| v == 30), Ok(slot));
    /// ```
    pub fn find_index(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Result<usize, usize> {
        let mut pos = hash as usize & self.mask;
        loop {
            match &self.slots[pos] {
                None => return Err(pos),
                Some(bucket) if bucket.hash == hash && eq(&bucket.value) => return Ok(pos),
                Some(_) => pos = (pos + 1) & self.mask,
            }
        }
    }

    /// Returns a reference to the value matching `hash` and `eq`.
    pub fn find(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&V> {
        let slot = self.find_index(hash, eq).ok()?;
        self.get(slot)
    }

    /// Returns a mutable reference to the value matching `hash` and `eq`.
    pub fn find_mut(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&mut V> {
        let slot = self.find_index(hash, eq).ok()?;
        self.get_mut(slot)
    }

    /// Returns the value stored in `slot`, if it is occupied.
    #[inline]
    pub fn get(&self, slot: usize) -> Option<&V> {
        self.slots.get(slot)?.as_ref().map(|bucket| &bucket.value)
    }

    /// Returns the value stored in `slot` mutably, if it is occupied.
    #[inline]
    pub fn get_mut(&mut self, slot: usize) -> Option<&mut V> {
        self.slots
            .get_mut(slot)?
            .as_mut()
            .map(|bucket| &mut bucket.value)
    }

    /// Returns `true` if `slot` holds a value.
    #[inline]
    pub fn is_occupied(&self, slot: usize) -> bool {
        matches!(self.slots.get(slot), Some(Some(_)))
    }

    /// Writes `value` into the empty `slot` returned by a failed
    /// [`find_index`](Self::find_index), growing the table if the load
    /// limit is reached.
    ///
    /// Returns the slot the value ends up in, which differs from `slot` when
    /// the insert triggered a rehash.
    pub fn insert_at(&mut self, slot: usize, hash: u64, value: V) -> usize {
        debug_assert!(!self.is_occupied(slot), "insert_at on an occupied slot");

        self.slots[slot] = Some(Bucket { hash, value });
        self.order.on_added(slot);
        self.populated += 1;

        if self.populated >= self.max_fill {
            let slots = capacity_for(self.populated + 1, self.load_factor)
                .unwrap_or_else(|| capacity_overflow());
            let grown = allocate_slots(slots);
            return self.rehash(grown, Some(slot)).unwrap_or(slot);
        }

        slot
    }

    /// Removes the value matching `hash` and `eq`, shrinking the table if it
    /// became sparse.
    pub fn remove(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<V> {
        let slot = self.find_index(hash, eq).ok()?;
        let value = self.remove_at(slot, |_, _| {});
        self.maybe_shrink();
        value
    }

    /// Removes the value in `slot` using backward-shift deletion.
    ///
    /// Entries after the vacated slot are moved back into the gap when their
    /// probe run would otherwise be broken. Every move is reported to the
    /// ordering policy and to `relocated` as `(from, to)`.
    ///
    /// This never resizes the table, so slot indices other than the moved
    /// ones stay valid. Returns `None` if `slot` is empty.
    pub fn remove_at(&mut self, slot: usize, mut relocated: impl FnMut(usize, usize)) -> Option<V> {
        let bucket = self.slots.get_mut(slot)?.take()?;
        self.populated -= 1;
        self.order.on_removed(slot);
        self.shift_back(slot, &mut relocated);
        Some(bucket.value)
    }

    fn shift_back(&mut self, mut gap: usize, relocated: &mut impl FnMut(usize, usize)) {
        let mask = self.mask;
        let mut scan = (gap + 1) & mask;

        while let Some(hash) = self.slots[scan].as_ref().map(|bucket| bucket.hash) {
            let ideal = hash as usize & mask;
            if !cyclic_between(gap, ideal, scan) {
                self.relocate(scan, gap, relocated);
                gap = scan;
            }
            scan = (scan + 1) & mask;
        }
    }

    /// The only place where an entry changes slots within a table.
    #[inline]
    fn relocate(&mut self, from: usize, to: usize, relocated: &mut impl FnMut(usize, usize)) {
        debug_assert!(self.slots[to].is_none());
        self.slots[to] = self.slots[from].take();
        self.order.on_relocated(from, to);
        relocated(from, to);
    }

    /// Halves the table if deletions left it sparse.
    pub(crate) fn maybe_shrink(&mut self) {
        let slots = self.slots.len();
        if slots > self.min_slots && self.populated < self.max_fill / 4 && slots > FLOOR_CAPACITY {
            log::trace!(
                "shrinking sparse table: {} entries in {} slots",
                self.populated,
                slots
            );
            self.rehash(allocate_slots(slots / 2), None);
        }
    }

    /// Moves every entry into `fresh`, which becomes the new slot array.
    ///
    /// Entries are visited in the ordering policy's order and re-inserted by
    /// plain probing, so a linked order is rebuilt unchanged. Returns the new
    /// slot of `tracked`.
    fn rehash(&mut self, fresh: Vec<Option<Bucket<V>>>, tracked: Option<usize>) -> Option<usize> {
        let new_slots = fresh.len();
        debug_assert!(new_slots.is_power_of_two() && new_slots > self.populated);

        let old_slots = self.slots.len();
        let mut old = core::mem::replace(&mut self.slots, fresh);
        let old_order = core::mem::replace(&mut self.order, O::with_slots(new_slots));

        self.mask = new_slots - 1;
        self.max_fill = max_fill(new_slots, self.load_factor);
        self.epoch = self.epoch.wrapping_add(1);

        log::debug!(
            "rehash: {} -> {} slots, {} entries",
            old_slots,
            new_slots,
            self.populated
        );

        let mask = self.mask;
        let slots = &mut self.slots;
        let order = &mut self.order;
        let mut moved = None;
        old_order.for_each_slot(old_slots, |from| {
            let Some(bucket) = old[from].take() else {
                return;
            };

            let mut to = bucket.hash as usize & mask;
            while slots[to].is_some() {
                to = (to + 1) & mask;
            }
            slots[to] = Some(bucket);
            order.on_added(to);

            if tracked == Some(from) {
                moved = Some(to);
            }
        });

        moved
    }

    /// Removes every value, keeping the allocated slots.
    pub fn clear(&mut self) {
        if self.populated > 0 {
            self.slots.fill_with(|| None);
        }
        self.order.clear();
        self.populated = 0;
    }

    /// Grows the table so that `additional` more values fit without a
    /// further resize.
    pub fn reserve(&mut self, additional: usize) {
        let required = self.populated.saturating_add(additional);
        if required > self.max_fill {
            let slots =
                capacity_for(required, self.load_factor).unwrap_or_else(|| capacity_overflow());
            self.rehash(allocate_slots(slots), None);
        }
    }

    /// Shrinks the table to the smallest size that holds
    /// `max(target, len)` values.
    ///
    /// Does nothing if the table is already that small. The new slot array
    /// is allocated fallibly; if that fails the table is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailed`] if the smaller table could not be
    /// allocated.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use shift_hash::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<u64> = HashTable::with_capacity(1000);
    /// let slot = table.find_index(5, |&v| v == 5).unwrap_err();
    /// table.insert_at(slot, 5, 5);
    ///
    /// table.trim(0).unwrap();
    /// assert_eq!(table.slots(), 2);
    /// assert_eq!(table.find(5, |&v| v == 5), Some(&5));
    /// ```
    pub fn trim(&mut self, target: usize) -> Result<()> {
        let wanted = target.max(self.populated);
        let Some(slots) = capacity_for(wanted, self.load_factor) else {
            return Ok(());
        };
        if slots >= self.slots.len() || self.populated > max_fill(slots, self.load_factor) {
            return Ok(());
        }

        let fresh = try_allocate_slots(slots).map_err(|_| {
            log::warn!("trim to {slots} slots failed to allocate; table left unchanged");
            Error::AllocationFailed
        })?;
        self.rehash(fresh, None);
        Ok(())
    }

    /// Removes every value and shrinks the table to the size needed for
    /// `target` values, if that is smaller than the current size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailed`] if the smaller table could not be
    /// allocated; the table is still cleared.
    pub fn clear_and_trim(&mut self, target: usize) -> Result<()> {
        self.clear();

        let Some(slots) = capacity_for(target, self.load_factor) else {
            return Ok(());
        };
        if slots >= self.slots.len() {
            return Ok(());
        }

        let fresh = try_allocate_slots(slots).map_err(|_| {
            log::warn!("clear_and_trim to {slots} slots failed to allocate");
            Error::AllocationFailed
        })?;
        self.rehash(fresh, None);
        Ok(())
    }

    /// Takes the value out of `slot` without repairing probe runs or
    /// notifying the ordering policy. Only valid while draining; the caller
    /// must [`clear`](Self::clear) the table afterwards.
    pub(crate) fn take(&mut self, slot: usize) -> Option<V> {
        self.slots.get_mut(slot)?.take().map(|bucket| bucket.value)
    }

    /// Returns an iterator over all values in physical slot order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use shift_hash::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<u64> = HashTable::with_capacity(8);
    /// for v in [10, 20, 30] {
    ///     let slot = table.find_index(v, |&x| x == v).unwrap_err();
    ///     table.insert_at(slot, v, v);
    /// }
    ///
    /// let mut values: Vec<u64> = table.iter().copied().collect();
    /// values.sort();
    /// assert_eq!(values, [10, 20, 30]);
    /// ```
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            slots: self.slots.iter(),
            remaining: self.populated,
        }
    }

    /// Returns a mutable iterator over all values in physical slot order.
    pub fn iter_mut(&mut self) -> IterMut<'_, V> {
        IterMut {
            slots: self.slots.iter_mut(),
            remaining: self.populated,
        }
    }

    /// Removes and yields every value in physical slot order.
    pub fn drain(&mut self) -> Drain<'_, V, O> {
        Drain {
            remaining: self.populated,
            table: self,
            slot: 0,
        }
    }

    /// Distance between the slot of an entry and its ideal slot.
    #[cfg(any(test, feature = "stats"))]
    fn displacement(&self, slot: usize) -> Option<usize> {
        let bucket = self.slots.get(slot)?.as_ref()?;
        Some(slot.wrapping_sub(bucket.hash as usize) & self.mask)
    }

    /// Computes how many entries sit at each probe distance from their ideal
    /// slot. Index `i` of the result counts entries displaced by `i` slots.
    #[cfg(any(test, feature = "stats"))]
    pub fn probe_histogram(&self) -> ProbeHistogram {
        let mut bins = alloc::vec![0usize; 1];
        for slot in 0..self.slots.len() {
            if let Some(distance) = self.displacement(slot) {
                if distance >= bins.len() {
                    bins.resize(distance + 1, 0);
                }
                bins[distance] += 1;
            }
        }
        ProbeHistogram { bins }
    }

    /// Returns utilization statistics for debugging.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> DebugStats {
        let total_slots = self.slots.len();
        let occupied_slots = self.slots.iter().filter(|slot| slot.is_some()).count();
        let max_probe_length = (0..total_slots)
            .filter_map(|slot| self.displacement(slot))
            .max()
            .unwrap_or(0);

        DebugStats {
            populated: self.populated,
            capacity: self.max_fill,
            total_slots,
            occupied_slots,
            max_probe_length,
            load_factor: self.populated as f64 / total_slots as f64,
            total_bytes: total_slots * core::mem::size_of::<Option<Bucket<V>>>(),
        }
    }
}

impl<V, O: SlotOrder> core::ops::Index<usize> for HashTable<V, O> {
    type Output = V;

    /// # Panics
    ///
    /// Panics if `slot` is empty or out of range.
    fn index(&self, slot: usize) -> &V {
        match self.get(slot) {
            Some(value) => value,
            None => panic!("slot {slot} is not occupied"),
        }
    }
}

impl<V, O: SlotOrder> core::ops::IndexMut<usize> for HashTable<V, O> {
    fn index_mut(&mut self, slot: usize) -> &mut V {
        match self.get_mut(slot) {
            Some(value) => value,
            None => panic!("slot {slot} is not occupied"),
        }
    }
}

/// Probe-length histogram produced by [`HashTable::probe_histogram`].
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeHistogram {
    /// `bins[i]` is the number of entries displaced `i` slots from their
    /// ideal slot.
    pub bins: Vec<usize>,
}

#[cfg(any(test, feature = "stats"))]
impl ProbeHistogram {
    /// Total number of entries counted.
    pub fn total(&self) -> usize {
        self.bins.iter().sum()
    }

    /// Pretty-prints the histogram as a horizontal bar chart.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        let max = self.bins.iter().copied().max().unwrap_or(0);
        if max == 0 {
            println!("probe histogram: empty");
            return;
        }

        let max_bar = 60usize;
        println!("probe histogram ({} entries):", self.total());
        for (distance, &count) in self.bins.iter().enumerate() {
            let width = (count * max_bar).div_ceil(max);
            println!("{:>3} | {} ({})", distance, "█".repeat(width), count);
        }
    }
}

/// Debug statistics for hash table analysis.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of elements currently in the table
    pub populated: usize,
    /// Number of elements at which the table grows
    pub capacity: usize,
    /// Total number of slots allocated
    pub total_slots: usize,
    /// Number of slots currently occupied
    pub occupied_slots: usize,
    /// Largest distance of any entry from its ideal slot
    pub max_probe_length: usize,
    /// Load factor (populated / total_slots)
    pub load_factor: f64,
    /// Total memory in bytes used by the slot array
    pub total_bytes: usize,
}

#[cfg(any(test, feature = "stats"))]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Debug Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% of slots)",
            self.populated,
            self.total_slots,
            self.load_factor * 100.0
        );
        println!("Grows at: {} entries", self.capacity);
        println!("Occupied slots: {}", self.occupied_slots);
        println!("Longest probe: {}", self.max_probe_length);
        println!("Total Allocated: {} bytes", self.total_bytes);
    }
}

/// An iterator over the values of a [`HashTable`] in physical slot order.
pub struct Iter<'a, V> {
    slots: core::slice::Iter<'a, Option<Bucket<V>>>,
    remaining: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let bucket = self.slots.by_ref().flatten().next()?;
        self.remaining -= 1;
        Some(&bucket.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

/// A mutable iterator over the values of a [`HashTable`].
pub struct IterMut<'a, V> {
    slots: core::slice::IterMut<'a, Option<Bucket<V>>>,
    remaining: usize,
}

impl<'a, V> Iterator for IterMut<'a, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let bucket = self.slots.by_ref().flatten().next()?;
        self.remaining -= 1;
        Some(&mut bucket.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for IterMut<'_, V> {}

/// A draining iterator over the values of a [`HashTable`].
///
/// The table is empty once the iterator is dropped, even if it was not
/// exhausted.
pub struct Drain<'a, V, O: SlotOrder> {
    table: &'a mut HashTable<V, O>,
    slot: usize,
    remaining: usize,
}

impl<V, O: SlotOrder> Iterator for Drain<'_, V, O> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        while self.slot < self.table.slots.len() {
            let slot = self.slot;
            self.slot += 1;
            if let Some(value) = self.table.take(slot) {
                self.remaining -= 1;
                return Some(value);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V, O: SlotOrder> ExactSizeIterator for Drain<'_, V, O> {}

impl<V, O: SlotOrder> Drop for Drain<'_, V, O> {
    fn drop(&mut self) {
        self.table.clear();
    }
}

impl<V, O: SlotOrder> IntoIterator for HashTable<V, O> {
    type Item = V;
    type IntoIter = IntoIter<V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            remaining: self.populated,
            slots: self.slots.into_iter(),
        }
    }
}

/// An owning iterator over the values of a [`HashTable`] in physical slot
/// order.
pub struct IntoIter<V> {
    slots: alloc::vec::IntoIter<Option<Bucket<V>>>,
    remaining: usize,
}

impl<V> Iterator for IntoIter<V> {
    type Item = V;

    fn next(&mut self) -> Option<V> {
        let bucket = self.slots.by_ref().flatten().next()?;
        self.remaining -= 1;
        Some(bucket.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for IntoIter<V> {}

#[cfg(test)]
pub(crate) mod tests {
    use alloc::collections::BTreeMap;
    use alloc::vec;
    use alloc::vec::Vec;

    use rand::Rng;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::order::Linked;
    use crate::policy::mix;

    #[derive(Debug, PartialEq, Eq, Clone)]
    struct Item {
        key: u64,
        value: i32,
    }

    /// Checks the structural invariants every operation must preserve.
    pub(crate) fn assert_table_invariants<V, O: SlotOrder>(table: &HashTable<V, O>) {
        let n = table.slots.len();
        assert!(n.is_power_of_two());
        assert_eq!(table.mask, n - 1);
        assert!(table.populated < n);
        assert!(table.max_fill < n);

        let occupied = table.slots.iter().filter(|s| s.is_some()).count();
        assert_eq!(occupied, table.populated, "{table:?}");

        for slot in 0..n {
            let Some(bucket) = &table.slots[slot] else {
                continue;
            };
            let mut pos = bucket.hash as usize & table.mask;
            while pos != slot {
                assert!(
                    table.slots[pos].is_some(),
                    "entry at {slot} unreachable: empty slot {pos} in its probe run\n{table:?}"
                );
                pos = (pos + 1) & table.mask;
            }
        }
    }

    fn insert_item(table: &mut HashTable<Item, impl SlotOrder>, hash: u64, item: Item) -> usize {
        let key = item.key;
        match table.find_index(hash, |v| v.key == key) {
            Ok(slot) => {
                *table.get_mut(slot).unwrap() = item;
                slot
            }
            Err(slot) => table.insert_at(slot, hash, item),
        }
    }

    fn item(key: u64) -> Item {
        Item {
            key,
            value: key as i32 * 2,
        }
    }

    #[test]
    fn cyclic_between_gap_before_scan() {
        // (2, 5]
        assert!(!cyclic_between(2, 1, 5));
        assert!(!cyclic_between(2, 2, 5));
        assert!(cyclic_between(2, 3, 5));
        assert!(cyclic_between(2, 5, 5));
        assert!(!cyclic_between(2, 6, 5));
    }

    #[test]
    fn cyclic_between_gap_after_scan() {
        // (6, 1] on a ring of 8 is {7, 0, 1}
        assert!(cyclic_between(6, 7, 1));
        assert!(cyclic_between(6, 0, 1));
        assert!(cyclic_between(6, 1, 1));
        assert!(!cyclic_between(6, 2, 1));
        assert!(!cyclic_between(6, 6, 1));
        assert!(!cyclic_between(6, 5, 1));
    }

    #[test]
    fn cyclic_between_gap_equals_scan() {
        for ideal in 0..8 {
            assert!(!cyclic_between(3, ideal, 3));
        }
    }

    #[test]
    fn cyclic_between_exhaustive() {
        for n in [1usize, 2, 4, 8, 16] {
            for gap in 0..n {
                for scan in 0..n {
                    for ideal in 0..n {
                        let span = (scan + n - gap) % n;
                        let offset = (ideal + n - gap) % n;
                        let expected = offset != 0 && offset <= span;
                        assert_eq!(
                            cyclic_between(gap, ideal, scan),
                            expected,
                            "n={n} gap={gap} ideal={ideal} scan={scan}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn insert_and_find() {
        let mut table: HashTable<Item> = HashTable::with_capacity(0);
        for k in 0..64u64 {
            let hash = mix(k);
            insert_item(&mut table, hash, item(k));
            assert_eq!(table.find(hash, |v| v.key == k), Some(&item(k)));
        }
        assert_eq!(table.len(), 64);
        assert_table_invariants(&table);

        for k in 0..64u64 {
            assert_eq!(table.find(mix(k), |v| v.key == k), Some(&item(k)));
        }
        assert!(table.find(mix(999), |v| v.key == 999).is_none());
    }

    #[test]
    fn concrete_growth_scenario() {
        let mut table: HashTable<Item> = HashTable::with_config(Config::new(4, 0.75)).unwrap();
        assert_eq!(table.slots(), 8);

        for k in 0..10u64 {
            insert_item(&mut table, mix(k), item(k));
        }

        assert_eq!(table.len(), 10);
        assert_eq!(table.slots(), 16);
        assert_eq!(table.epoch(), 1, "exactly one grow");
        for k in 0..10u64 {
            assert_eq!(table.find(mix(k), |v| v.key == k), Some(&item(k)));
        }
    }

    #[test]
    fn insert_returns_final_slot_across_growth() {
        let mut table: HashTable<Item> = HashTable::with_config(Config::new(2, 0.5)).unwrap();
        for k in 0..100u64 {
            let slot = insert_item(&mut table, mix(k), item(k));
            assert_eq!(table.get(slot), Some(&item(k)));
        }
    }

    #[test]
    fn delete_across_wraparound() {
        let mut table: HashTable<Item> = HashTable::with_config(Config::new(4, 0.75)).unwrap();
        assert_eq!(table.slots(), 8);

        // Keys 1..=3 all want slot 6, key 4 wants slot 7: they occupy 6, 7, 0, 1.
        let placements = [(1u64, 6u64), (2, 6), (3, 6), (4, 7)];
        for &(key, hash) in &placements {
            insert_item(&mut table, hash, item(key));
        }
        assert_eq!(table.find_index(6, |v| v.key == 1), Ok(6));
        assert_eq!(table.find_index(6, |v| v.key == 2), Ok(7));
        assert_eq!(table.find_index(6, |v| v.key == 3), Ok(0));
        assert_eq!(table.find_index(7, |v| v.key == 4), Ok(1));

        let mut moves = Vec::new();
        let removed = table.remove_at(6, |from, to| moves.push((from, to)));
        assert_eq!(removed, Some(item(1)));
        assert_eq!(moves, [(7, 6), (0, 7), (1, 0)]);
        assert_table_invariants(&table);

        for &(key, hash) in &placements[1..] {
            assert_eq!(table.find(hash, |v| v.key == key), Some(&item(key)));
        }
        assert!(!table.is_occupied(1));
    }

    #[test]
    fn delete_leaves_entries_already_at_home() {
        let mut table: HashTable<Item> = HashTable::with_config(Config::new(4, 0.75)).unwrap();

        // Slots 2, 3, 4: key 1 (ideal 2), key 2 (ideal 3), key 3 (ideal 2).
        insert_item(&mut table, 2, item(1));
        insert_item(&mut table, 3, item(2));
        insert_item(&mut table, 2, item(3));
        assert_eq!(table.find_index(2, |v| v.key == 3), Ok(4));

        let mut moves = Vec::new();
        table.remove_at(2, |from, to| moves.push((from, to)));

        // Key 2 stays at its ideal slot 3; key 3 skips over it into slot 2.
        assert_eq!(moves, [(4, 2)]);
        assert_eq!(table.find_index(3, |v| v.key == 2), Ok(3));
        assert_eq!(table.find_index(2, |v| v.key == 3), Ok(2));
        assert_table_invariants(&table);
    }

    #[test]
    fn remove_missing_and_empty_slot() {
        let mut table: HashTable<Item> = HashTable::with_capacity(4);
        assert_eq!(table.remove(mix(1), |v| v.key == 1), None);
        assert_eq!(table.remove_at(0, |_, _| {}), None);
        assert_eq!(table.remove_at(10_000, |_, _| {}), None);
    }

    #[test]
    fn probes_terminate_when_full() {
        let mut table: HashTable<Item> = HashTable::with_config(Config::new(7, 0.99)).unwrap();
        let slots = table.slots();
        // Every key collides on slot 0.
        let mut k = 0;
        while table.slots() == slots && table.len() + 1 < table.capacity() {
            insert_item(&mut table, 0, item(k));
            k += 1;
        }
        assert_eq!(
            table.find_index(0, |v| v.key == u64::MAX).map_err(|_| ()),
            Err(())
        );
        assert!(table.debug_stats().max_probe_length < table.slots());
        assert_table_invariants(&table);
    }

    #[test]
    fn grow_twice_then_shrink() {
        let mut table: HashTable<Item> = HashTable::with_config(Config::new(8, 0.75)).unwrap();
        let initial_slots = table.slots();

        for k in 0..200u64 {
            insert_item(&mut table, mix(k), item(k));
        }
        assert!(table.epoch() >= 2, "expected at least two grows");
        let grown_slots = table.slots();
        assert!(grown_slots >= initial_slots * 4);

        for k in 0..190u64 {
            assert_eq!(table.remove(mix(k), |v| v.key == k), Some(item(k)));
        }
        assert!(table.slots() < grown_slots, "expected a shrink");
        assert!(table.slots() >= initial_slots);
        assert_table_invariants(&table);

        for k in 190..200u64 {
            assert_eq!(table.find(mix(k), |v| v.key == k), Some(&item(k)));
        }
        assert_eq!(table.len(), 10);
    }

    #[test]
    fn never_shrinks_below_min_capacity() {
        let mut table: HashTable<Item> = HashTable::with_config(Config::new(100, 0.75)).unwrap();
        let slots = table.slots();
        for k in 0..50u64 {
            insert_item(&mut table, mix(k), item(k));
        }
        for k in 0..50u64 {
            table.remove(mix(k), |v| v.key == k);
        }
        assert_eq!(table.slots(), slots);
    }

    #[test]
    fn randomized_against_model_with_clustered_hashes() {
        let mut rng = SmallRng::seed_from_u64(0x5eed);
        let mut table: HashTable<Item> = HashTable::with_config(Config::new(4, 0.75)).unwrap();
        let mut model = BTreeMap::new();

        for _ in 0..5000 {
            let key = rng.random_range(0..96u64);
            // Few distinct ideal slots, so runs are long and wrap often.
            let hash = (key % 5).wrapping_mul(0x9E37_79B9_7F4A_7C15) | (key << 60);
            if rng.random_bool(0.55) {
                insert_item(&mut table, hash, item(key));
                model.insert(key, item(key));
            } else {
                assert_eq!(table.remove(hash, |v| v.key == key), model.remove(&key));
            }
            assert_eq!(table.len(), model.len());
        }

        assert_table_invariants(&table);
        for (&key, expected) in &model {
            let hash = (key % 5).wrapping_mul(0x9E37_79B9_7F4A_7C15) | (key << 60);
            assert_eq!(table.find(hash, |v| v.key == key), Some(expected));
        }
    }

    #[test]
    fn rehash_preserves_linked_order() {
        let mut table: HashTable<Item, Linked> =
            HashTable::with_config(Config::new(2, 0.75)).unwrap();
        let keys = [9u64, 3, 14, 1, 7, 22, 5, 18, 11, 2];
        for &k in &keys {
            insert_item(&mut table, mix(k), item(k));
        }
        assert!(table.epoch() > 0);

        let ordered: Vec<u64> = table
            .order()
            .iter()
            .map(|slot| table.get(slot).unwrap().key)
            .collect();
        assert_eq!(ordered, keys);
        assert_table_invariants(&table);
    }

    #[test]
    fn linked_order_follows_backward_shift() {
        let mut table: HashTable<Item, Linked> =
            HashTable::with_config(Config::new(4, 0.75)).unwrap();
        for (key, hash) in [(1u64, 6u64), (2, 6), (3, 6), (4, 7)] {
            insert_item(&mut table, hash, item(key));
        }

        table.remove_at(6, |_, _| {});
        let ordered: Vec<u64> = table
            .order()
            .iter()
            .map(|slot| table.get(slot).unwrap().key)
            .collect();
        assert_eq!(ordered, [2, 3, 4]);
        assert_eq!(table.order().first(), Some(6));
        assert_eq!(table.order().last(), Some(0));
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut table: HashTable<Item> = HashTable::with_capacity(0);
        for k in 0..100u64 {
            insert_item(&mut table, mix(k), item(k));
        }
        let slots = table.slots();
        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.slots(), slots);
        assert!(table.find(mix(5), |v| v.key == 5).is_none());
    }

    #[test]
    fn trim_shrinks_and_preserves() {
        let mut table: HashTable<Item> = HashTable::with_capacity(1000);
        for k in 0..10u64 {
            insert_item(&mut table, mix(k), item(k));
        }
        let before = table.slots();

        table.trim(0).unwrap();
        assert!(table.slots() < before);
        assert_eq!(
            table.slots(),
            capacity_for(10, DEFAULT_LOAD_FACTOR).unwrap()
        );
        for k in 0..10u64 {
            assert_eq!(table.find(mix(k), |v| v.key == k), Some(&item(k)));
        }

        // Already minimal: nothing to do.
        let epoch = table.epoch();
        table.trim(0).unwrap();
        assert_eq!(table.epoch(), epoch);

        // A larger target never grows the table.
        table.trim(10_000).unwrap();
        assert_eq!(table.epoch(), epoch);
    }

    #[test]
    fn clear_and_trim_resets_size() {
        let mut table: HashTable<Item> = HashTable::with_capacity(0);
        for k in 0..500u64 {
            insert_item(&mut table, mix(k), item(k));
        }
        table.clear_and_trim(4).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.slots(), 8);

        insert_item(&mut table, mix(1), item(1));
        assert_eq!(table.find(mix(1), |v| v.key == 1), Some(&item(1)));
    }

    #[test]
    fn reserve_avoids_growth() {
        let mut table: HashTable<Item> = HashTable::with_capacity(0);
        table.reserve(100);
        assert!(table.capacity() >= 100);
        let epoch = table.epoch();
        for k in 0..99u64 {
            insert_item(&mut table, mix(k), item(k));
        }
        assert_eq!(table.epoch(), epoch);
    }

    #[test]
    fn iter_and_drain() {
        let mut table: HashTable<Item> = HashTable::with_capacity(0);
        for k in 0..20u64 {
            insert_item(&mut table, mix(k), item(k));
        }

        let mut seen: Vec<u64> = table.iter().map(|v| v.key).collect();
        seen.sort();
        assert_eq!(seen, (0..20).collect::<Vec<_>>());
        assert_eq!(table.iter().len(), 20);

        for v in table.iter_mut() {
            v.value += 1;
        }
        assert_eq!(table.find(mix(3), |v| v.key == 3).unwrap().value, 7);

        let mut drained: Vec<u64> = table.drain().map(|v| v.key).collect();
        drained.sort();
        assert_eq!(drained, (0..20).collect::<Vec<_>>());
        assert!(table.is_empty());
        assert!(table.find(mix(3), |v| v.key == 3).is_none());
    }

    #[test]
    fn partial_drain_still_clears() {
        let mut table: HashTable<Item> = HashTable::with_capacity(0);
        for k in 0..20u64 {
            insert_item(&mut table, mix(k), item(k));
        }
        let mut drain = table.drain();
        assert_eq!(drain.len(), 20);
        let first_two: Vec<Item> = drain.by_ref().take(2).collect();
        assert_eq!(first_two.len(), 2);
        assert_eq!(drain.size_hint(), (18, Some(18)));
        drop(drain);
        assert!(table.is_empty());
        assert_table_invariants(&table);
    }

    #[test]
    fn clone_is_independent() {
        let mut table: HashTable<Item> = HashTable::with_capacity(0);
        for k in 0..30u64 {
            insert_item(&mut table, mix(k), item(k));
        }
        let mut copy = table.clone();
        copy.remove(mix(0), |v| v.key == 0);
        insert_item(&mut copy, mix(100), item(100));

        assert_eq!(table.len(), 30);
        assert!(table.find(mix(0), |v| v.key == 0).is_some());
        assert!(table.find(mix(100), |v| v.key == 100).is_none());
        assert_eq!(copy.len(), 30);
    }

    #[test]
    fn histogram_counts_every_entry() {
        let mut table: HashTable<Item> = HashTable::with_capacity(0);
        for k in 0..300u64 {
            insert_item(&mut table, mix(k), item(k));
        }
        let histogram = table.probe_histogram();
        assert_eq!(histogram.total(), 300);

        let stats = table.debug_stats();
        assert_eq!(stats.populated, 300);
        assert_eq!(stats.occupied_slots, 300);
        assert_eq!(stats.max_probe_length + 1, histogram.bins.len());

        #[cfg(feature = "std")]
        {
            histogram.print();
            stats.print();
        }
    }

    #[test]
    fn into_iter_yields_everything() {
        let mut table: HashTable<Item> = HashTable::with_capacity(0);
        for k in 0..10u64 {
            insert_item(&mut table, mix(k), item(k));
        }
        let iter = table.into_iter();
        assert_eq!(iter.len(), 10);
        let mut keys: Vec<u64> = iter.map(|v| v.key).collect();
        keys.sort();
        assert_eq!(keys, vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    }
}
