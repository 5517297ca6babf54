use core::borrow::Borrow;
use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;

use crate::DefaultHashBuilder;
use crate::error::Error;
use crate::error::Result;
use crate::hash_map::Entry;
use crate::hash_map::OccupiedEntry;
use crate::hash_map::VacantEntry;
use crate::hash_map::make_hash;
use crate::hash_table::HashTable;
use crate::order::Linked;
use crate::order::Slots;
use crate::policy::Config;
use crate::policy::DEFAULT_MIN_CAPACITY;

/// A hash map that iterates in a well-defined order.
///
/// New keys are appended to the back; overwriting an existing key keeps its
/// position. The `*_move_to_first`/`*_move_to_last` operations reposition an
/// entry in constant time, which makes the map usable as an LRU structure.
///
/// The order survives removals and resizes: whenever the table moves an
/// entry to another slot, the list follows it.
///
/// # Examples
///
/// ```rust
/// # #[cfg(any(feature = "std", feature = "foldhash"))]
/// # {
/// use shift_hash::LinkedHashMap;
///
/// let mut map = LinkedHashMap::new();
/// map.insert(1, "a");
/// map.insert(2, "b");
/// map.insert(3, "c");
/// map.move_to_first(&3);
///
/// assert_eq!(map.first_key(), Ok(&3));
/// assert_eq!(map.keys().copied().collect::<Vec<_>>(), [3, 1, 2]);
/// # }
/// ```
#[derive(Clone)]
pub struct LinkedHashMap<K, V, S = DefaultHashBuilder> {
    table: HashTable<(K, V), Linked>,
    hash_builder: S,
}

impl<K, V, S> Debug for LinkedHashMap<K, V, S>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Equality ignores order, like for any other map.
impl<K, V, S> PartialEq for LinkedHashMap<K, V, S>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter()
            .all(|(k, v)| other.get(k).is_some_and(|other_v| v == other_v))
    }
}

impl<K, V, S> Eq for LinkedHashMap<K, V, S>
where
    K: Hash + Eq,
    V: Eq,
    S: BuildHasher,
{
}

#[cfg(any(feature = "std", feature = "foldhash"))]
impl<K, V> LinkedHashMap<K, V, DefaultHashBuilder> {
    /// Creates an empty map using the default hasher.
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }

    /// Creates an empty map that holds at least `capacity` entries before
    /// growing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, DefaultHashBuilder::default())
    }

    /// Creates an empty map from explicit sizing parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for a load factor outside `(0, 1)`.
    pub fn with_config(config: Config) -> Result<Self> {
        Self::with_config_and_hasher(config, DefaultHashBuilder::default())
    }
}

impl<K, V, S> LinkedHashMap<K, V, S> {
    /// Creates an empty map with the given hasher builder.
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_capacity_and_hasher(DEFAULT_MIN_CAPACITY, hash_builder)
    }

    /// Creates an empty map with the specified capacity and hasher builder.
    ///
    /// # Panics
    ///
    /// Panics if the table size for `capacity` overflows.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self {
            table: HashTable::with_capacity(capacity),
            hash_builder,
        }
    }

    /// Creates an empty map from explicit sizing parameters and a hasher
    /// builder.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for a load factor outside `(0, 1)` or
    /// an unrepresentable minimum capacity.
    pub fn with_config_and_hasher(config: Config, hash_builder: S) -> Result<Self> {
        Ok(Self {
            table: HashTable::with_config(config)?,
            hash_builder,
        })
    }

    /// Returns the number of entries in the map.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map contains no entries.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the number of entries the map holds before it grows.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns a reference to the map's hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Removes all entries, keeping the allocated table.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Shrinks the table to the smallest size that holds `max(target, len)`
    /// entries. The order of entries is preserved.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailed`] if the smaller table could not be
    /// allocated. The map is unchanged in that case.
    pub fn trim(&mut self, target: usize) -> Result<()> {
        self.table.trim(target)
    }

    /// Removes all entries and shrinks the table to the size needed for
    /// `target` entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailed`] if the smaller table could not be
    /// allocated. The map is empty either way.
    pub fn clear_and_trim(&mut self, target: usize) -> Result<()> {
        self.table.clear_and_trim(target)
    }

    /// Reserves room for at least `additional` more entries.
    pub fn reserve(&mut self, additional: usize) {
        self.table.reserve(additional);
    }

    fn first_slot(&self) -> Result<usize> {
        self.table.order().first().ok_or(Error::EmptyCollection)
    }

    fn last_slot(&self) -> Result<usize> {
        self.table.order().last().ok_or(Error::EmptyCollection)
    }

    /// Returns the first key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyCollection`] if the map is empty.
    pub fn first_key(&self) -> Result<&K> {
        Ok(&self.table[self.first_slot()?].0)
    }

    /// Returns the last key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyCollection`] if the map is empty.
    pub fn last_key(&self) -> Result<&K> {
        Ok(&self.table[self.last_slot()?].0)
    }

    /// Returns the first entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyCollection`] if the map is empty.
    pub fn first(&self) -> Result<(&K, &V)> {
        let (k, v) = &self.table[self.first_slot()?];
        Ok((k, v))
    }

    /// Returns the last entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyCollection`] if the map is empty.
    pub fn last(&self) -> Result<(&K, &V)> {
        let (k, v) = &self.table[self.last_slot()?];
        Ok((k, v))
    }

    fn remove_slot(&mut self, slot: usize) -> Option<(K, V)> {
        let entry = self.table.remove_at(slot, |_, _| {});
        self.table.maybe_shrink();
        entry
    }

    /// Removes and returns the first entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyCollection`] if the map is empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use shift_hash::Error;
    /// use shift_hash::LinkedHashMap;
    ///
    /// let mut map = LinkedHashMap::new();
    /// map.insert("a", 1);
    /// map.insert("b", 2);
    /// assert_eq!(map.pop_first(), Ok(("a", 1)));
    /// assert_eq!(map.pop_first(), Ok(("b", 2)));
    /// assert_eq!(map.pop_first(), Err(Error::EmptyCollection));
    /// # }
    /// ```
    pub fn pop_first(&mut self) -> Result<(K, V)> {
        let slot = self.first_slot()?;
        self.remove_slot(slot).ok_or(Error::EmptyCollection)
    }

    /// Removes and returns the last entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyCollection`] if the map is empty.
    pub fn pop_last(&mut self) -> Result<(K, V)> {
        let slot = self.last_slot()?;
        self.remove_slot(slot).ok_or(Error::EmptyCollection)
    }

    /// Returns an iterator over the entries from first to last.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            table: &self.table,
            slots: self.table.order().iter(),
            remaining: self.table.len(),
        }
    }

    /// Returns an iterator over the keys from first to last.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values from first to last.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Removes and yields every entry from first to last. The map is empty
    /// afterwards, even if the iterator is dropped early.
    pub fn drain(&mut self) -> Drain<'_, K, V> {
        let order = self.table.order();
        Drain {
            front: order.first(),
            back: order.last(),
            remaining: self.table.len(),
            table: &mut self.table,
        }
    }

    /// Returns `true` if some entry holds `value`.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.values().any(|v| v == value)
    }

    #[cfg(any(test, feature = "stats"))]
    /// Returns the distribution of probe distances in the underlying table.
    pub fn probe_histogram(&self) -> crate::hash_table::ProbeHistogram {
        self.table.probe_histogram()
    }

    #[cfg(any(test, feature = "stats"))]
    /// Returns utilization statistics of the underlying table.
    pub fn debug_stats(&self) -> crate::hash_table::DebugStats {
        self.table.debug_stats()
    }
}

impl<K, V, S> LinkedHashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn find_slot<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = make_hash(&self.hash_builder, key);
        self.table.find_index(hash, |(k, _)| k.borrow() == key).ok()
    }

    /// Inserts a key-value pair, returning the previous value for the key.
    ///
    /// A new key is appended at the back; an existing key keeps its position.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.entry(key) {
            Entry::Occupied(mut entry) => Some(entry.insert(value)),
            Entry::Vacant(entry) => {
                entry.insert(value);
                None
            }
        }
    }

    fn insert_slot(&mut self, key: K, value: V) -> (usize, Option<V>) {
        let hash = make_hash(&self.hash_builder, &key);
        match self.table.find_index(hash, |(k, _)| *k == key) {
            Ok(slot) => {
                let old = core::mem::replace(&mut self.table[slot].1, value);
                (slot, Some(old))
            }
            Err(slot) => (self.table.insert_at(slot, hash, (key, value)), None),
        }
    }

    /// Inserts a key-value pair and moves it to the front, returning the
    /// previous value for the key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use shift_hash::LinkedHashMap;
    ///
    /// let mut map = LinkedHashMap::new();
    /// map.insert(1, "a");
    /// map.insert_and_move_to_first(2, "b");
    /// assert_eq!(map.insert_and_move_to_first(1, "c"), Some("a"));
    /// assert_eq!(map.iter().collect::<Vec<_>>(), [(&1, &"c"), (&2, &"b")]);
    /// # }
    /// ```
    pub fn insert_and_move_to_first(&mut self, key: K, value: V) -> Option<V> {
        let (slot, old) = self.insert_slot(key, value);
        self.table.order_mut().move_to_front(slot);
        old
    }

    /// Inserts a key-value pair and moves it to the back, returning the
    /// previous value for the key.
    pub fn insert_and_move_to_last(&mut self, key: K, value: V) -> Option<V> {
        let (slot, old) = self.insert_slot(key, value);
        self.table.order_mut().move_to_back(slot);
        old
    }

    /// Moves `key` to the front. Returns `false` if the key is absent.
    pub fn move_to_first<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(slot) = self.find_slot(key) else {
            return false;
        };
        self.table.order_mut().move_to_front(slot);
        true
    }

    /// Moves `key` to the back. Returns `false` if the key is absent.
    pub fn move_to_last<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(slot) = self.find_slot(key) else {
            return false;
        };
        self.table.order_mut().move_to_back(slot);
        true
    }

    /// Returns the value for `key` and moves the entry to the front.
    pub fn get_and_move_to_first<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = self.find_slot(key)?;
        self.table.order_mut().move_to_front(slot);
        Some(&mut self.table[slot].1)
    }

    /// Returns the value for `key` and moves the entry to the back.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use shift_hash::LinkedHashMap;
    ///
    /// // Least recently used entry first.
    /// let mut lru: LinkedHashMap<&str, u32> = LinkedHashMap::new();
    /// lru.insert("a", 1);
    /// lru.insert("b", 2);
    /// lru.get_and_move_to_last("a");
    /// assert_eq!(lru.pop_first(), Ok(("b", 2)));
    /// # }
    /// ```
    pub fn get_and_move_to_last<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = self.find_slot(key)?;
        self.table.order_mut().move_to_back(slot);
        Some(&mut self.table[slot].1)
    }

    /// Returns a reference to the value for `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_key_value(key).map(|(_, v)| v)
    }

    /// Returns the stored key and value for `key`.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let (k, v) = &self.table[self.find_slot(key)?];
        Some((k, v))
    }

    /// Returns a mutable reference to the value for `key` without changing
    /// its position.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = self.find_slot(key)?;
        Some(&mut self.table[slot].1)
    }

    /// Returns the value for `key`, or `default` if the key is absent.
    pub fn get_or<'a, Q>(&'a self, key: &Q, default: &'a V) -> &'a V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).unwrap_or(default)
    }

    /// Returns `true` if the map contains `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find_slot(key).is_some()
    }

    /// Removes `key` and returns its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes `key` and returns the stored key and value.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = self.find_slot(key)?;
        self.remove_slot(slot)
    }

    /// Gets the entry for `key` for in-place manipulation. Inserting through
    /// a vacant entry appends at the back.
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, Linked> {
        let hash = make_hash(&self.hash_builder, &key);
        match self.table.find_index(hash, |(k, _)| *k == key) {
            Ok(slot) => Entry::Occupied(OccupiedEntry::new(&mut self.table, slot)),
            Err(slot) => Entry::Vacant(VacantEntry::new(&mut self.table, hash, slot, key)),
        }
    }

    /// Adds `increment` to the value for `key`, appending
    /// `V::default() + increment` if the key is absent. Returns the previous
    /// value, or `V::default()` if there was none.
    pub fn add_to(&mut self, key: K, increment: V) -> V
    where
        V: Copy + Default + core::ops::Add<Output = V>,
    {
        match self.entry(key) {
            Entry::Occupied(mut entry) => {
                let previous = *entry.get();
                *entry.get_mut() = previous + increment;
                previous
            }
            Entry::Vacant(entry) => {
                entry.insert(V::default() + increment);
                V::default()
            }
        }
    }

    /// Keeps only the entries for which `f` returns `true`, visiting them
    /// from first to last. The order of the kept entries is unchanged.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let mut cursor = self.cursor_mut();
        while let Some(slot) = cursor.step_forward() {
            let (k, v) = &mut cursor.map.table[slot];
            if !f(k, v) {
                cursor.take_current();
            }
        }
    }

    /// Returns a cursor positioned before the first entry.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use shift_hash::LinkedHashMap;
    ///
    /// let mut map: LinkedHashMap<u32, u32> = (0..6).map(|i| (i, i)).collect();
    /// let mut cursor = map.cursor_mut();
    /// while let Some((k, _)) = cursor.next().unwrap() {
    ///     if k % 2 == 1 {
    ///         cursor.remove().unwrap();
    ///     }
    /// }
    /// assert_eq!(map.keys().copied().collect::<Vec<_>>(), [0, 2, 4]);
    /// # }
    /// ```
    pub fn cursor_mut(&mut self) -> CursorMut<'_, K, V, S> {
        CursorMut {
            prev: None,
            next: self.table.order().first(),
            current: None,
            epoch: self.table.epoch(),
            map: self,
        }
    }

    /// Returns a cursor positioned right after `key`, or `None` if the key is
    /// absent. Stepping forward continues with the entry after `key`; stepping
    /// backward returns `key` itself.
    pub fn cursor_after<Q>(&mut self, key: &Q) -> Option<CursorMut<'_, K, V, S>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = self.find_slot(key)?;
        Some(CursorMut {
            prev: Some(slot),
            next: self.table.order().next(slot),
            current: None,
            epoch: self.table.epoch(),
            map: self,
        })
    }
}

#[cfg(any(feature = "std", feature = "foldhash"))]
impl<K, V> Default for LinkedHashMap<K, V, DefaultHashBuilder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, Q, V, S> core::ops::Index<&Q> for LinkedHashMap<K, V, S>
where
    K: Hash + Eq + Borrow<Q>,
    Q: Hash + Eq + ?Sized,
    S: BuildHasher,
{
    type Output = V;

    /// # Panics
    ///
    /// Panics if the key is not present.
    fn index(&self, key: &Q) -> &V {
        match self.get(key) {
            Some(value) => value,
            None => panic!("key not found in LinkedHashMap"),
        }
    }
}

impl<K, V, S> Extend<(K, V)> for LinkedHashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for LinkedHashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::with_hasher(S::default());
        map.extend(iter);
        map
    }
}

impl<K, V, S> IntoIterator for LinkedHashMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        let order = self.table.order();
        IntoIter {
            front: order.first(),
            back: order.last(),
            remaining: self.table.len(),
            table: self.table,
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a LinkedHashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A bidirectional cursor over a [`LinkedHashMap`].
///
/// The cursor sits between two entries. [`next`](Self::next) and
/// [`previous`](Self::previous) step over an entry and return it;
/// [`remove`](Self::remove) deletes the entry stepped over last.
///
/// Entries inserted through the cursor are appended at the back and are
/// reached by stepping forward. If such an insert grows the table, every
/// later call fails with [`Error::StructuralConflict`].
pub struct CursorMut<'a, K, V, S> {
    map: &'a mut LinkedHashMap<K, V, S>,
    prev: Option<usize>,
    next: Option<usize>,
    current: Option<usize>,
    epoch: u64,
}

impl<K, V, S> CursorMut<'_, K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn check(&self) -> Result<()> {
        if self.map.table.epoch() == self.epoch {
            Ok(())
        } else {
            Err(Error::StructuralConflict)
        }
    }

    fn step_forward(&mut self) -> Option<usize> {
        let slot = self.next?;
        self.prev = Some(slot);
        self.next = self.map.table.order().next(slot);
        self.current = Some(slot);
        Some(slot)
    }

    fn step_backward(&mut self) -> Option<usize> {
        let slot = self.prev?;
        self.next = Some(slot);
        self.prev = self.map.table.order().prev(slot);
        self.current = Some(slot);
        Some(slot)
    }

    fn take_current(&mut self) -> Option<(K, V)> {
        let slot = self.current.take()?;
        let order = self.map.table.order();
        if self.prev == Some(slot) {
            self.prev = order.prev(slot);
        } else {
            self.next = order.next(slot);
        }

        let prev = &mut self.prev;
        let next = &mut self.next;
        self.map.table.remove_at(slot, |from, to| {
            if *prev == Some(from) {
                *prev = Some(to);
            }
            if *next == Some(from) {
                *next = Some(to);
            }
        })
    }

    fn entry_at(&mut self, slot: usize) -> (&K, &mut V) {
        let (k, v) = &mut self.map.table[slot];
        (&*k, v)
    }

    /// Steps forward over the next entry and returns it, or `Ok(None)` at the
    /// end.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StructuralConflict`] if an insert through this cursor
    /// grew the table.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Option<(&K, &mut V)>> {
        self.check()?;
        Ok(self.step_forward().map(|slot| self.entry_at(slot)))
    }

    /// Steps backward over the previous entry and returns it, or `Ok(None)`
    /// at the start.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StructuralConflict`] if an insert through this cursor
    /// grew the table.
    pub fn previous(&mut self) -> Result<Option<(&K, &mut V)>> {
        self.check()?;
        Ok(self.step_backward().map(|slot| self.entry_at(slot)))
    }

    /// Returns `true` if there is an entry after the cursor.
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// Returns `true` if there is an entry before the cursor.
    pub fn has_previous(&self) -> bool {
        self.prev.is_some()
    }

    /// Removes the entry most recently stepped over.
    ///
    /// Removing through a cursor never shrinks the table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IteratorMisuse`] if the cursor has not stepped since
    /// it was created or since the last removal, and
    /// [`Error::StructuralConflict`] if the table was grown by this cursor.
    pub fn remove(&mut self) -> Result<(K, V)> {
        self.check()?;
        self.take_current().ok_or(Error::IteratorMisuse)
    }

    /// Inserts or overwrites an entry, returning the previous value. A new
    /// key is appended at the back.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StructuralConflict`] if the table was grown by an
    /// earlier insert through this cursor.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        self.check()?;

        let (slot, old) = self.map.insert_slot(key, value);
        if old.is_none() && self.next.is_none() && self.map.table.epoch() == self.epoch {
            self.next = Some(slot);
        }
        Ok(old)
    }
}

/// An iterator over the entries of a `LinkedHashMap` in order.
pub struct Iter<'a, K, V> {
    table: &'a HashTable<(K, V), Linked>,
    slots: Slots<'a>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.slots.next()?;
        self.remaining -= 1;
        let (k, v) = &self.table[slot];
        Some((k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let slot = self.slots.next_back()?;
        self.remaining -= 1;
        let (k, v) = &self.table[slot];
        Some((k, v))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// An iterator over the keys of a `LinkedHashMap` in order.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

/// An iterator over the values of a `LinkedHashMap` in order.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

/// Walks the list of a table whose entries are being taken out.
///
/// Taking an entry leaves its links in place, so the walk can continue from
/// a slot that was already emptied.
fn take_front<K, V>(
    table: &mut HashTable<(K, V), Linked>,
    front: &mut Option<usize>,
    back: &mut Option<usize>,
) -> Option<(K, V)> {
    let slot = (*front)?;
    if *front == *back {
        *front = None;
        *back = None;
    } else {
        *front = table.order().next(slot);
    }
    table.take(slot)
}

fn take_back<K, V>(
    table: &mut HashTable<(K, V), Linked>,
    front: &mut Option<usize>,
    back: &mut Option<usize>,
) -> Option<(K, V)> {
    let slot = (*back)?;
    if *front == *back {
        *front = None;
        *back = None;
    } else {
        *back = table.order().prev(slot);
    }
    table.take(slot)
}

/// A draining iterator over the entries of a `LinkedHashMap` in order.
pub struct Drain<'a, K, V> {
    table: &'a mut HashTable<(K, V), Linked>,
    front: Option<usize>,
    back: Option<usize>,
    remaining: usize,
}

impl<K, V> Iterator for Drain<'_, K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = take_front(self.table, &mut self.front, &mut self.back)?;
        self.remaining -= 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Drain<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let entry = take_back(self.table, &mut self.front, &mut self.back)?;
        self.remaining -= 1;
        Some(entry)
    }
}

impl<K, V> Drop for Drain<'_, K, V> {
    fn drop(&mut self) {
        self.table.clear();
    }
}

/// An owning iterator over the entries of a `LinkedHashMap` in order.
pub struct IntoIter<K, V> {
    table: HashTable<(K, V), Linked>,
    front: Option<usize>,
    back: Option<usize>,
    remaining: usize,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = take_front(&mut self.table, &mut self.front, &mut self.back)?;
        self.remaining -= 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let entry = take_back(&mut self.table, &mut self.front, &mut self.back)?;
        self.remaining -= 1;
        Some(entry)
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
