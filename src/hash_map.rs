use alloc::vec::Vec;
use core::borrow::Borrow;
use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;

use crate::DefaultHashBuilder;
use crate::error::Error;
use crate::error::Result;
use crate::hash_table::HashTable;
use crate::order::SlotOrder;
use crate::order::Unordered;
use crate::policy::Config;
use crate::policy::DEFAULT_MIN_CAPACITY;
use crate::policy::mix;

#[inline]
pub(crate) fn make_hash<Q: Hash + ?Sized, S: BuildHasher>(hash_builder: &S, key: &Q) -> u64 {
    mix(hash_builder.hash_one(key))
}

/// A hash map backed by an open-addressing [`HashTable`].
///
/// `HashMap<K, V, S>` stores key-value pairs where keys implement `Hash + Eq`
/// and uses a configurable hasher builder `S` to hash keys. Collisions are
/// resolved by linear probing and removals shift later entries back instead
/// of leaving tombstones, so lookups never slow down after churn.
///
/// Iteration order is the physical slot order and changes whenever the table
/// is resized.
///
/// # Performance Characteristics
///
/// - **Memory**: one `Option<(u64, (K, V))>` per slot; the table is between
///   `load_factor / 4` and `load_factor` full outside of explicit trims.
#[derive(Clone)]
pub struct HashMap<K, V, S = DefaultHashBuilder> {
    table: HashTable<(K, V)>,
    hash_builder: S,
}

impl<K, V, S> Debug for HashMap<K, V, S>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> PartialEq for HashMap<K, V, S>
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

impl<K, V, S> Eq for HashMap<K, V, S>
where
    K: Hash + Eq,
    V: Eq,
    S: BuildHasher,
{
}

#[cfg(any(feature = "std", feature = "foldhash"))]
impl<K, V> HashMap<K, V, DefaultHashBuilder> {
    /// Creates an empty map using the default hasher.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shift_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert("a", 1);
    /// assert_eq!(map.get("a"), Some(&1));
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }

    /// Creates an empty map that holds at least `capacity` entries before
    /// growing.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shift_hash::HashMap;
    ///
    /// let map: HashMap<i32, String> = HashMap::with_capacity(100);
    /// assert!(map.capacity() >= 100);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, DefaultHashBuilder::default())
    }

    /// Creates an empty map from explicit sizing parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for a load factor outside `(0, 1)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shift_hash::Config;
    /// use shift_hash::HashMap;
    ///
    /// let map: HashMap<u32, u32> = HashMap::with_config(Config::new(4, 0.75)).unwrap();
    /// assert_eq!(map.capacity(), 6);
    ///
    /// assert!(HashMap::<u32, u32>::with_config(Config::new(4, 1.0)).is_err());
    /// ```
    pub fn with_config(config: Config) -> Result<Self> {
        Self::with_config_and_hasher(config, DefaultHashBuilder::default())
    }
}

impl<K, V, S> HashMap<K, V, S> {
    /// Creates an empty map with the given hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use shift_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let map: HashMap<i32, String, _> = HashMap::with_hasher(SimpleHasher);
    /// assert!(map.is_empty());
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_capacity_and_hasher(DEFAULT_MIN_CAPACITY, hash_builder)
    }

    /// Creates an empty map with the specified capacity and hasher builder.
    ///
    /// The table is never shrunk below the size chosen here.
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
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use shift_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// assert_eq!(map.len(), 0);
    /// map.insert(1, "a");
    /// assert_eq!(map.len(), 1);
    /// # }
    /// ```
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
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use shift_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert(1, "a");
    /// map.clear();
    /// assert!(map.is_empty());
    /// # }
    /// ```
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Shrinks the table to the smallest size that holds `max(target, len)`
    /// entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailed`] if the smaller table could not be
    /// allocated. The map is unchanged in that case.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use shift_hash::HashMap;
    ///
    /// let mut map = HashMap::with_capacity(1000);
    /// map.insert(1, "a");
    /// map.trim(0).unwrap();
    /// assert!(map.capacity() < 1000);
    /// assert_eq!(map.get(&1), Some(&"a"));
    /// # }
    /// ```
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

    /// Returns an iterator over the entries in arbitrary order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use shift_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert(1, "a");
    /// map.insert(2, "b");
    ///
    /// let mut pairs: Vec<_> = map.iter().collect();
    /// pairs.sort();
    /// assert_eq!(pairs, [(&1, &"a"), (&2, &"b")]);
    /// # }
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator over the entries with mutable values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.table.iter_mut(),
        }
    }

    /// Returns an iterator over the keys.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Returns an iterator over mutable references to the values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use shift_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert("a", 1);
    /// map.insert("b", 2);
    /// for v in map.values_mut() {
    ///     *v *= 10;
    /// }
    /// assert_eq!(map["a"], 10);
    /// assert_eq!(map["b"], 20);
    /// # }
    /// ```
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// Removes and yields every entry. The map is empty afterwards, even if
    /// the iterator is dropped early.
    pub fn drain(&mut self) -> Drain<'_, K, V> {
        Drain {
            inner: self.table.drain(),
        }
    }

    /// Returns `true` if some entry holds `value`. Takes time linear in the
    /// table size.
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

impl<K, V, S> HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Inserts a key-value pair, returning the previous value for the key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use shift_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// assert_eq!(map.insert(37, "a"), None);
    /// assert_eq!(map.insert(37, "b"), Some("a"));
    /// assert_eq!(map.get(&37), Some(&"b"));
    /// # }
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.entry(key) {
            Entry::Occupied(mut entry) => Some(entry.insert(value)),
            Entry::Vacant(entry) => {
                entry.insert(value);
                None
            }
        }
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
        let hash = make_hash(&self.hash_builder, key);
        self.table
            .find(hash, |(k, _)| k.borrow() == key)
            .map(|(k, v)| (k, v))
    }

    /// Returns a mutable reference to the value for `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use shift_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert(1, 10);
    /// if let Some(v) = map.get_mut(&1) {
    ///     *v += 1;
    /// }
    /// assert_eq!(map[&1], 11);
    /// # }
    /// ```
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = make_hash(&self.hash_builder, key);
        self.table
            .find_mut(hash, |(k, _)| k.borrow() == key)
            .map(|(_, v)| v)
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
        self.get(key).is_some()
    }

    /// Removes `key` and returns its value. The table shrinks if it becomes
    /// sparse.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use shift_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert(1, "a");
    /// assert_eq!(map.remove(&1), Some("a"));
    /// assert_eq!(map.remove(&1), None);
    /// # }
    /// ```
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
        let hash = make_hash(&self.hash_builder, key);
        self.table.remove(hash, |(k, _)| k.borrow() == key)
    }

    /// Gets the entry for `key` for in-place manipulation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use shift_hash::HashMap;
    ///
    /// let mut counts = HashMap::new();
    /// for word in ["a", "b", "a"] {
    ///     *counts.entry(word).or_insert(0) += 1;
    /// }
    /// assert_eq!(counts["a"], 2);
    /// assert_eq!(counts["b"], 1);
    /// # }
    /// ```
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V> {
        let hash = make_hash(&self.hash_builder, &key);
        match self.table.find_index(hash, |(k, _)| *k == key) {
            Ok(slot) => Entry::Occupied(OccupiedEntry::new(&mut self.table, slot)),
            Err(slot) => Entry::Vacant(VacantEntry::new(&mut self.table, hash, slot, key)),
        }
    }

    /// Adds `increment` to the value for `key`, inserting
    /// `V::default() + increment` if the key is absent. Returns the previous
    /// value, or `V::default()` if there was none.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use shift_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// assert_eq!(map.add_to("hits", 3), 0);
    /// assert_eq!(map.add_to("hits", 2), 3);
    /// assert_eq!(map["hits"], 5);
    /// # }
    /// ```
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

    /// Keeps only the entries for which `f` returns `true`.
    ///
    /// Every entry is passed to `f` exactly once. The table is not shrunk;
    /// call [`trim`](Self::trim) afterwards to release memory.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use shift_hash::HashMap;
    ///
    /// let mut map: HashMap<i32, i32> = (0..10).map(|i| (i, i * 10)).collect();
    /// map.retain(|k, _| k % 2 == 0);
    /// assert_eq!(map.len(), 5);
    /// # }
    /// ```
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let mut cursor = self.cursor_mut();
        while let Some(slot) = cursor.advance() {
            let (k, v) = &mut cursor.map.table[slot];
            if !f(k, v) {
                cursor.take_current();
            }
        }
    }

    /// Returns a cursor that walks the map and can remove or insert entries
    /// while doing so.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use shift_hash::HashMap;
    ///
    /// let mut map: HashMap<u32, u32> = (0..20).map(|i| (i, i)).collect();
    /// let mut cursor = map.cursor_mut();
    /// while let Some((k, _)) = cursor.next().unwrap() {
    ///     if k % 3 == 0 {
    ///         cursor.remove().unwrap();
    ///     }
    /// }
    /// assert_eq!(map.len(), 13);
    /// # }
    /// ```
    pub fn cursor_mut(&mut self) -> CursorMut<'_, K, V, S> {
        CursorMut {
            pos: self.table.slots(),
            remaining: self.table.len(),
            epoch: self.table.epoch(),
            current: Current::None,
            wrapped: Vec::new(),
            wrapped_pos: 0,
            map: self,
        }
    }
}

#[cfg(any(feature = "std", feature = "foldhash"))]
impl<K, V> Default for HashMap<K, V, DefaultHashBuilder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, Q, V, S> core::ops::Index<&Q> for HashMap<K, V, S>
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
            None => panic!("key not found in HashMap"),
        }
    }
}

impl<K, V, S> Extend<(K, V)> for HashMap<K, V, S>
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

impl<K, V, S> FromIterator<(K, V)> for HashMap<K, V, S>
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

impl<K, V, S> IntoIterator for HashMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.table.into_iter(),
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut HashMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// A view into a single entry in the map, which may either be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashMap`].
///
/// [`entry`]: HashMap::entry
pub enum Entry<'a, K, V, O = Unordered> {
    /// A vacant entry.
    Vacant(VacantEntry<'a, K, V, O>),
    /// An occupied entry.
    Occupied(OccupiedEntry<'a, K, V, O>),
}

impl<'a, K, V, O: SlotOrder> Entry<'a, K, V, O> {
    /// Inserts a default value if the entry is vacant and returns a mutable
    /// reference.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts a value computed from a closure if the entry is vacant and
    /// returns a mutable reference.
    pub fn or_insert_with<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce() -> V,
    {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Provides in-place mutable access to an occupied entry before any
    /// potential inserts.
    pub fn and_modify<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut V),
    {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    /// Returns a reference to this entry's key.
    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(entry) => entry.key(),
            Entry::Vacant(entry) => entry.key(),
        }
    }
}

impl<'a, K, V, O> Entry<'a, K, V, O>
where
    V: Default,
    O: SlotOrder,
{
    /// Inserts the default value if the entry is vacant and returns a mutable
    /// reference.
    pub fn or_default(self) -> &'a mut V {
        self.or_insert_with(Default::default)
    }
}

/// A view into a vacant entry in the map.
pub struct VacantEntry<'a, K, V, O = Unordered> {
    table: &'a mut HashTable<(K, V), O>,
    hash: u64,
    slot: usize,
    key: K,
}

impl<'a, K, V, O: SlotOrder> VacantEntry<'a, K, V, O> {
    pub(crate) fn new(table: &'a mut HashTable<(K, V), O>, hash: u64, slot: usize, key: K) -> Self {
        Self {
            table,
            hash,
            slot,
            key,
        }
    }

    /// Gets a reference to the key that would be used when inserting a value.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Take ownership of the key.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Inserts the value into the map and returns a mutable reference to it.
    pub fn insert(self, value: V) -> &'a mut V {
        let VacantEntry {
            table,
            hash,
            slot,
            key,
        } = self;
        let slot = table.insert_at(slot, hash, (key, value));
        &mut table[slot].1
    }
}

/// A view into an occupied entry in the map.
pub struct OccupiedEntry<'a, K, V, O = Unordered> {
    table: &'a mut HashTable<(K, V), O>,
    slot: usize,
}

impl<'a, K, V, O: SlotOrder> OccupiedEntry<'a, K, V, O> {
    pub(crate) fn new(table: &'a mut HashTable<(K, V), O>, slot: usize) -> Self {
        Self { table, slot }
    }

    /// Gets a reference to the key in the entry.
    pub fn key(&self) -> &K {
        &self.table[self.slot].0
    }

    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        &self.table[self.slot].1
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        &mut self.table[self.slot].1
    }

    /// Converts the entry into a mutable reference to the value.
    pub fn into_mut(self) -> &'a mut V {
        &mut self.table[self.slot].1
    }

    /// Inserts a value into the entry and returns the old value.
    pub fn insert(&mut self, value: V) -> V {
        core::mem::replace(self.get_mut(), value)
    }

    /// Removes the entry from the map and returns the value.
    pub fn remove(self) -> V {
        self.remove_entry().1
    }

    /// Removes the entry from the map and returns the key and value.
    pub fn remove_entry(self) -> (K, V) {
        let entry = self.table.remove_at(self.slot, |_, _| {});
        self.table.maybe_shrink();
        match entry {
            Some(entry) => entry,
            None => unreachable!("occupied entry points at an empty slot"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Current {
    None,
    Slot(usize),
    Wrapped(usize),
}

/// A cursor over a [`HashMap`] that can remove the entry it last returned
/// and insert new entries.
///
/// The cursor scans the slots from the highest index down. Removing an entry
/// shifts later entries of its probe run back into the gap; an entry that
/// wraps around the end of the table from the unscanned low slots into the
/// scanned high slots is remembered and returned after the scan, so every
/// entry present when the cursor was created is returned exactly once.
///
/// Entries inserted through the cursor are returned only if they land in the
/// part of the table not yet scanned. If such an insert grows the table, the
/// cursor can no longer continue and every later call fails with
/// [`Error::StructuralConflict`].
pub struct CursorMut<'a, K, V, S> {
    map: &'a mut HashMap<K, V, S>,
    /// Slots `pos..` have been scanned.
    pos: usize,
    remaining: usize,
    current: Current,
    /// Slots of entries moved from unscanned to scanned slots.
    wrapped: Vec<usize>,
    wrapped_pos: usize,
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

    fn advance(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }

        while self.pos > 0 {
            self.pos -= 1;
            if self.map.table.is_occupied(self.pos) {
                self.remaining -= 1;
                self.current = Current::Slot(self.pos);
                return Some(self.pos);
            }
        }

        let index = self.wrapped_pos;
        let slot = *self.wrapped.get(index)?;
        self.wrapped_pos += 1;
        self.remaining -= 1;
        self.current = Current::Wrapped(index);
        Some(slot)
    }

    fn take_current(&mut self) -> Option<(K, V)> {
        let (slot, scanning) = match core::mem::replace(&mut self.current, Current::None) {
            Current::None => return None,
            Current::Slot(slot) => (slot, true),
            Current::Wrapped(index) => (self.wrapped[index], false),
        };

        let pos = self.pos;
        let wrapped = &mut self.wrapped;
        let pending = self.wrapped_pos;
        self.map.table.remove_at(slot, |from, to| {
            if let Some(tracked) = wrapped[pending..].iter_mut().find(|s| **s == from) {
                *tracked = to;
            } else if scanning && from < pos && to >= pos {
                wrapped.push(to);
            }
        })
    }

    /// Advances to the next entry and returns it.
    ///
    /// Returns `Ok(None)` once every entry has been returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StructuralConflict`] if an insert through this cursor
    /// grew the table.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Option<(&K, &mut V)>> {
        self.check()?;
        Ok(self.advance().map(|slot| {
            let (k, v) = &mut self.map.table[slot];
            (&*k, v)
        }))
    }

    /// Returns `true` if [`next`](Self::next) would return another entry.
    pub fn has_next(&self) -> bool {
        self.remaining > 0
    }

    /// Removes the entry most recently returned by [`next`](Self::next).
    ///
    /// Removing through a cursor never shrinks the table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IteratorMisuse`] if no entry has been returned since
    /// the cursor was created or since the last removal, and
    /// [`Error::StructuralConflict`] if the table was grown by this cursor.
    pub fn remove(&mut self) -> Result<(K, V)> {
        self.check()?;
        self.take_current().ok_or(Error::IteratorMisuse)
    }

    /// Inserts or overwrites an entry, returning the previous value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StructuralConflict`] if the table was grown by an
    /// earlier insert through this cursor.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        self.check()?;

        let hash = make_hash(&self.map.hash_builder, &key);
        match self.map.table.find_index(hash, |(k, _)| *k == key) {
            Ok(slot) => Ok(Some(core::mem::replace(&mut self.map.table[slot].1, value))),
            Err(slot) => {
                let slot = self.map.table.insert_at(slot, hash, (key, value));
                if self.map.table.epoch() == self.epoch && slot < self.pos {
                    self.remaining += 1;
                }
                Ok(None)
            }
        }
    }
}

/// An iterator over the key-value pairs of a `HashMap`.
pub struct Iter<'a, K, V> {
    inner: crate::hash_table::Iter<'a, (K, V)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// A mutable iterator over the entries of a `HashMap`.
pub struct IterMut<'a, K, V> {
    inner: crate::hash_table::IterMut<'a, (K, V)>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (&*k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

/// An iterator over the keys of a `HashMap`.
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

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

/// An iterator over the values of a `HashMap`.
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

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

/// A mutable iterator over the values of a `HashMap`.
pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}

/// A draining iterator over the key-value pairs of a `HashMap`.
pub struct Drain<'a, K, V> {
    inner: crate::hash_table::Drain<'a, (K, V), Unordered>,
}

impl<K, V> Iterator for Drain<'_, K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Drain<'_, K, V> {}

/// An owning iterator over the key-value pairs of a `HashMap`.
pub struct IntoIter<K, V> {
    inner: crate::hash_table::IntoIter<(K, V)>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
