use core::fmt;

/// Errors reported by the maps in this crate.
///
/// Lookups, inserts and removals are total and never fail; errors only come
/// from construction, from the ordered accessors of
/// [`LinkedHashMap`](crate::LinkedHashMap), from cursors, and from fallible
/// reallocation in `trim`.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The construction parameters were rejected: the load factor must lie
    /// strictly between 0 and 1, and the minimum capacity must describe a
    /// table size that fits in memory.
    InvalidConfig {
        /// The requested minimum capacity.
        min_capacity: usize,
        /// The requested load factor.
        load_factor: f32,
    },
    /// A first/last accessor was used on an empty map.
    EmptyCollection,
    /// `remove` was called on a cursor before it returned an entry, or twice
    /// without stepping in between.
    IteratorMisuse,
    /// The table was rehashed while a cursor was open.
    StructuralConflict,
    /// A shrinking reallocation could not allocate; the table is unchanged.
    AllocationFailed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig {
                min_capacity,
                load_factor,
            } => write!(
                f,
                "invalid map configuration: min_capacity={min_capacity}, load_factor={load_factor} \
                 (load factor must be in (0, 1))"
            ),
            Self::EmptyCollection => write!(f, "the map is empty"),
            Self::IteratorMisuse => {
                write!(f, "cursor has no current entry to remove")
            }
            Self::StructuralConflict => {
                write!(f, "the map was rehashed while the cursor was open")
            }
            Self::AllocationFailed => write!(f, "failed to allocate the resized table"),
        }
    }
}

impl core::error::Error for Error {}

/// Result alias using this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;
