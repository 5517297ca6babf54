#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod error;

pub mod policy;

pub mod order;

pub mod hash_table;

/// An unordered hash map with linear probing and backward-shift deletion.
///
/// This module provides a `HashMap` that wraps the `HashTable` and provides
/// a standard key-value map interface with configurable hashers.
pub mod hash_map;

/// A hash map that remembers the order of its entries.
///
/// Entries are kept on a doubly-linked list threaded through the table's
/// slots. New keys go to the back; existing keys can be spliced to either end
/// in constant time.
pub mod linked_hash_map;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// Hasher builder used when none is specified.
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// Hasher builder used when none is specified.
        pub type DefaultHashBuilder = std::hash::RandomState;
    } else {
        /// Placeholder hasher builder for builds without a default hasher.
        ///
        /// It cannot be constructed, so maps must be created with an explicit
        /// hasher through `with_hasher` and friends.
        #[derive(Clone, Copy, Debug)]
        pub enum DefaultHashBuilder {}

        impl core::hash::BuildHasher for DefaultHashBuilder {
            type Hasher = NoHasher;

            fn build_hasher(&self) -> NoHasher {
                match *self {}
            }
        }

        /// The hasher of the uninhabited [`DefaultHashBuilder`].
        #[derive(Debug)]
        pub enum NoHasher {}

        impl core::hash::Hasher for NoHasher {
            fn finish(&self) -> u64 {
                match *self {}
            }

            fn write(&mut self, _bytes: &[u8]) {
                match *self {}
            }
        }
    }
}

pub use error::Error;
pub use error::Result;
pub use hash_map::Entry;
pub use hash_map::HashMap;
pub use hash_table::HashTable;
pub use linked_hash_map::LinkedHashMap;
pub use policy::Config;
