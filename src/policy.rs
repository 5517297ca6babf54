//! Sizing and hashing policy shared by every table.
//!
//! Tables always have a power-of-two number of slots so that the ideal slot
//! of a hash is `hash & mask`. Because of that, hashes are passed through
//! [`mix`] first: a hash with weak low bits would otherwise cluster.

use crate::error::Error;
use crate::error::Result;

/// Load factor used by [`Config::default`].
pub const DEFAULT_LOAD_FACTOR: f32 = 0.75;

/// Expected number of entries used by [`Config::default`].
pub const DEFAULT_MIN_CAPACITY: usize = 16;

/// Tables at or below this many slots are never shrunk by deletions.
pub(crate) const FLOOR_CAPACITY: usize = 16;

/// Largest slot count a table may use.
const MAX_SLOTS: usize = 1 << (usize::BITS - 2);

/// 2^64 divided by the golden ratio.
const LONG_PHI: u64 = 0x9E37_79B9_7F4A_7C15;

/// Avalanches a 64-bit hash so that its low bits are well distributed.
///
/// # Examples
///
/// ```rust
/// use shift_hash::policy::mix;
///
/// // Consecutive inputs land far apart.
/// assert_ne!(mix(1) & 0xF, mix(2) & 0xF);
/// ```
#[inline(always)]
pub const fn mix(hash: u64) -> u64 {
    let h = hash.wrapping_mul(LONG_PHI);
    let h = h ^ (h >> 32);
    h ^ (h >> 16)
}

#[inline]
fn ceil_to_usize(x: f64) -> Option<usize> {
    if x.is_nan() || x < 0.0 || x >= MAX_SLOTS as f64 {
        return None;
    }
    let truncated = x as usize;
    if (truncated as f64) < x {
        Some(truncated + 1)
    } else {
        Some(truncated)
    }
}

/// Returns the smallest power of two `n >= 2` such that `requested` entries
/// fit under `load_factor`, i.e. `ceil(requested / load_factor) <= n`.
///
/// Returns `None` if the table would be unreasonably large.
///
/// # Examples
///
/// ```rust
/// use shift_hash::policy::capacity_for;
///
/// assert_eq!(capacity_for(4, 0.75), Some(8));
/// assert_eq!(capacity_for(0, 0.75), Some(2));
/// ```
pub fn capacity_for(requested: usize, load_factor: f32) -> Option<usize> {
    let slots = ceil_to_usize(requested as f64 / load_factor as f64)?;
    let n = slots.checked_next_power_of_two()?.max(2);
    (n <= MAX_SLOTS).then_some(n)
}

/// Maximum number of entries a table of `slots` slots holds before growing.
///
/// Always leaves at least one slot empty so that probing terminates.
pub fn max_fill(slots: usize, load_factor: f32) -> usize {
    debug_assert!(slots >= 2);
    let fill = ceil_to_usize(slots as f64 * load_factor as f64).unwrap_or(slots);
    fill.min(slots - 1)
}

/// Construction parameters for a map.
///
/// `min_capacity` is the number of entries the map should hold without
/// growing; the table is also never shrunk below the size computed from it.
///
/// # Examples
///
/// ```rust
/// use shift_hash::Config;
///
/// let config = Config::default().with_min_capacity(4).with_load_factor(0.5);
/// assert_eq!(config.validate(), Ok(8));
///
/// assert!(Config::default().with_load_factor(1.0).validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Number of entries the initial table must accommodate.
    pub min_capacity: usize,
    /// Fraction of slots that may be filled before the table grows. Must be
    /// strictly between 0 and 1.
    pub load_factor: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_capacity: DEFAULT_MIN_CAPACITY,
            load_factor: DEFAULT_LOAD_FACTOR,
        }
    }
}

impl Config {
    /// Creates a configuration from its two parameters.
    pub const fn new(min_capacity: usize, load_factor: f32) -> Self {
        Self {
            min_capacity,
            load_factor,
        }
    }

    /// Replaces the minimum capacity.
    pub const fn with_min_capacity(mut self, min_capacity: usize) -> Self {
        self.min_capacity = min_capacity;
        self
    }

    /// Replaces the load factor.
    pub const fn with_load_factor(mut self, load_factor: f32) -> Self {
        self.load_factor = load_factor;
        self
    }

    /// Checks the parameters and returns the initial number of slots.
    pub fn validate(&self) -> Result<usize> {
        let invalid = || Error::InvalidConfig {
            min_capacity: self.min_capacity,
            load_factor: self.load_factor,
        };

        if !(self.load_factor > 0.0 && self.load_factor < 1.0) {
            return Err(invalid());
        }
        capacity_for(self.min_capacity, self.load_factor).ok_or_else(invalid)
    }
}

#[cfg(test)]
mod tests {
    use alloc::collections::BTreeSet;

    use super::*;

    #[test]
    fn capacity_is_power_of_two_and_fits() {
        for lf in [0.25f32, 0.5, 0.75, 0.9, 0.99] {
            for requested in 0..500 {
                let n = capacity_for(requested, lf).unwrap();
                assert!(n.is_power_of_two());
                assert!(n >= 2);
                assert!(max_fill(n, lf) >= requested.min(n - 1));
                if n > 2 {
                    // The next smaller table would not have been enough.
                    assert!(((n / 2) as f64) < requested as f64 / lf as f64);
                }
            }
        }
    }

    #[test]
    fn concrete_sizes() {
        assert_eq!(capacity_for(4, 0.75), Some(8));
        assert_eq!(capacity_for(7, 0.75), Some(16));
        assert_eq!(capacity_for(16, 0.75), Some(32));
        assert_eq!(capacity_for(1, 0.5), Some(2));
        assert_eq!(max_fill(8, 0.75), 6);
        assert_eq!(max_fill(16, 0.75), 12);
        assert_eq!(max_fill(2, 0.99), 1);
        assert_eq!(max_fill(4, 0.99), 3);
    }

    #[test]
    fn capacity_overflow_is_reported() {
        assert_eq!(capacity_for(usize::MAX, 0.75), None);
        assert_eq!(capacity_for(usize::MAX / 2, 0.5), None);
    }

    #[test]
    fn ceil_rejects_non_finite_and_negative() {
        assert_eq!(ceil_to_usize(f64::NAN), None);
        assert_eq!(ceil_to_usize(-0.5), None);
        assert_eq!(ceil_to_usize(f64::INFINITY), None);
        assert_eq!(ceil_to_usize(0.0), Some(0));
        assert_eq!(ceil_to_usize(2.25), Some(3));
        assert_eq!(capacity_for(4, f32::NAN), None);
    }

    #[test]
    fn mix_spreads_sequential_keys() {
        let mask = 63u64;
        let buckets: BTreeSet<u64> = (0..64u64).map(|k| mix(k) & mask).collect();
        // Identity hashing would fill all 64 buckets exactly; a good mix
        // behaves like random placement, which still covers most of them.
        assert!(buckets.len() > 32, "only {} buckets used", buckets.len());
        assert_ne!(mix(0x1_0000_0000) & mask, mix(0x2_0000_0000) & mask);
    }

    #[test]
    fn config_validation() {
        assert_eq!(Config::default().validate(), Ok(32));
        assert_eq!(Config::new(4, 0.75).validate(), Ok(8));

        for lf in [0.0f32, 1.0, -0.5, 1.5, f32::NAN, f32::INFINITY] {
            assert_eq!(
                Config::new(4, lf).validate().map_err(|_| ()),
                Err(()),
                "load factor {lf} accepted"
            );
        }

        assert!(matches!(
            Config::new(usize::MAX, 0.5).validate(),
            Err(Error::InvalidConfig {
                min_capacity: usize::MAX,
                ..
            })
        ));
    }
}
