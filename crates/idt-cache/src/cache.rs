//! Most-recently-used memoization cache.
//!
//! [`Cache`] keeps up to `capacity` entries ordered from most to least
//! recently used. Each entry pairs a descriptor (the question) with the
//! computed data and whether computing it succeeded.
//!
//! # Example
//!
//! ```rust
//! use idt_cache::Cache;
//!
//! let mut cache: Cache<String, u32> = Cache::new("squares");
//! let (ok, value) = cache.fetch("7".to_string(), |out| {
//!     *out = 49;
//!     true
//! });
//! assert!(ok);
//! assert_eq!(value, 49);
//!
//! // Second lookup is served from the cache; the closure never runs.
//! let (_, value) = cache.fetch("7".to_string(), |_| unreachable!());
//! assert_eq!(value, 49);
//! ```

use std::collections::VecDeque;
use std::fmt::Display;

use tracing::info;

/// Default number of entries kept per cache.
pub const DEFAULT_CAPACITY: usize = 10;

/// Memoizing cache with least-recently-used eviction.
///
/// Descriptors are compared with `==` in a linear scan; capacities are
/// small enough that hashing would not pay off, and descriptors holding
/// floats cannot be hashed anyway.
#[derive(Debug, Clone)]
pub struct Cache<D, T> {
    /// Name used in log messages.
    pub name: String,
    /// Maximum number of entries.
    pub capacity: usize,
    /// When set, every fetch recomputes and the cache stays empty.
    pub disabled: bool,
    /// Logs lookups when greater than zero.
    pub verbosity: u8,
    entries: VecDeque<(D, (bool, T))>,
}

impl<D, T> Cache<D, T>
where
    D: PartialEq + Display,
    T: Default + Clone,
{
    /// Creates an empty cache with [`DEFAULT_CAPACITY`].
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_capacity(name, DEFAULT_CAPACITY)
    }

    /// Creates an empty cache holding at most `capacity` entries.
    pub fn with_capacity(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            capacity,
            disabled: false,
            verbosity: 0,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Descriptors from most to least recently used.
    pub fn descriptors(&self) -> impl Iterator<Item = &D> {
        self.entries.iter().map(|(descriptor, _)| descriptor)
    }

    /// Returns the result for `descriptor`, computing it on a miss.
    ///
    /// `compute` starts from `T::default()`, fills in the data and returns
    /// whether it succeeded. Hits move the entry to the front. A miss at
    /// capacity evicts the least recently used entry.
    pub fn fetch<F>(&mut self, descriptor: D, compute: F) -> (bool, T)
    where
        F: FnOnce(&mut T) -> bool,
    {
        if self.disabled {
            if self.verbosity > 0 {
                info!("Cache ({}): disabled.", self.name);
            }
            self.entries.clear();
            return Self::compute(compute);
        }

        if self.verbosity > 0 {
            info!("Cache ({}): searching for an entry [{}].", self.name, descriptor);
        }

        if let Some(index) = self.entries.iter().position(|(d, _)| *d == descriptor) {
            if self.verbosity > 0 {
                info!("Cache ({}): found in cache!", self.name);
            }
            if let Some(entry) = self.entries.remove(index) {
                let result = entry.1.clone();
                self.entries.push_front(entry);
                return result;
            }
        }

        if self.verbosity > 0 {
            info!("Cache ({}): not found. Calculating a new entry.", self.name);
        }

        let result = Self::compute(compute);
        if self.capacity == 0 {
            return result;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_back();
        }
        self.entries.push_front((descriptor, result.clone()));
        result
    }

    fn compute<F>(compute: F) -> (bool, T)
    where
        F: FnOnce(&mut T) -> bool,
    {
        let mut data = T::default();
        let ok = compute(&mut data);
        (ok, data)
    }
}
