//! Insertion-ordered hash set used to weld identical vertices.
//!
//! [`ValueListSet`] behaves both as a set (find-or-insert in expected O(1))
//! and as a list (values keep the index they were first inserted at). It is
//! the vertex-welding engine: feeding every emitted vertex through
//! [`use_value`](ValueListSet::use_value) yields a dense, duplicate-free
//! vertex list plus the index of each emitted vertex within it.
//!
//! Storage is open hashing with singly linked chains threaded through the
//! entry table: each bucket holds the index of the most recently inserted
//! entry with that bucket, and each entry links to the previous one.
//!
//! ```
//! use redlilium_meshpack::weld::{DefaultComparer, ValueListSet};
//!
//! let mut set = ValueListSet::new(4, DefaultComparer);
//! assert_eq!(set.use_value(&"a"), 0);
//! assert_eq!(set.use_value(&"b"), 1);
//! assert_eq!(set.use_value(&"a"), 0);
//! assert_eq!(set.len(), 2);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::error::{PackError, PackResult};

const NONE: u32 = u32::MAX;

/// Hashing and equality used by a [`ValueListSet`].
pub trait ValueComparer<T: ?Sized> {
    /// Hash `value`. Equal values must hash equally.
    fn hash(&self, value: &T) -> u64;

    /// Whether `a` and `b` are the same value.
    fn equals(&self, a: &T, b: &T) -> bool;
}

/// Compares values through their `Hash` and `Eq` implementations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultComparer;

impl<T: Hash + Eq + ?Sized> ValueComparer<T> for DefaultComparer {
    fn hash(&self, value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    fn equals(&self, a: &T, b: &T) -> bool {
        a == b
    }
}

/// Compares plain-old-data values by their bytes.
///
/// This is the welding comparer for vertex records: two vertices are the
/// same vertex only when every field is bit-identical, so `0.0` and `-0.0`
/// stay distinct and NaN payloads compare by bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BytewiseComparer;

impl<T: bytemuck::Pod> ValueComparer<T> for BytewiseComparer {
    fn hash(&self, value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        bytemuck::bytes_of(value).hash(&mut hasher);
        hasher.finish()
    }

    fn equals(&self, a: &T, b: &T) -> bool {
        bytemuck::bytes_of(a) == bytemuck::bytes_of(b)
    }
}

#[derive(Debug, Clone)]
struct Entry<T> {
    hash: u64,
    next: u32,
    value: T,
}

/// An append-only, insertion-ordered set with stable indices.
///
/// Values are never removed individually; indices returned by
/// [`use_value`](Self::use_value) stay valid until [`clear`](Self::clear).
#[derive(Debug, Clone)]
pub struct ValueListSet<T, C = DefaultComparer> {
    entries: Vec<Entry<T>>,
    buckets: Vec<u32>,
    comparer: C,
    version: u64,
}

impl<T, C: ValueComparer<T>> ValueListSet<T, C> {
    /// Create a set sized for at least `capacity` values.
    pub fn new(capacity: usize, comparer: C) -> Self {
        let size = next_prime(capacity.max(3));
        Self {
            entries: Vec::with_capacity(size),
            buckets: vec![NONE; size],
            comparer,
            version: 0,
        }
    }

    /// Create a set sized for `capacity` values with a default comparer.
    pub fn with_capacity(capacity: usize) -> Self
    where
        C: Default,
    {
        Self::new(capacity, C::default())
    }

    /// Number of distinct values.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current bucket table size.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// The comparer in use.
    pub fn comparer(&self) -> &C {
        &self.comparer
    }

    /// Remove every value, keeping the allocated tables.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.buckets.fill(NONE);
        self.version += 1;
    }

    /// Index of `value`, if present.
    pub fn index_of(&self, value: &T) -> Option<usize> {
        let hash = self.comparer.hash(value);
        self.find(hash, value)
    }

    /// Whether `value` is present.
    pub fn contains(&self, value: &T) -> bool {
        self.index_of(value).is_some()
    }

    /// Value at `index`.
    pub fn get(&self, index: usize) -> PackResult<&T> {
        self.entries.get(index).map(|e| &e.value).ok_or_else(|| {
            PackError::Bounds(format!(
                "index {index} out of range for a set of {} values",
                self.entries.len()
            ))
        })
    }

    /// Index of `value`, inserting it at the end if absent.
    pub fn use_value(&mut self, value: &T) -> usize
    where
        T: Clone,
    {
        let hash = self.comparer.hash(value);
        if let Some(index) = self.find(hash, value) {
            return index;
        }

        if self.entries.len() == self.buckets.len() {
            self.grow();
        }

        let index = self.entries.len();
        let bucket = self.bucket_of(hash);
        self.entries.push(Entry {
            hash,
            next: self.buckets[bucket],
            value: value.clone(),
        });
        self.buckets[bucket] = index as u32;
        self.version += 1;
        index
    }

    /// Rewrite every value with `f` and rebuild every bucket.
    ///
    /// Hashes change with the values, so the whole table is rebuilt; this is
    /// O(n). Indices are preserved. If `f` maps two values onto equal ones,
    /// both entries stay and [`index_of`](Self::index_of) returns either.
    pub fn apply_transform(&mut self, mut f: impl FnMut(&T) -> T) {
        for entry in &mut self.entries {
            entry.value = f(&entry.value);
            entry.hash = self.comparer.hash(&entry.value);
        }
        self.rebuild_buckets();
        self.version += 1;
    }

    /// Iterate over values in insertion order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.entries.iter(),
        }
    }

    /// A detached cursor over the current contents.
    ///
    /// Unlike [`iter`](Self::iter) the cursor does not borrow the set; it
    /// fails on the next step if the set changed in between.
    pub fn cursor(&self) -> WeldCursor {
        WeldCursor {
            position: 0,
            version: self.version,
        }
    }

    /// Copy every value, in order, into `dst`, replacing its contents.
    ///
    /// Every value keeps its index, including values that compare equal
    /// after [`apply_transform`](Self::apply_transform). Hashes are
    /// recomputed with `dst`'s comparer.
    pub fn copy_to<C2: ValueComparer<T>>(&self, dst: &mut ValueListSet<T, C2>)
    where
        T: Clone,
    {
        dst.entries.clear();
        dst.entries.extend(self.entries.iter().map(|e| Entry {
            hash: dst.comparer.hash(&e.value),
            next: NONE,
            value: e.value.clone(),
        }));
        let size = next_prime((self.entries.len() + 1).max(dst.buckets.len()));
        dst.buckets = vec![NONE; size];
        dst.rebuild_buckets();
        dst.version += 1;
    }

    /// Clone the values into a `Vec` in index order.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().cloned().collect()
    }

    /// Consume the set, returning its values in index order.
    pub fn into_values(self) -> Vec<T> {
        self.entries.into_iter().map(|e| e.value).collect()
    }

    fn find(&self, hash: u64, value: &T) -> Option<usize> {
        let mut i = self.buckets[self.bucket_of(hash)];
        while i != NONE {
            let entry = &self.entries[i as usize];
            if entry.hash == hash && self.comparer.equals(&entry.value, value) {
                return Some(i as usize);
            }
            i = entry.next;
        }
        None
    }

    #[inline]
    fn bucket_of(&self, hash: u64) -> usize {
        (hash % self.buckets.len() as u64) as usize
    }

    fn grow(&mut self) {
        let size = next_prime(self.buckets.len() * 2);
        log::trace!("ValueListSet: growing {} -> {size} buckets", self.buckets.len());
        self.buckets = vec![NONE; size];
        self.entries.reserve(size - self.entries.len());
        self.rebuild_buckets();
    }

    fn rebuild_buckets(&mut self) {
        self.buckets.fill(NONE);
        for i in 0..self.entries.len() {
            let bucket = self.bucket_of(self.entries[i].hash);
            self.entries[i].next = self.buckets[bucket];
            self.buckets[bucket] = i as u32;
        }
    }
}

impl<T, C: ValueComparer<T> + Default> Default for ValueListSet<T, C> {
    fn default() -> Self {
        Self::new(0, C::default())
    }
}

impl<T, C: ValueComparer<T>> std::ops::Index<usize> for ValueListSet<T, C> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.entries[index].value
    }
}

impl<'a, T, C: ValueComparer<T>> IntoIterator for &'a ValueListSet<T, C> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        Iter {
            inner: self.entries.iter(),
        }
    }
}

/// Borrowing iterator over a [`ValueListSet`] in index order.
#[derive(Debug, Clone)]
pub struct Iter<'a, T> {
    inner: std::slice::Iter<'a, Entry<T>>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        self.inner.next().map(|e| &e.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

/// Restartable position in a [`ValueListSet`] that detects mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeldCursor {
    position: usize,
    version: u64,
}

impl WeldCursor {
    /// Advance the cursor, returning the next value.
    ///
    /// Fails with [`PackError::InvalidState`] if `set` was modified since the
    /// cursor was created or last reset.
    pub fn next<'a, T, C: ValueComparer<T>>(
        &mut self,
        set: &'a ValueListSet<T, C>,
    ) -> PackResult<Option<&'a T>> {
        if set.version != self.version {
            return Err(PackError::InvalidState(
                "set was modified during enumeration".into(),
            ));
        }
        let value = set.entries.get(self.position).map(|e| &e.value);
        if value.is_some() {
            self.position += 1;
        }
        Ok(value)
    }

    /// Restart from the first value of the set's current contents.
    pub fn reset<T, C: ValueComparer<T>>(&mut self, set: &ValueListSet<T, C>) {
        self.position = 0;
        self.version = set.version;
    }
}

/// Smallest prime `>= n`.
fn next_prime(n: usize) -> usize {
    let mut candidate = n.max(2);
    while !is_prime(candidate) {
        candidate += 1;
    }
    candidate
}

fn is_prime(n: usize) -> bool {
    if n < 4 {
        return n >= 2;
    }
    if n % 2 == 0 {
        return false;
    }
    let mut d = 3;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}
