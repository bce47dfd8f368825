//! Extendible hash table - a thread-safe, incrementally growing hash index.
//!
//! The [`ExtendibleHashTable`] grows by splitting one full bucket at a time
//! instead of rehashing the whole table. It backs the buffer pool's page
//! table and is usable as a general key-value container.
//!
//! # Layout
//! ```text
//!  global_depth = 2
//!  directory (2^2 slots)           buckets
//!  ┌──────┐
//!  │  00  │──────────────────▶ [ depth 2 | k0, k4 ]
//!  │  01  │───────┐
//!  │  10  │───────┼──────────▶ [ depth 2 | k2, k6 ]
//!  │  11  │───────┴──────────▶ [ depth 1 | k1, k3 ]   (aliased by 01 and 11)
//!  └──────┘
//! ```
//!
//! A slot is selected by the low `global_depth` bits of the key's hash. A
//! bucket with `local_depth < global_depth` is shared by every slot that
//! agrees on its low `local_depth` bits.

use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use parking_lot::Mutex;

/// Deepest a bucket may split. Bit `local_depth` of the hash picks the child,
/// so the last usable bit bounds the depth.
const MAX_DEPTH: u32 = u64::BITS - 1;

/// A bucket shared by one or more directory slots.
///
/// Bucket latches are only ever taken while the directory latch is held, so
/// they never contend; they exist to give aliased buckets interior mutability.
type BucketRef<K, V> = Arc<Mutex<Bucket<K, V>>>;

/// Bounded list of entries whose hashes agree on the low `depth` bits.
struct Bucket<K, V> {
    items: Vec<(K, V)>,
    depth: u32,
    capacity: usize,
}

impl<K: Eq, V> Bucket<K, V> {
    fn new(capacity: usize, depth: u32) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            depth,
            capacity,
        }
    }

    fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    fn find(&self, key: &K) -> Option<&V> {
        self.items.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    fn find_mut(&mut self, key: &K) -> Option<&mut V> {
        self.items.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    fn remove(&mut self, key: &K) -> bool {
        match self.items.iter().position(|(k, _)| k == key) {
            Some(pos) => {
                self.items.remove(pos);
                true
            }
            None => false,
        }
    }

    fn push(&mut self, key: K, value: V) {
        debug_assert!(!self.is_full(), "push into a full bucket");
        self.items.push((key, value));
    }
}

/// Everything guarded by the table latch.
struct Directory<K, V> {
    global_depth: u32,
    bucket_size: usize,
    num_buckets: usize,
    slots: Vec<BucketRef<K, V>>,
}

impl<K: Eq, V> Directory<K, V> {
    fn new(bucket_size: usize) -> Self {
        Self {
            global_depth: 0,
            bucket_size,
            num_buckets: 1,
            slots: vec![Arc::new(Mutex::new(Bucket::new(bucket_size, 0)))],
        }
    }

    #[inline]
    fn index_of(&self, hash: u64) -> usize {
        (hash & ((1u64 << self.global_depth) - 1)) as usize
    }

    #[inline]
    fn bucket_for(&self, hash: u64) -> &BucketRef<K, V> {
        &self.slots[self.index_of(hash)]
    }

    /// Split the bucket that `hash` currently maps to.
    ///
    /// Doubles the directory first when the bucket already uses every
    /// directory bit. Afterwards every slot that aliased the old bucket
    /// points at one of the two children, wherever it sits in the directory.
    fn split<F>(&mut self, hash: u64, hash_key: F)
    where
        F: Fn(&K) -> u64,
    {
        let old = Arc::clone(self.bucket_for(hash));
        let local_depth = old.lock().depth;
        assert!(
            local_depth < MAX_DEPTH,
            "extendible hash table: more than {} keys share all {} hash bits",
            self.bucket_size,
            MAX_DEPTH
        );

        if local_depth == self.global_depth {
            self.slots.extend_from_within(..);
            self.global_depth += 1;
        }

        let split_bit = 1u64 << local_depth;
        let mut low = Bucket::new(self.bucket_size, local_depth + 1);
        let mut high = Bucket::new(self.bucket_size, local_depth + 1);
        for (key, value) in old.lock().items.drain(..) {
            if hash_key(&key) & split_bit != 0 {
                high.items.push((key, value));
            } else {
                low.items.push((key, value));
            }
        }

        let low = Arc::new(Mutex::new(low));
        let high = Arc::new(Mutex::new(high));
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if Arc::ptr_eq(slot, &old) {
                *slot = if index as u64 & split_bit != 0 {
                    Arc::clone(&high)
                } else {
                    Arc::clone(&low)
                };
            }
        }
        // One bucket became two; `old` is freed when this frame returns.
        self.num_buckets += 1;
    }
}

/// A thread-safe hash table using extendible hashing.
///
/// All operations serialize on one internal latch. Values are returned by
/// clone so no reference outlives the latch.
///
/// # Example
/// ```
/// use pagecache::container::hash::ExtendibleHashTable;
///
/// let table = ExtendibleHashTable::new(2);
/// table.insert(1, "a");
/// table.insert(2, "b");
/// table.insert(3, "c"); // splits the initial bucket
///
/// assert_eq!(table.find(&2), Some("b"));
/// assert!(table.remove(&2));
/// assert_eq!(table.find(&2), None);
/// assert!(table.global_depth() >= 1);
/// ```
pub struct ExtendibleHashTable<K, V, S = RandomState> {
    directory: Mutex<Directory<K, V>>,
    hash_builder: S,
}

impl<K, V> ExtendibleHashTable<K, V, RandomState>
where
    K: Hash + Eq,
    V: Clone,
{
    /// Create an empty table whose buckets hold `bucket_size` entries.
    ///
    /// # Panics
    /// Panics if `bucket_size` is 0.
    pub fn new(bucket_size: usize) -> Self {
        Self::with_hasher(bucket_size, RandomState::new())
    }
}

impl<K, V, S> ExtendibleHashTable<K, V, S>
where
    K: Hash + Eq,
    V: Clone,
    S: BuildHasher,
{
    /// Create an empty table that hashes keys with `hash_builder`.
    ///
    /// # Panics
    /// Panics if `bucket_size` is 0.
    pub fn with_hasher(bucket_size: usize, hash_builder: S) -> Self {
        assert!(bucket_size > 0, "bucket_size must be > 0");
        Self {
            directory: Mutex::new(Directory::new(bucket_size)),
            hash_builder,
        }
    }

    #[inline]
    fn hash(&self, key: &K) -> u64 {
        self.hash_builder.hash_one(key)
    }

    /// Directory slot for `key` under the current global depth.
    pub fn index_of(&self, key: &K) -> usize {
        let hash = self.hash(key);
        self.directory.lock().index_of(hash)
    }

    /// Look up the value stored for `key`.
    pub fn find(&self, key: &K) -> Option<V> {
        let hash = self.hash(key);
        let dir = self.directory.lock();
        let bucket = dir.bucket_for(hash).lock();
        bucket.find(key).cloned()
    }

    /// Remove `key`. Returns whether an entry was removed.
    ///
    /// Buckets never merge, so the directory keeps its size.
    pub fn remove(&self, key: &K) -> bool {
        let hash = self.hash(key);
        let dir = self.directory.lock();
        let mut bucket = dir.bucket_for(hash).lock();
        bucket.remove(key)
    }

    /// Insert or overwrite the value for `key`.
    ///
    /// An existing key is updated in place without growing the table. A new
    /// key splits its target bucket, doubling the directory when needed,
    /// until the bucket has room.
    ///
    /// # Panics
    /// Panics if more than `bucket_size` distinct keys share the same 63 low
    /// hash bits, since no split can separate them.
    pub fn insert(&self, key: K, value: V) {
        let hash = self.hash(&key);
        let mut dir = self.directory.lock();

        if let Some(slot) = dir.bucket_for(hash).lock().find_mut(&key) {
            *slot = value;
            return;
        }

        loop {
            let full = dir.bucket_for(hash).lock().is_full();
            if !full {
                break;
            }
            dir.split(hash, |k| self.hash(k));
        }

        dir.bucket_for(hash).lock().push(key, value);
    }

    /// Number of low hash bits used to pick a directory slot.
    pub fn global_depth(&self) -> u32 {
        self.directory.lock().global_depth
    }

    /// Local depth of the bucket referenced by directory slot `dir_index`.
    ///
    /// # Panics
    /// Panics if `dir_index >= 2^global_depth`.
    pub fn local_depth(&self, dir_index: usize) -> u32 {
        let dir = self.directory.lock();
        let depth = dir.slots[dir_index].lock().depth;
        depth
    }

    /// Number of distinct buckets.
    pub fn num_buckets(&self) -> usize {
        self.directory.lock().num_buckets
    }

    /// Number of directory slots, always `2^global_depth`.
    pub fn dir_len(&self) -> usize {
        self.directory.lock().slots.len()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        let dir = self.directory.lock();
        let mut seen: Vec<&BucketRef<K, V>> = Vec::with_capacity(dir.num_buckets);
        let mut total = 0;
        for slot in &dir.slots {
            if !seen.iter().any(|b| Arc::ptr_eq(b, slot)) {
                total += slot.lock().items.len();
                seen.push(slot);
            }
        }
        total
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V, S> fmt::Debug for ExtendibleHashTable<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = self.directory.lock();
        f.debug_struct("ExtendibleHashTable")
            .field("global_depth", &dir.global_depth)
            .field("bucket_size", &dir.bucket_size)
            .field("num_buckets", &dir.num_buckets)
            .field("dir_len", &dir.slots.len())
            .finish()
    }
}
