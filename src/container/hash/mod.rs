//! Hash-based containers.
//!
//! - [`ExtendibleHashTable`] - Thread-safe table that grows one bucket split at a time
//! - [`IdentityHasher`] - Pass-through hasher for integer keys

mod extendible_hash_table;
mod identity_hasher;

pub use extendible_hash_table::ExtendibleHashTable;
pub use identity_hasher::{BuildIdentityHasher, IdentityHasher};
