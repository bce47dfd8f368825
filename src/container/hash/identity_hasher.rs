//! A pass-through hasher for integer keys.

use std::hash::{BuildHasherDefault, Hasher};

/// Hashes an integer key to its own value.
///
/// Sequential ids then spread evenly over the low bits that select a
/// directory slot, and bucket placement is deterministic across runs.
/// Every write is folded into the running state with a multiplicative mix,
/// so strings and composite keys still spread; a single integer written to
/// a fresh hasher comes out unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityHasher {
    hash: u64,
}

/// `BuildHasher` for [`IdentityHasher`].
pub type BuildIdentityHasher = BuildHasherDefault<IdentityHasher>;

impl IdentityHasher {
    const FOLD: u64 = 0x100_0000_01b3;

    /// Fold `n` into the running hash. From a fresh hasher this yields `n`.
    #[inline]
    fn fold(&mut self, n: u64) {
        self.hash = self.hash.wrapping_mul(Self::FOLD).wrapping_add(n);
    }
}

impl Hasher for IdentityHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.hash
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.fold(b as u64);
        }
    }

    #[inline]
    fn write_u8(&mut self, n: u8) {
        self.fold(n as u64);
    }

    #[inline]
    fn write_u16(&mut self, n: u16) {
        self.fold(n as u64);
    }

    #[inline]
    fn write_u32(&mut self, n: u32) {
        self.fold(n as u64);
    }

    #[inline]
    fn write_u64(&mut self, n: u64) {
        self.fold(n);
    }

    #[inline]
    fn write_usize(&mut self, n: usize) {
        self.fold(n as u64);
    }

    #[inline]
    fn write_i32(&mut self, n: i32) {
        self.fold(n as u32 as u64);
    }

    #[inline]
    fn write_i64(&mut self, n: i64) {
        self.fold(n as u64);
    }
}
