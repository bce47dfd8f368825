//! In-memory containers.
//!
//! - [`hash`] - Extendible hash table used as the buffer pool's page table

pub mod hash;
