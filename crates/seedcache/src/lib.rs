//! # seedcache
//!
//! Bounded in-memory caches used by formseed's metadata lookups.
//!
//! ## Architecture
//! - **HashMap**: AHash-keyed index into a node slab (O(1) lookups)
//! - **Recency list**: Doubly-linked list, oldest entry evicted first (O(1))
//! - **Locking**: One `parking_lot` mutex per cache instance
//! - **Conditional writes**: `test_and_set` for race-free de-duplication and
//!   per-key request gating

#![warn(missing_docs)]

mod bounded;
mod gate;
mod lru;
mod stats;

pub use bounded::BoundedCache;
pub use gate::AccessGate;
pub use stats::CacheStats;
