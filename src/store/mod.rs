//! Base stores the caches write back to.
//!
//! The store is an external collaborator: the caches own one, read through
//! it on a miss, and write dirty entries back to it when they leave the
//! cache. [`MemoryStore`] is the in-process reference implementation.

pub mod memory;
pub mod traits;

pub use memory::MemoryStore;
pub use traits::{BaseStore, StoreMetrics};
