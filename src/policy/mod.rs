//! Eviction policies.
//!
//! | Policy  | Victim                                   | Hit cost          |
//! |---------|------------------------------------------|-------------------|
//! | FIFO    | Oldest insertion                         | Lookup only       |
//! | LRU     | Least recently read or written           | Lookup + relink   |
//! | CLOCK   | First unreferenced entry from the cursor | Lookup + bit set  |
//!
//! All three share one resident-set implementation and the same
//! write-back rules; they differ only in how the victim is chosen.

pub mod clock;
pub mod fifo;
pub mod lru;

mod resident;

pub use clock::ClockCache;
pub use fifo::FifoCache;
pub use lru::LruCache;
