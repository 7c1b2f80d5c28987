//! Gas Pool Module
//!
//! Manages the pool of fee-paying coins: discovery (cursor-paged listing),
//! defragmentation (merge), and fan-out (split) so that the next phase has
//! at least one independent coin per worker.

mod gas;

pub use gas::{GasPoolManager, PAGE_LIMIT, ensure_capacity};
