//! Batch Phase Module
//!
//! The three moving parts of a run:
//! - `build`: construct and offline-sign one transaction per worker,
//!   concurrently, index-aligned with the gas pool
//! - `submit`: push signed payloads to the ledger concurrently, retrying
//!   transient failures and scanning change records for confirmed effects
//! - `orchestrator`: chain the phases (prepare → mint → burn) and persist
//!   metrics between them

mod build;
mod orchestrator;
mod submit;

pub use build::{build_all, per_worker_share};
pub use orchestrator::{Coordinator, partition_contiguous};
pub use submit::{WorkerOutcome, combined_all, scan_changes, submit_all};
