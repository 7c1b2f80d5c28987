//! Batch orchestration for high-volume minting and burning of on-chain assets.
//!
//! The crate drives many concurrent signed transactions against a shared
//! ledger, each paid for by a dedicated gas coin so workers never contend on
//! a spending source. Phases chain prepare → mint → burn, with the objects
//! created by mint partitioned into the burn phase's per-worker inputs.

pub mod types; // Ledger-facing vocabulary: object refs, change records, payloads, phase results.
pub mod config; // TOML configuration and the seed-phrase environment contract.
pub mod retry; // Explicit retry policies with transient/definitive classification.
pub mod signer; // Key derivation, offline signing, sign-and-submit.
pub mod ledger; // Ledger client/builder traits, change-record decoding, JSON-RPC transport.
pub mod pool; // Gas coin discovery, merge and split.
pub mod batch; // Build phase, submit phase, and the phase chain coordinator.
pub mod metrics; // Durable throughput and created-object artifacts.

// Re-export commonly used types for easier access.
pub use batch::Coordinator;
pub use config::Config;
pub use types::*;
