//! Signing Identity Module
//!
//! Derives the orchestrator's key pair from a BIP-39 seed phrase and exposes
//! address derivation, offline signing, and a combined sign-and-submit
//! convenience. The key material is immutable after derivation and never
//! persisted; offline signing is pure and safe to call from any number of
//! concurrent worker tasks.

mod identity;

pub use identity::{Identity, SeedError};
