//! Core data types shared across the orchestrator.
//!
//! These model the ledger-facing vocabulary of the system: object references
//! (the `(id, version, digest)` triple the ledger uses to address mutable
//! state), decoded change records, signed payloads, and per-phase results.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Hex-encoded account address (`0x…`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(pub String);

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hex-encoded ledger object identifier (`0x…`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub String);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to a versioned ledger object
///
/// Every transaction that touches an object produces a new `(version, digest)`
/// pair; the ledger rejects references to stale pairs, so the orchestrator
/// must always track the latest triple for any object it spends from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub id: ObjectId,
    pub version: u64,
    pub digest: String,
}

/// Kind of effect a transaction had on one object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    Created,
    Mutated,
    Deleted,
}

/// Object type tag, decoded once at the ledger-client boundary
///
/// Internal logic pattern-matches on this closed set instead of comparing
/// raw type strings from the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectTag {
    /// The native fee-paying coin type
    GasCoin,
    /// A contract-managed supply manager (one per worker)
    SupplyManager,
    /// A domain object created by the mint entry point
    Minted,
    /// Anything else; carried for diagnostics only
    Other(String),
}

/// One decoded effect of a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub kind: ChangeKind,
    pub tag: ObjectTag,
    pub object: ObjectRef,
}

/// An already-serialized, already-signed transaction
///
/// Immutable once produced: transient submission failures retry the exact
/// same bytes, never a re-signed variant.
#[derive(Debug, Clone)]
pub struct SignedPayload {
    /// Worker index this payload belongs to
    pub worker: usize,
    /// Serialized unsigned transaction bytes
    pub tx_bytes: Vec<u8>,
    /// Detached signature over `tx_bytes`
    pub signature: Vec<u8>,
    /// The gas coin this payload spends from
    pub gas: ObjectRef,
}

/// Per-worker result cell, merged by the coordinator after the phase barrier
///
/// Each worker task owns its cell privately while running; no shared mutable
/// state exists between workers.
#[derive(Debug, Clone)]
pub struct WorkerReport {
    /// Domain objects confirmed created by this worker's transaction
    pub created: Vec<ObjectRef>,
    /// Domain objects confirmed deleted (burn phase)
    pub deleted: u64,
    /// The gas coin's refreshed reference after the transaction, if observed
    pub gas_after: Option<ObjectRef>,
    /// Submission attempts consumed (1 = first try succeeded)
    pub attempts: u32,
}

/// Identifies which phase of the chain produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Mint,
    Burn,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Mint => "mint",
            Phase::Burn => "burn",
        }
    }
}

/// Aggregate output of one build+submit round
///
/// `confirmed` is always derived from observed change records, never from the
/// requested amount: partial application or contract-side caps can make the
/// two differ.
#[derive(Debug, Clone)]
pub struct PhaseResult {
    pub phase: Phase,
    /// Units requested across all workers
    pub attempted: u64,
    /// Units confirmed by counting change records
    pub confirmed: u64,
    /// Wall-clock duration of the phase
    pub elapsed: Duration,
    /// Created object references, index order by worker (mint phase)
    pub created: Vec<ObjectRef>,
    /// Workers that failed definitively: (worker index, reason)
    pub failures: Vec<(usize, String)>,
    /// Refreshed gas refs per worker, `None` where the worker failed
    pub gas_after: Vec<Option<ObjectRef>>,
}

/// Errors raised by the orchestrator itself (as opposed to the ledger boundary)
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// Pool partitioning invariant violated before a phase started
    #[error("not enough gas coins: have {have}, need {need}; run `prepare` first")]
    InsufficientGasCoins { have: usize, need: usize },

    /// No supply managers found in the package deployment record
    #[error("no target objects discovered for package {0}")]
    NoTargets(ObjectId),

    /// Required configuration value missing at startup
    #[error("missing configuration: {0}")]
    MissingConfig(String),
}
