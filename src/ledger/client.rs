use async_trait::async_trait;

use crate::retry::Classify;
use crate::types::{Address, ChangeRecord, ObjectId, ObjectRef, SignedPayload};

/// Errors from the ledger boundary
///
/// The variant determines retry behavior: `Transport` and `Timeout` are
/// transient and safe to retry with the same payload; everything else is
/// definitive and must break the retry loop.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    /// The ledger definitively rejected the request (invalid payload,
    /// stale object version, contract revert)
    #[error("rejected by ledger: {0}")]
    Rejected(String),

    #[error("object not found: {0}")]
    NotFound(ObjectId),

    #[error("malformed response: {0}")]
    Decode(String),
}

impl Classify for LedgerError {
    fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Transport(_) | LedgerError::Timeout(_))
    }
}

/// Object metadata returned by [`LedgerClient::get_object`]
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    pub reference: ObjectRef,
    /// Digest of the transaction that last touched this object
    pub previous_transaction: Option<String>,
}

/// One page of owned coins
#[derive(Debug, Clone)]
pub struct CoinPage {
    pub coins: Vec<ObjectRef>,
    pub next_cursor: Option<String>,
    pub has_next_page: bool,
}

/// Result of a successful submission
#[derive(Debug, Clone)]
pub struct SubmitResponse {
    pub digest: String,
    /// Decoded effects of the transaction
    pub changes: Vec<ChangeRecord>,
}

/// Query and submission primitives provided by the external ledger
///
/// The live implementation is [`super::JsonRpcLedger`]; tests substitute an
/// in-process mock that records consumed object versions.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Look up an object's current reference and previous transaction
    async fn get_object(&self, id: &ObjectId) -> Result<ObjectInfo, LedgerError>;

    /// Fetch the decoded change records of a committed transaction
    async fn get_transaction(&self, digest: &str) -> Result<Vec<ChangeRecord>, LedgerError>;

    /// List one page of coins owned by `owner`
    async fn list_owned_coins(
        &self,
        owner: &Address,
        cursor: Option<String>,
        limit: usize,
    ) -> Result<CoinPage, LedgerError>;

    /// Block until the transaction is confirmed (included and indexed)
    async fn wait_for_confirmation(&self, digest: &str) -> Result<(), LedgerError>;

    /// Submit a signed payload and observe its change records
    async fn submit(&self, payload: &SignedPayload) -> Result<SubmitResponse, LedgerError>;
}
