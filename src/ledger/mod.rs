//! Ledger Boundary Module
//!
//! Everything the orchestrator knows about the external ledger lives behind
//! the traits in this module:
//! - `LedgerClient`: query and submission primitives (object lookup, coin
//!   paging, transaction lookup, confirmation wait, submit)
//! - `TransactionBuilder`: turns a transaction intent into opaque unsigned
//!   bytes
//!
//! Raw wire responses are decoded into typed [`ChangeRecord`]s here, once,
//! so the rest of the crate pattern-matches on a closed tag set instead of
//! comparing type strings.

mod builder;
mod client;
mod records;
mod rpc;

pub use builder::{ContractCall, JsonTxBuilder, TransactionBuilder, TxIntent};
pub use client::{CoinPage, LedgerClient, LedgerError, ObjectInfo, SubmitResponse};
pub use records::decode_tag;
pub use rpc::JsonRpcLedger;
