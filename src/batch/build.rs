//! Batch Build Phase
//!
//! For each worker index `i`, builds one unsigned transaction that spends
//! exclusively from `gas[i]` and invokes the contract call for worker `i`,
//! then signs it offline. All workers run concurrently with no shared
//! mutable state; the phase completes only when every worker has finished
//! (join semantics, not first-N).

use std::sync::Arc;
use tracing::debug;

use crate::ledger::{ContractCall, TransactionBuilder, TxIntent};
use crate::retry::{RetryPolicy, with_retry};
use crate::signer::Identity;
use crate::types::SignedPayload;

/// Each worker's share of the total requested amount
///
/// Integer division truncates: the remainder `total % workers` is dropped,
/// not redistributed, so the sum of shares can be less than `total`. The
/// confirmed count is measured from change records, so the shortfall is
/// visible in the metrics rather than silently papered over.
pub fn per_worker_share(total: u64, workers: usize) -> u64 {
    if workers == 0 {
        return 0;
    }
    total / workers as u64
}

/// Build and sign one payload per worker, concurrently
///
/// # Arguments
/// * `identity` - signing identity; offline signing only
/// * `builder` - external transaction-construction primitive
/// * `gas` - fee-paying coins, one per worker, index-aligned with `calls`
/// * `calls` - contract call per worker; its length is the worker count
/// * `policy` - retry schedule for transient construction failures
///
/// # Returns
/// Index-aligned signed payloads. Transient build errors are retried per
/// worker under `policy`; a definitive (or exhausted) failure aborts the
/// phase, but only after every worker has settled, and always before
/// anything is submitted.
pub async fn build_all<B>(
    identity: Arc<Identity>,
    builder: Arc<B>,
    gas: Vec<crate::types::ObjectRef>,
    calls: Vec<ContractCall>,
    policy: RetryPolicy,
) -> anyhow::Result<Vec<SignedPayload>>
where
    B: TransactionBuilder + 'static,
{
    assert!(
        gas.len() >= calls.len(),
        "capacity invariant checked before the phase starts"
    );

    let mut handles = Vec::with_capacity(calls.len());
    for (worker, (gas_ref, call)) in gas.into_iter().zip(calls.into_iter()).enumerate() {
        let identity = identity.clone();
        let builder = builder.clone();
        let policy = policy.clone();
        handles.push(tokio::spawn(async move {
            let intent = TxIntent {
                sender: identity.address().clone(),
                gas: gas_ref.clone(),
                call,
            };
            let label = format!("worker {worker} build");
            let (tx_bytes, _) =
                with_retry(&policy, &label, || async { builder.build(&intent) }).await?;
            let signature = identity.sign_offline(&tx_bytes);
            debug!("worker {worker}: payload built and signed offline");
            Ok::<_, anyhow::Error>(SignedPayload {
                worker,
                tx_bytes,
                signature,
                gas: gas_ref,
            })
        }));
    }

    // Barrier: every build task settles before any error propagates, so no
    // sibling task is abandoned mid-build.
    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await?);
    }
    let mut payloads = Vec::with_capacity(results.len());
    for result in results {
        payloads.push(result?);
    }
    Ok(payloads)
}
