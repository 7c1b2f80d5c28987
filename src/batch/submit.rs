//! Batch Submit Phase
//!
//! Pushes every worker's payload to the ledger concurrently. Transient
//! failures retry the identical payload under the configured policy;
//! definitive rejections are fatal for that worker only. Confirmed effects
//! are read from the returned change records, never from the requested
//! amounts.

use std::sync::Arc;
use tracing::warn;

use crate::ledger::{ContractCall, LedgerClient, TransactionBuilder, TxIntent};
use crate::retry::{RetryPolicy, with_retry};
use crate::signer::Identity;
use crate::types::{
    ChangeKind, ChangeRecord, ObjectId, ObjectRef, ObjectTag, SignedPayload, WorkerReport,
};

/// Per-worker outcome: a report on success, a reason string on definitive
/// failure or retry exhaustion
pub type WorkerOutcome = (usize, Result<WorkerReport, String>);

/// Extract this worker's confirmed effects from a transaction's change records
///
/// Only records attributable to the worker's own operation are counted:
/// - `Mutated` + `GasCoin` matching the worker's own coin gives the
///   refreshed gas reference
/// - `Created` + `Minted` counts as a confirmed creation; its identifier is
///   collected
/// - `Deleted` + `Minted` counts as a confirmed deletion
pub fn scan_changes(changes: &[ChangeRecord], gas_id: &ObjectId, attempts: u32) -> WorkerReport {
    let mut report = WorkerReport {
        created: Vec::new(),
        deleted: 0,
        gas_after: None,
        attempts,
    };
    for change in changes {
        match (change.kind, &change.tag) {
            (ChangeKind::Mutated, ObjectTag::GasCoin) if change.object.id == *gas_id => {
                report.gas_after = Some(change.object.clone());
            }
            (ChangeKind::Created, ObjectTag::Minted) => {
                report.created.push(change.object.clone());
            }
            (ChangeKind::Deleted, ObjectTag::Minted) => {
                report.deleted += 1;
            }
            _ => {}
        }
    }
    report
}

/// Submit all pre-signed payloads concurrently (pre-sign mode)
///
/// Each worker retries the exact same bytes on transient failure; the coin's
/// version only advances on success, and no coin is ever referenced by two
/// in-flight submissions. The returned vector is index-aligned with the
/// input payloads, one outcome per worker (join semantics: the phase ends
/// only when every worker has resolved).
pub async fn submit_all<L>(
    client: Arc<L>,
    payloads: Vec<SignedPayload>,
    policy: RetryPolicy,
) -> Vec<WorkerOutcome>
where
    L: LedgerClient + 'static,
{
    let mut handles = Vec::with_capacity(payloads.len());
    for payload in payloads {
        let client = client.clone();
        let policy = policy.clone();
        handles.push(tokio::spawn(async move {
            let worker = payload.worker;
            let gas_id = payload.gas.id.clone();
            let label = format!("worker {worker} submit");
            let outcome = match with_retry(&policy, &label, || client.submit(&payload)).await {
                Ok((response, attempts)) => Ok(scan_changes(&response.changes, &gas_id, attempts)),
                Err(e) => {
                    warn!("worker {worker} failed: {e}");
                    Err(e.to_string())
                }
            };
            (worker, outcome)
        }));
    }

    collect_outcomes(handles).await
}

/// Build, sign and submit per attempt (combined mode)
///
/// The simpler of the two pipeline modes: each attempt rebuilds the
/// transaction against the worker's gas reference and signs it fresh before
/// submitting. Record scanning and failure isolation match
/// [`submit_all`].
pub async fn combined_all<L, B>(
    client: Arc<L>,
    builder: Arc<B>,
    identity: Arc<Identity>,
    gas: Vec<ObjectRef>,
    calls: Vec<ContractCall>,
    policy: RetryPolicy,
) -> Vec<WorkerOutcome>
where
    L: LedgerClient + 'static,
    B: TransactionBuilder + 'static,
{
    let mut handles = Vec::with_capacity(calls.len());
    for (worker, (gas_ref, call)) in gas.into_iter().zip(calls.into_iter()).enumerate() {
        let client = client.clone();
        let builder = builder.clone();
        let identity = identity.clone();
        let policy = policy.clone();
        handles.push(tokio::spawn(async move {
            let gas_id = gas_ref.id.clone();
            let label = format!("worker {worker} sign-and-submit");
            let intent = TxIntent {
                sender: identity.address().clone(),
                gas: gas_ref.clone(),
                call,
            };
            let attempt = || async {
                let tx_bytes = builder.build(&intent)?;
                identity
                    .sign_and_submit(client.as_ref(), worker, tx_bytes, gas_ref.clone())
                    .await
            };
            let outcome = match with_retry(&policy, &label, attempt).await {
                Ok((response, attempts)) => Ok(scan_changes(&response.changes, &gas_id, attempts)),
                Err(e) => {
                    warn!("worker {worker} failed: {e}");
                    Err(e.to_string())
                }
            };
            (worker, outcome)
        }));
    }

    collect_outcomes(handles).await
}

/// Join every worker task; a panicked task is recorded as that worker's
/// failure instead of aborting the barrier
async fn collect_outcomes(
    handles: Vec<tokio::task::JoinHandle<WorkerOutcome>>,
) -> Vec<WorkerOutcome> {
    let mut outcomes = Vec::with_capacity(handles.len());
    for (index, handle) in handles.into_iter().enumerate() {
        match handle.await {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => outcomes.push((index, Err(format!("worker task panicked: {e}")))),
        }
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kind: ChangeKind, tag: ObjectTag, id: &str) -> ChangeRecord {
        ChangeRecord {
            kind,
            tag,
            object: ObjectRef {
                id: ObjectId(id.into()),
                version: 2,
                digest: "d2".into(),
            },
        }
    }

    #[test]
    fn scan_picks_own_gas_mutation_only() {
        let gas_id = ObjectId("0xgas".into());
        let changes = vec![
            record(ChangeKind::Mutated, ObjectTag::GasCoin, "0xother"),
            record(ChangeKind::Mutated, ObjectTag::GasCoin, "0xgas"),
            record(ChangeKind::Mutated, ObjectTag::SupplyManager, "0xmgr"),
        ];
        let report = scan_changes(&changes, &gas_id, 1);
        assert_eq!(report.gas_after.as_ref().unwrap().id, gas_id);
        assert_eq!(report.gas_after.as_ref().unwrap().version, 2);
    }

    #[test]
    fn scan_counts_domain_creations_and_deletions() {
        let gas_id = ObjectId("0xgas".into());
        let changes = vec![
            record(ChangeKind::Created, ObjectTag::Minted, "0xa"),
            record(ChangeKind::Created, ObjectTag::Minted, "0xb"),
            record(ChangeKind::Created, ObjectTag::Other("0x2::misc".into()), "0xc"),
            record(ChangeKind::Deleted, ObjectTag::Minted, "0xd"),
        ];
        let report = scan_changes(&changes, &gas_id, 3);
        assert_eq!(report.created.len(), 2);
        assert_eq!(report.deleted, 1);
        assert_eq!(report.attempts, 3);
    }
}
