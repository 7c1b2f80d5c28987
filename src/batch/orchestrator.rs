//! Phase Chain Coordinator
//!
//! Sequences the full run: target discovery, pool capacity check, Mint,
//! then Burn over the objects Mint created. Metrics and the created-object
//! listing are persisted after each phase, before the next one starts, so a
//! burn failure can never destroy mint's recorded results.
//!
//! # Worker-to-coin assignment
//! Burn reuses the mint phase's assignment by index: burn worker `i` spends
//! from the same coin mint worker `i` used, with the post-mint refreshed
//! reference. A worker whose mint failed (or that has no mint counterpart)
//! falls back to the coin's pre-mint reference from the pool listing.

use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::batch::{build_all, combined_all, per_worker_share, submit_all};
use crate::batch::submit::WorkerOutcome;
use crate::config::{Config, PipelineMode};
use crate::ledger::{ContractCall, LedgerClient, TransactionBuilder};
use crate::metrics::{MetricsWriter, ThroughputReport};
use crate::pool::{GasPoolManager, ensure_capacity};
use crate::signer::Identity;
use crate::types::{
    ChangeKind, ObjectId, ObjectRef, ObjectTag, OrchestratorError, Phase, PhaseResult,
};

/// Slice `items` into contiguous fixed-size groups, one per worker, in
/// index order (not round-robin); the final group may be shorter
pub fn partition_contiguous<T: Clone>(items: &[T], chunk: usize) -> Vec<Vec<T>> {
    if chunk == 0 {
        return Vec::new();
    }
    items.chunks(chunk).map(<[T]>::to_vec).collect()
}

/// Drives the prepare → mint → burn chain
pub struct Coordinator<L, B> {
    client: Arc<L>,
    builder: Arc<B>,
    identity: Arc<Identity>,
    config: Config,
    metrics: MetricsWriter,
}

impl<L, B> Coordinator<L, B>
where
    L: LedgerClient + 'static,
    B: TransactionBuilder + 'static,
{
    pub fn new(client: Arc<L>, builder: Arc<B>, identity: Arc<Identity>, config: Config) -> Self {
        let metrics = MetricsWriter::new(&config.output.directory);
        Self {
            client,
            builder,
            identity,
            config,
            metrics,
        }
    }

    fn pool(&self) -> GasPoolManager<L, B> {
        GasPoolManager::new(
            self.client.clone(),
            self.builder.clone(),
            self.identity.clone(),
            self.config.retry_policy(),
            self.config.run.coin_chunk,
        )
    }

    /// Discover the target supply managers
    ///
    /// Reads the package object's previous-transaction digest and filters
    /// that transaction's change records for created supply managers. The
    /// targets are immutable to this system once discovered.
    pub async fn discover_targets(&self) -> anyhow::Result<Vec<ObjectId>> {
        let package_id = self.config.package_id();
        let package = self.client.get_object(&package_id).await?;
        let digest = package
            .previous_transaction
            .ok_or_else(|| OrchestratorError::NoTargets(package_id.clone()))?;
        let changes = self.client.get_transaction(&digest).await?;

        let targets: Vec<ObjectId> = changes
            .into_iter()
            .filter(|c| c.kind == ChangeKind::Created && c.tag == ObjectTag::SupplyManager)
            .map(|c| c.object.id)
            .collect();
        if targets.is_empty() {
            return Err(OrchestratorError::NoTargets(package_id).into());
        }
        info!("discovered {} supply managers", targets.len());
        Ok(targets)
    }

    /// Reset the gas pool: merge fragments, then split one coin per target
    pub async fn prepare(&self) -> anyhow::Result<()> {
        let targets = self.discover_targets().await?;
        let pool = self.pool();

        info!("preparing gas coins");
        pool.merge_fragments().await?;
        pool.split_for_workers(targets.len(), self.config.run.split_amount)
            .await?;

        let coins = pool.list_all().await?;
        info!(
            "pool prepared: {} gas coins for {} targets",
            coins.len(),
            targets.len()
        );
        Ok(())
    }

    /// Run the full mint → burn chain
    ///
    /// The capacity invariant is checked before any work starts; violating
    /// it is fatal with no partial side effects.
    pub async fn run(&self) -> anyhow::Result<(PhaseResult, PhaseResult)> {
        let targets = self.discover_targets().await?;
        let gas = self.pool().list_all().await?;
        ensure_capacity(gas.len(), targets.len())?;

        // Mint: one worker per supply manager, each with its own coin.
        let workers = targets.len();
        let share = per_worker_share(self.config.run.total_amount, workers);
        let recipient = self.config.recipient();
        let mint_calls: Vec<ContractCall> = targets
            .iter()
            .map(|manager| ContractCall::Mint {
                manager: manager.clone(),
                amount: share,
                recipient: recipient.clone(),
            })
            .collect();
        let mint = self
            .run_phase(
                Phase::Mint,
                gas[..workers].to_vec(),
                mint_calls,
                share * workers as u64,
            )
            .await?;
        self.persist(&mint)?;

        // Burn: partition mint's creations into contiguous groups, one per
        // burn worker, in index order.
        let groups = partition_contiguous(&mint.created, self.config.run.burn_chunk);
        if groups.is_empty() {
            info!("nothing to burn, stopping after mint");
            let burn = empty_phase(Phase::Burn);
            self.persist(&burn)?;
            return Ok((mint, burn));
        }
        ensure_capacity(gas.len(), groups.len())?;

        let burn_gas: Vec<ObjectRef> = (0..groups.len())
            .map(|i| {
                mint.gas_after
                    .get(i)
                    .cloned()
                    .flatten()
                    .unwrap_or_else(|| gas[i].clone())
            })
            .collect();
        let burn_calls: Vec<ContractCall> = groups
            .iter()
            .enumerate()
            .map(|(i, group)| ContractCall::Burn {
                manager: targets[i % targets.len()].clone(),
                objects: group.iter().map(|r| r.id.clone()).collect(),
            })
            .collect();
        let burn = self
            .run_phase(Phase::Burn, burn_gas, burn_calls, mint.created.len() as u64)
            .await?;
        self.persist(&burn)?;

        Ok((mint, burn))
    }

    /// Run one build+submit round and aggregate worker outcomes
    async fn run_phase(
        &self,
        phase: Phase,
        gas: Vec<ObjectRef>,
        calls: Vec<ContractCall>,
        attempted: u64,
    ) -> anyhow::Result<PhaseResult> {
        let workers = calls.len();
        info!("{} phase starting with {workers} workers", phase.as_str());
        let started = Instant::now();

        let outcomes = match self.config.run.mode {
            PipelineMode::PreSign => {
                let payloads = build_all(
                    self.identity.clone(),
                    self.builder.clone(),
                    gas,
                    calls,
                    self.config.retry_policy(),
                )
                .await?;
                submit_all(self.client.clone(), payloads, self.config.retry_policy()).await
            }
            PipelineMode::Combined => {
                combined_all(
                    self.client.clone(),
                    self.builder.clone(),
                    self.identity.clone(),
                    gas,
                    calls,
                    self.config.retry_policy(),
                )
                .await
            }
        };

        Ok(aggregate(phase, workers, outcomes, attempted, started.elapsed()))
    }

    /// Persist a phase's durable artifacts and emit its summary
    ///
    /// Runs after every phase regardless of later phases' fate, and the
    /// summary is emitted even when some workers failed.
    fn persist(&self, result: &PhaseResult) -> anyhow::Result<()> {
        let report = ThroughputReport::new(result.confirmed, result.elapsed);
        self.metrics.write_phase(result.phase, &report)?;
        if result.phase == Phase::Mint {
            self.metrics.write_created_objects(&result.created)?;
        }

        info!(
            "{} phase done: attempted={} confirmed={} rate={:.1}/s elapsed={:.1}s",
            result.phase.as_str(),
            result.attempted,
            result.confirmed,
            report.rate,
            result.elapsed.as_secs_f64(),
        );
        for (worker, reason) in &result.failures {
            warn!("{} worker {worker} failed: {reason}", result.phase.as_str());
        }
        Ok(())
    }
}

/// Merge per-worker outcomes into one phase result after the barrier
fn aggregate(
    phase: Phase,
    workers: usize,
    outcomes: Vec<WorkerOutcome>,
    attempted: u64,
    elapsed: std::time::Duration,
) -> PhaseResult {
    let mut gas_after: Vec<Option<ObjectRef>> = vec![None; workers];
    let mut created = Vec::new();
    let mut deleted: u64 = 0;
    let mut failures = Vec::new();

    for (worker, outcome) in outcomes {
        match outcome {
            Ok(report) => {
                if let Some(slot) = gas_after.get_mut(worker) {
                    *slot = report.gas_after;
                }
                created.extend(report.created);
                deleted += report.deleted;
            }
            Err(reason) => failures.push((worker, reason)),
        }
    }

    let confirmed = match phase {
        Phase::Mint => created.len() as u64,
        Phase::Burn => deleted,
    };
    PhaseResult {
        phase,
        attempted,
        confirmed,
        elapsed,
        created,
        failures,
        gas_after,
    }
}

fn empty_phase(phase: Phase) -> PhaseResult {
    PhaseResult {
        phase,
        attempted: 0,
        confirmed: 0,
        elapsed: std::time::Duration::ZERO,
        created: Vec::new(),
        failures: Vec::new(),
        gas_after: Vec::new(),
    }
}
