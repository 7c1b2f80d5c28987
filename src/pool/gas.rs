use std::sync::Arc;
use tracing::{debug, info};

use crate::ledger::{ContractCall, LedgerClient, LedgerError, TransactionBuilder, TxIntent};
use crate::retry::{RetryPolicy, with_retry};
use crate::signer::Identity;
use crate::types::{ObjectRef, OrchestratorError};

/// Upper bound on coins fetched per query page
pub const PAGE_LIMIT: usize = 600;

/// Fatal pre-phase check: every worker needs its own fee-paying coin
pub fn ensure_capacity(have: usize, need: usize) -> Result<(), OrchestratorError> {
    if have < need {
        return Err(OrchestratorError::InsufficientGasCoins { have, need });
    }
    Ok(())
}

/// Discovers, merges and splits the fee-paying coin pool
///
/// Merge and split chunks all spend from one primary coin, whose
/// `(version, digest)` must advance between chunks. That makes both
/// operations strictly sequential by construction; they must not be
/// parallelized.
pub struct GasPoolManager<L, B> {
    client: Arc<L>,
    builder: Arc<B>,
    identity: Arc<Identity>,
    policy: RetryPolicy,
    /// Coins merged or split per transaction, bounded by transaction size limits
    coin_chunk: usize,
}

impl<L, B> GasPoolManager<L, B>
where
    L: LedgerClient,
    B: TransactionBuilder,
{
    pub fn new(
        client: Arc<L>,
        builder: Arc<B>,
        identity: Arc<Identity>,
        policy: RetryPolicy,
        coin_chunk: usize,
    ) -> Self {
        Self {
            client,
            builder,
            identity,
            policy,
            coin_chunk: coin_chunk.max(1),
        }
    }

    /// List every coin owned by the orchestrator's address
    ///
    /// Pages through the query API until `has_next_page` goes false; a
    /// single page is never assumed to suffice.
    pub async fn list_all(&self) -> Result<Vec<ObjectRef>, LedgerError> {
        let owner = self.identity.address();
        let mut coins = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self
                .client
                .list_owned_coins(owner, cursor.clone(), PAGE_LIMIT)
                .await?;
            coins.extend(page.coins);
            if !page.has_next_page {
                break;
            }
            cursor = page.next_cursor;
        }
        debug!("listed {} gas coins for {owner}", coins.len());
        Ok(coins)
    }

    /// Merge all fragment coins into the primary coin
    ///
    /// Reclaims fragmentation from earlier runs. Coins are merged in chunks
    /// of `coin_chunk`; each chunk blocks on confirmation and refreshes the
    /// primary coin's reference before the next chunk spends from it.
    pub async fn merge_fragments(&self) -> anyhow::Result<()> {
        let coins = self.list_all().await?;
        if coins.len() <= 1 {
            info!("nothing to merge: {} coin(s) in pool", coins.len());
            return Ok(());
        }

        let mut primary = coins[0].clone();
        let fragments: Vec<_> = coins[1..].iter().map(|c| c.id.clone()).collect();
        let chunk_total = fragments.len().div_ceil(self.coin_chunk);

        for (index, chunk) in fragments.chunks(self.coin_chunk).enumerate() {
            info!("merging gas coins {}/{}", index + 1, chunk_total);
            let intent = TxIntent {
                sender: self.identity.address().clone(),
                gas: primary.clone(),
                call: ContractCall::MergeCoins { coins: chunk.to_vec() },
            };
            primary = self.submit_and_refresh(&intent).await?;
        }
        Ok(())
    }

    /// Split `count` coins of `amount_each` off the primary coin
    ///
    /// Inverse of [`GasPoolManager::merge_fragments`], with the same chunked
    /// sequential protocol: each chunk spends from the primary coin, so its
    /// reference is refreshed from the ledger after every confirmed chunk.
    pub async fn split_for_workers(&self, count: usize, amount_each: u64) -> anyhow::Result<()> {
        let coins = self.list_all().await?;
        let Some(mut primary) = coins.first().cloned() else {
            return Err(OrchestratorError::InsufficientGasCoins { have: 0, need: 1 }.into());
        };

        let chunk_total = count.div_ceil(self.coin_chunk);
        let mut remaining = count;
        let mut index = 0;
        while remaining > 0 {
            index += 1;
            let batch = remaining.min(self.coin_chunk);
            info!("splitting gas coins {index}/{chunk_total}");
            let intent = TxIntent {
                sender: self.identity.address().clone(),
                gas: primary.clone(),
                call: ContractCall::SplitCoins { count: batch, amount_each },
            };
            primary = self.submit_and_refresh(&intent).await?;
            remaining -= batch;
        }
        Ok(())
    }

    /// Sign and submit one pool transaction, wait for inclusion, and return
    /// the primary coin's refreshed reference
    async fn submit_and_refresh(&self, intent: &TxIntent) -> anyhow::Result<ObjectRef> {
        let tx_bytes = self.builder.build(intent)?;
        let gas_id = intent.gas.id.clone();

        let (response, _) = with_retry(&self.policy, "pool submit", || {
            self.identity
                .sign_and_submit(self.client.as_ref(), 0, tx_bytes.clone(), intent.gas.clone())
        })
        .await?;

        self.client.wait_for_confirmation(&response.digest).await?;
        let info = self.client.get_object(&gas_id).await?;
        Ok(info.reference)
    }
}
