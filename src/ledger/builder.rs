use serde::Serialize;

use super::LedgerError;
use crate::types::{Address, ObjectId, ObjectRef};

/// Contract operation a transaction invokes
///
/// One parametrized intent type covers every transaction the orchestrator
/// issues; mint, burn and both pool-preparation steps differ only in which
/// variant they pick.
#[derive(Debug, Clone, Serialize)]
pub enum ContractCall {
    /// `batch_mint_to`: mint `amount` units from a supply manager
    Mint {
        manager: ObjectId,
        amount: u64,
        recipient: Address,
    },
    /// `batch_burn`: burn previously minted objects via a supply manager
    Burn {
        manager: ObjectId,
        objects: Vec<ObjectId>,
    },
    /// Merge fragment coins into the gas coin (pool preparation)
    MergeCoins { coins: Vec<ObjectId> },
    /// Split `count` coins of `amount_each` off the gas coin and transfer
    /// them back to the sender (pool preparation)
    SplitCoins { count: usize, amount_each: u64 },
}

/// Everything needed to build one unsigned transaction
#[derive(Debug, Clone, Serialize)]
pub struct TxIntent {
    pub sender: Address,
    /// The designated fee-paying coin; exclusive to one worker per phase
    pub gas: ObjectRef,
    pub call: ContractCall,
}

/// External transaction-construction primitive
///
/// Produces opaque, serializable unsigned bytes from an intent. Pure and
/// synchronous; any failure is a definitive (malformed-input) error.
pub trait TransactionBuilder: Send + Sync {
    fn build(&self, intent: &TxIntent) -> Result<Vec<u8>, LedgerError>;
}

/// Default builder: serializes the intent together with the fully-qualified
/// contract entry point
pub struct JsonTxBuilder {
    package_id: ObjectId,
}

impl JsonTxBuilder {
    pub fn new(package_id: ObjectId) -> Self {
        Self { package_id }
    }

    /// Fully-qualified entry point for a call, `package::module::function`
    fn target(&self, call: &ContractCall) -> String {
        let function = match call {
            ContractCall::Mint { .. } => "batch_mint_to",
            ContractCall::Burn { .. } => "batch_burn",
            ContractCall::MergeCoins { .. } => "merge_coins",
            ContractCall::SplitCoins { .. } => "split_coins",
        };
        format!("{}::mnft::{}", self.package_id, function)
    }
}

impl TransactionBuilder for JsonTxBuilder {
    fn build(&self, intent: &TxIntent) -> Result<Vec<u8>, LedgerError> {
        #[derive(Serialize)]
        struct Envelope<'a> {
            target: String,
            intent: &'a TxIntent,
        }
        let envelope = Envelope { target: self.target(&intent.call), intent };
        serde_json::to_vec(&envelope).map_err(|e| LedgerError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent(call: ContractCall) -> TxIntent {
        TxIntent {
            sender: Address("0xsender".into()),
            gas: ObjectRef {
                id: ObjectId("0xgas".into()),
                version: 7,
                digest: "d1".into(),
            },
            call,
        }
    }

    #[test]
    fn mint_target_is_fully_qualified() {
        let builder = JsonTxBuilder::new(ObjectId("0xpkg".into()));
        let bytes = builder
            .build(&intent(ContractCall::Mint {
                manager: ObjectId("0xmgr".into()),
                amount: 10,
                recipient: Address("0xrcpt".into()),
            }))
            .unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("0xpkg::mnft::batch_mint_to"));
    }

    #[test]
    fn identical_intents_build_identical_bytes() {
        let builder = JsonTxBuilder::new(ObjectId("0xpkg".into()));
        let call = ContractCall::SplitCoins { count: 3, amount_each: 100 };
        let a = builder.build(&intent(call.clone())).unwrap();
        let b = builder.build(&intent(call)).unwrap();
        assert_eq!(a, b);
    }
}
