//! Receipt fetching and finality checks
//!
//! A deposit is only trusted once its block is buried under the chain's
//! configured confirmation depth. Height and receipt are independent reads and
//! are fetched concurrently; there is no retry here, callers retry the whole
//! authorization later.

use alloy::primitives::{Address, Bytes, B256};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::types::{Log, TransactionReceipt};
use alloy::transports::http::{Client, Http};
use async_trait::async_trait;
use eyre::{eyre, Result};
use tracing::debug;

// ============================================================================
// Receipt Model
// ============================================================================

/// A log entry as returned in a transaction receipt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptLog {
    /// Emitting contract
    pub address: Address,
    /// topics[0] is the event signature for non-anonymous events
    pub topics: Vec<B256>,
    /// ABI-encoded non-indexed fields
    pub data: Bytes,
    pub transaction_hash: Option<B256>,
    pub log_index: Option<u64>,
}

impl From<&Log> for ReceiptLog {
    fn from(log: &Log) -> Self {
        Self {
            address: log.address(),
            topics: log.topics().to_vec(),
            data: log.data().data.clone(),
            transaction_hash: log.transaction_hash,
            log_index: log.log_index,
        }
    }
}

/// The parts of a transaction receipt deposit verification needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositReceipt {
    pub transaction_hash: B256,
    /// `None` while the transaction is not yet mined
    pub block_number: Option<u64>,
    /// Execution status (`false` = reverted)
    pub success: bool,
    pub logs: Vec<ReceiptLog>,
}

impl From<&TransactionReceipt> for DepositReceipt {
    fn from(receipt: &TransactionReceipt) -> Self {
        Self {
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            success: receipt.status(),
            logs: receipt.inner.logs().iter().map(ReceiptLog::from).collect(),
        }
    }
}

// ============================================================================
// Chain Reader
// ============================================================================

/// Read access to a chain node.
///
/// Every call names the endpoint, so one reader serves all configured chains
/// and holds no per-chain state.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Current block height
    async fn block_number(&self, rpc_url: &str) -> Result<u64>;

    /// Receipt of a transaction, `None` if the node does not know it
    async fn transaction_receipt(
        &self,
        rpc_url: &str,
        tx_hash: B256,
    ) -> Result<Option<DepositReceipt>>;
}

/// JSON-RPC reader backed by an alloy HTTP provider built per call
#[derive(Debug, Clone, Default)]
pub struct RpcChainReader;

impl RpcChainReader {
    pub fn new() -> Self {
        Self
    }

    fn provider(rpc_url: &str) -> Result<RootProvider<Http<Client>>> {
        Ok(ProviderBuilder::new().on_http(
            rpc_url
                .parse()
                .map_err(|e| eyre!("Invalid RPC URL: {}", e))?,
        ))
    }
}

#[async_trait]
impl ChainReader for RpcChainReader {
    async fn block_number(&self, rpc_url: &str) -> Result<u64> {
        let provider = Self::provider(rpc_url)?;
        let block = provider.get_block_number().await?;
        Ok(block)
    }

    async fn transaction_receipt(
        &self,
        rpc_url: &str,
        tx_hash: B256,
    ) -> Result<Option<DepositReceipt>> {
        let provider = Self::provider(rpc_url)?;
        let receipt = provider.get_transaction_receipt(tx_hash).await?;
        Ok(receipt.as_ref().map(DepositReceipt::from))
    }
}

// ============================================================================
// Finality
// ============================================================================

/// Result of comparing a receipt's block against the chain head
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// Buried deep enough
    Final { confirmations: u64 },
    /// Needs `remaining` more blocks
    Pending { remaining: u64, confirmations: i64 },
}

/// `remaining = depth - (current_height - receipt_block)`; pending while positive.
///
/// Signed arithmetic: a node whose head lags the receipt's block reports
/// negative confirmations instead of wrapping.
pub fn check_confirmations(current_height: u64, receipt_block: u64, depth: u64) -> Confirmation {
    let confirmations = current_height as i128 - receipt_block as i128;
    let remaining = depth as i128 - confirmations;

    if remaining > 0 {
        Confirmation::Pending {
            remaining: remaining as u64,
            confirmations: confirmations as i64,
        }
    } else {
        Confirmation::Final {
            confirmations: confirmations as u64,
        }
    }
}

/// Outcome of receipt verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptStatus {
    Confirmed(DepositReceipt),
    Pending {
        remaining: u64,
        confirmations: i64,
        required: u64,
    },
    NotFound,
    Reverted,
}

/// Fetch head and receipt, then decide whether the transaction is final.
///
/// `Err` is returned only for transport failures.
pub async fn verify_receipt(
    reader: &dyn ChainReader,
    rpc_url: &str,
    tx_hash: B256,
    confirmation_depth: u64,
) -> Result<ReceiptStatus> {
    let (current_height, receipt) = tokio::try_join!(
        reader.block_number(rpc_url),
        reader.transaction_receipt(rpc_url, tx_hash)
    )?;

    let receipt = match receipt {
        Some(r) => r,
        None => return Ok(ReceiptStatus::NotFound),
    };

    let receipt_block = match receipt.block_number {
        Some(b) => b,
        None => {
            debug!(tx_hash = %tx_hash, "Receipt has no block number yet");
            return Ok(ReceiptStatus::NotFound);
        }
    };

    if !receipt.success {
        return Ok(ReceiptStatus::Reverted);
    }

    match check_confirmations(current_height, receipt_block, confirmation_depth) {
        Confirmation::Pending {
            remaining,
            confirmations,
        } => {
            debug!(
                tx_hash = %tx_hash,
                current_height,
                receipt_block,
                remaining,
                "Deposit not final yet"
            );
            Ok(ReceiptStatus::Pending {
                remaining,
                confirmations,
                required: confirmation_depth,
            })
        }
        Confirmation::Final { confirmations } => {
            debug!(tx_hash = %tx_hash, confirmations, "Deposit final");
            Ok(ReceiptStatus::Confirmed(receipt))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
