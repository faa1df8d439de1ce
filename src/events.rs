//! Deposit event ABIs and log decoding
//!
//! The token bridge and the NFT bridge both emit an event named `Deposit`;
//! they differ only in the type of the third field (`uint256` amount vs
//! `uint256[]` token IDs), which gives each its own topic.

use alloy::primitives::{Address, B256, U256};
use alloy::sol_types::SolEvent;
use tracing::{debug, warn};

use crate::error::AuthorizationError;
use crate::receipt::{DepositReceipt, ReceiptLog};
use crate::types::{AssetKind, DepositRecord, DepositValue};

/// Token bridge event
pub mod fungible {
    use alloy::sol;

    sol! {
        /// `keccak256("Deposit(address,address,uint256,uint256,address)")`
        #[derive(Debug, PartialEq, Eq)]
        event Deposit(
            address indexed token,
            address indexed sender,
            uint256 value,
            uint256 toChainId,
            address toToken
        );
    }
}

/// NFT bridge event
pub mod non_fungible {
    use alloy::sol;

    sol! {
        /// `keccak256("Deposit(address,address,uint256[],uint256,address)")`
        #[derive(Debug, PartialEq, Eq)]
        event Deposit(
            address indexed token,
            address indexed sender,
            uint256[] tokens,
            uint256 toChainId,
            address toToken
        );
    }
}

/// Topic identifying the deposit event of an asset kind
pub fn deposit_topic(kind: AssetKind) -> B256 {
    match kind {
        AssetKind::Fungible => fungible::Deposit::SIGNATURE_HASH,
        AssetKind::NonFungible => non_fungible::Deposit::SIGNATURE_HASH,
    }
}

fn log_matches(log: &ReceiptLog, topic: B256, contract: Address, tx_hash: B256) -> bool {
    log.topics.first() == Some(&topic)
        && log.address == contract
        && log.transaction_hash == Some(tx_hash)
}

fn to_chain_id(value: U256, kind: AssetKind, log_index: usize) -> Result<u64, AuthorizationError> {
    u64::try_from(value).map_err(|_| AuthorizationError::Decode {
        kind,
        log_index,
        reason: format!("toChainId {} does not fit in u64", value),
    })
}

fn decode_log(
    log: &ReceiptLog,
    kind: AssetKind,
    log_index: usize,
) -> Result<DepositRecord, AuthorizationError> {
    let decode_err = |e: alloy::sol_types::Error| AuthorizationError::Decode {
        kind,
        log_index,
        reason: e.to_string(),
    };
    let topics = log.topics.iter().copied();

    match kind {
        AssetKind::Fungible => {
            let event =
                fungible::Deposit::decode_raw_log(topics, &log.data, true).map_err(decode_err)?;
            Ok(DepositRecord {
                token: event.token,
                sender: event.sender,
                value: DepositValue::Amount(event.value),
                to_chain_id: to_chain_id(event.toChainId, kind, log_index)?,
                to_token: event.toToken,
            })
        }
        AssetKind::NonFungible => {
            let event = non_fungible::Deposit::decode_raw_log(topics, &log.data, true)
                .map_err(decode_err)?;
            Ok(DepositRecord {
                token: event.token,
                sender: event.sender,
                value: DepositValue::TokenIds(event.tokens),
                to_chain_id: to_chain_id(event.toChainId, kind, log_index)?,
                to_token: event.toToken,
            })
        }
    }
}

/// Find and decode the deposit in a receipt.
///
/// A log matches when its first topic is `expected_topic`, it was emitted by
/// `expected_contract` and it belongs to `tx_hash`. The first match in log
/// order wins; later matches are reported and ignored.
pub fn decode_deposit(
    receipt: &DepositReceipt,
    expected_topic: B256,
    expected_contract: Address,
    tx_hash: B256,
    kind: AssetKind,
) -> Result<DepositRecord, AuthorizationError> {
    let mut matches = receipt
        .logs
        .iter()
        .enumerate()
        .filter(|(_, log)| log_matches(log, expected_topic, expected_contract, tx_hash));

    let (index, log) = matches
        .next()
        .ok_or_else(|| AuthorizationError::EventNotMatched {
            tx_id: tx_hash.to_string(),
            kind,
        })?;

    let extra = matches.count();
    if extra > 0 {
        warn!(
            tx_hash = %tx_hash,
            kind = %kind,
            used_log = index,
            ignored = extra,
            "Multiple deposit logs in one receipt, using the first"
        );
    }

    let record = decode_log(log, kind, index)?;

    debug!(
        tx_hash = %tx_hash,
        log_index = index,
        token = %record.token,
        sender = %record.sender,
        to_chain_id = record.to_chain_id,
        "Deposit event decoded"
    );

    Ok(record)
}
