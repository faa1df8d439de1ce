//! Claim message hash computation
//!
//! The destination bridge rebuilds this hash from the claim parameters and
//! checks the authority's signature against it, so the layout must match the
//! contract byte for byte.
//!
//! ## Layout
//!
//! `keccak256(abi.encodePacked(...))` over:
//!
//! | field         | fungible   | non-fungible                    |
//! |---------------|------------|---------------------------------|
//! | `toToken`     | address    | address                         |
//! | `sender`      | address    | address                         |
//! | value         | uint256    | uint256[] (each element 32 bytes) |
//! | `txId`        | bytes32    | bytes32                         |
//! | `fromChainId` | uint256    | uint256                         |
//! | `toChainId`   | uint256    | uint256                         |
//!
//! Addresses are packed as 20 bytes, everything else as 32-byte big-endian words.

use alloy::primitives::{B256, U256};
use tiny_keccak::{Hasher, Keccak};

use crate::types::{DepositRecord, DepositValue};

/// Compute keccak256 hash of data
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

/// Packed encoding of the claim parameters
pub fn encode_message(record: &DepositRecord, tx_hash: &B256, from_chain_id: u64) -> Vec<u8> {
    let words = match &record.value {
        DepositValue::Amount(_) => 1,
        DepositValue::TokenIds(ids) => ids.len(),
    };
    let mut data = Vec::with_capacity(20 + 20 + 32 * (words + 3));

    // toToken (20 bytes)
    data.extend_from_slice(record.to_token.as_slice());

    // sender (20 bytes)
    data.extend_from_slice(record.sender.as_slice());

    // value: one uint256, or every token ID padded to 32 bytes
    match &record.value {
        DepositValue::Amount(amount) => data.extend_from_slice(&amount.to_be_bytes::<32>()),
        DepositValue::TokenIds(ids) => {
            for id in ids {
                data.extend_from_slice(&id.to_be_bytes::<32>());
            }
        }
    }

    // txId (bytes32)
    data.extend_from_slice(tx_hash.as_slice());

    // fromChainId, toChainId (uint256)
    data.extend_from_slice(&U256::from(from_chain_id).to_be_bytes::<32>());
    data.extend_from_slice(&U256::from(record.to_chain_id).to_be_bytes::<32>());

    data
}

/// Hash the authority signs for a deposit
pub fn compute_message_hash(record: &DepositRecord, tx_hash: &B256, from_chain_id: u64) -> B256 {
    B256::from(keccak256(&encode_message(record, tx_hash, from_chain_id)))
}

/// Convert bytes to hex string with 0x prefix
pub fn bytes32_to_hex(bytes: &[u8; 32]) -> String {
    format!("0x{}", hex::encode(bytes))
}
