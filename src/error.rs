//! Error types for deposit authorization
//!
//! Every failure of an `authorize` call is one of these variants. The service
//! folds them into `AuthorizationResult::Failure` so nothing escapes to the caller.

use thiserror::Error;

use crate::registry::RegistryError;
use crate::signer::SignerError;
use crate::types::{AssetKind, AuthorizationFailure, ErrorKind};

#[derive(Error, Debug)]
pub enum AuthorizationError {
    #[error("Invalid transaction hash: {tx_id}")]
    InvalidTransactionHash { tx_id: String },

    // ========================================================================
    // Configuration Errors
    // ========================================================================

    #[error("No provider for chain ID: {chain_id}")]
    UnsupportedChain { chain_id: u64 },

    #[error("No {kind} bridgeContract for chain ID: {chain_id}")]
    MissingBridgeContract { chain_id: u64, kind: AssetKind },

    // ========================================================================
    // Receipt Errors
    // ========================================================================

    #[error("Wrong transaction hash: {tx_id} (no receipt on chain {chain_id})")]
    TransactionNotFound { tx_id: String, chain_id: u64 },

    #[error("Transaction {tx_id} reverted on chain {chain_id}")]
    TransactionReverted { tx_id: String, chain_id: u64 },

    #[error("Confirming: {confirmations} of {required}")]
    InsufficientConfirmations {
        remaining: u64,
        confirmations: i64,
        required: u64,
    },

    // ========================================================================
    // Event Errors
    // ========================================================================

    #[error("Wrong transaction hash: {tx_id} (no {kind} deposit event from bridge)")]
    EventNotMatched { tx_id: String, kind: AssetKind },

    #[error("Malformed {kind} deposit log at index {log_index}: {reason}")]
    Decode {
        kind: AssetKind,
        log_index: usize,
        reason: String,
    },

    // ========================================================================
    // Infrastructure Errors
    // ========================================================================

    #[error("Signing failed: {0}")]
    Signing(#[from] SignerError),

    #[error("RPC request to chain {chain_id} failed: {message}")]
    Network { chain_id: u64, message: String },
}

impl AuthorizationError {
    /// Stable kind reported to callers
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthorizationError::InvalidTransactionHash { .. } => ErrorKind::InvalidTransactionHash,
            AuthorizationError::UnsupportedChain { .. } => ErrorKind::UnsupportedChain,
            AuthorizationError::MissingBridgeContract { .. } => ErrorKind::MissingBridgeContract,
            AuthorizationError::TransactionNotFound { .. } => ErrorKind::TransactionNotFound,
            AuthorizationError::TransactionReverted { .. } => ErrorKind::TransactionReverted,
            AuthorizationError::InsufficientConfirmations { .. } => {
                ErrorKind::InsufficientConfirmations
            }
            AuthorizationError::EventNotMatched { .. } => ErrorKind::EventNotMatched,
            AuthorizationError::Decode { .. } => ErrorKind::DecodeError,
            AuthorizationError::Signing(_) => ErrorKind::SigningError,
            AuthorizationError::Network { .. } => ErrorKind::NetworkError,
        }
    }

    /// Blocks still required before the deposit is final
    pub fn remaining_confirmations(&self) -> Option<u64> {
        match self {
            AuthorizationError::InsufficientConfirmations { remaining, .. } => Some(*remaining),
            _ => None,
        }
    }

    pub fn into_failure(self) -> AuthorizationFailure {
        AuthorizationFailure {
            reason: self.kind(),
            remaining: self.remaining_confirmations(),
            message: self.to_string(),
        }
    }
}

impl From<RegistryError> for AuthorizationError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnsupportedChain { chain_id } => {
                AuthorizationError::UnsupportedChain { chain_id }
            }
            RegistryError::MissingBridgeContract { chain_id, kind } => {
                AuthorizationError::MissingBridgeContract { chain_id, kind }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let err = AuthorizationError::UnsupportedChain { chain_id: 7 };
        assert_eq!(err.kind(), ErrorKind::UnsupportedChain);
        assert_eq!(err.to_string(), "No provider for chain ID: 7");

        let err = AuthorizationError::Decode {
            kind: AssetKind::NonFungible,
            log_index: 2,
            reason: "short data".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::DecodeError);
    }

    #[test]
    fn test_insufficient_confirmations_failure() {
        let failure = AuthorizationError::InsufficientConfirmations {
            remaining: 13,
            confirmations: 2,
            required: 15,
        }
        .into_failure();

        assert_eq!(failure.reason, ErrorKind::InsufficientConfirmations);
        assert_eq!(failure.remaining, Some(13));
        assert_eq!(failure.message, "Confirming: 2 of 15");
    }

    #[test]
    fn test_registry_error_conversion() {
        let err: AuthorizationError = RegistryError::MissingBridgeContract {
            chain_id: 42,
            kind: AssetKind::Fungible,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::MissingBridgeContract);
        assert!(err.to_string().contains("42"));
    }
}
