//! Deposit authorization
//!
//! One `authorize` call walks a fixed sequence of states:
//!
//! ```text
//! ResolvingConfig -> Verifying -> Matching -> Hashing -> Signing -> Succeeded
//!        \               \            \           \          \
//!         +---------------+------------+-----------+----------+--> Failed(reason)
//! ```
//!
//! Calls share nothing but the read-only registry, so any number may run
//! concurrently. There is no retry and no internal timeout; callers own both.

use alloy::primitives::B256;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::error::AuthorizationError;
use crate::events::{decode_deposit, deposit_topic};
use crate::hash::compute_message_hash;
use crate::receipt::{verify_receipt, ChainReader, ReceiptStatus};
use crate::registry::ChainRegistry;
use crate::signer::AuthoritySigner;
use crate::types::{AssetKind, Authorization, AuthorizationResult, ErrorKind};

/// Parse a `0x`-prefixed 32-byte transaction hash
pub fn parse_tx_hash(tx: &str) -> Result<B256, AuthorizationError> {
    let invalid = || AuthorizationError::InvalidTransactionHash {
        tx_id: tx.to_string(),
    };

    let trimmed = tx.trim();
    if !trimmed.starts_with("0x") {
        return Err(invalid());
    }
    B256::from_str(trimmed).map_err(|_| invalid())
}

/// Verifies deposits and signs claim authorizations
pub struct AuthorizationService {
    registry: Arc<ChainRegistry>,
    reader: Arc<dyn ChainReader>,
    signer: AuthoritySigner,
}

impl AuthorizationService {
    pub fn new(
        registry: Arc<ChainRegistry>,
        reader: Arc<dyn ChainReader>,
        signer: AuthoritySigner,
    ) -> Self {
        Self {
            registry,
            reader,
            signer,
        }
    }

    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    pub fn signer(&self) -> &AuthoritySigner {
        &self.signer
    }

    /// Verify a deposit and, if it is final and genuine, sign its claim.
    ///
    /// Never fails: every error is reported as [`AuthorizationResult::Failure`].
    #[instrument(skip(self, kind), fields(kind = %kind))]
    pub async fn authorize(
        &self,
        tx: &str,
        from_chain_id: u64,
        kind: AssetKind,
    ) -> AuthorizationResult {
        match self.authorize_raw(tx, from_chain_id, kind).await {
            Ok(authorization) => {
                info!(
                    to_chain_id = authorization.chain_id,
                    to = %authorization.to,
                    token = %authorization.token,
                    "Deposit authorized"
                );
                AuthorizationResult::Success(authorization)
            }
            Err(e) => {
                match e.kind() {
                    ErrorKind::InsufficientConfirmations => info!(error = %e, "Deposit pending"),
                    ErrorKind::NetworkError | ErrorKind::SigningError => {
                        error!(error = %e, reason = %e.kind(), "Authorization failed")
                    }
                    _ => warn!(error = %e, reason = %e.kind(), "Authorization rejected"),
                }
                AuthorizationResult::Failure(e.into_failure())
            }
        }
    }

    /// [`AuthorizationService::authorize`] with the error left typed
    pub async fn authorize_raw(
        &self,
        tx: &str,
        from_chain_id: u64,
        kind: AssetKind,
    ) -> Result<Authorization, AuthorizationError> {
        let tx_hash = parse_tx_hash(tx)?;

        // ResolvingConfig
        let chain = self.registry.lookup(from_chain_id, kind)?;
        debug!(
            chain_id = from_chain_id,
            chain = %chain.config.name,
            bridge = %chain.bridge,
            depth = chain.config.confirmation_depth,
            "Chain resolved"
        );

        // Verifying
        let status = verify_receipt(
            self.reader.as_ref(),
            &chain.config.rpc_url,
            tx_hash,
            chain.config.confirmation_depth,
        )
        .await
        .map_err(|e| AuthorizationError::Network {
            chain_id: from_chain_id,
            message: format!("{:#}", e),
        })?;

        let receipt = match status {
            ReceiptStatus::Confirmed(receipt) => receipt,
            ReceiptStatus::NotFound => {
                return Err(AuthorizationError::TransactionNotFound {
                    tx_id: tx_hash.to_string(),
                    chain_id: from_chain_id,
                })
            }
            ReceiptStatus::Reverted => {
                return Err(AuthorizationError::TransactionReverted {
                    tx_id: tx_hash.to_string(),
                    chain_id: from_chain_id,
                })
            }
            ReceiptStatus::Pending {
                remaining,
                confirmations,
                required,
            } => {
                return Err(AuthorizationError::InsufficientConfirmations {
                    remaining,
                    confirmations,
                    required,
                })
            }
        };

        // Matching
        let record = decode_deposit(&receipt, deposit_topic(kind), chain.bridge, tx_hash, kind)?;

        // Hashing
        let digest = compute_message_hash(&record, &tx_hash, from_chain_id);
        debug!(digest = %digest, "Claim hash computed");

        // Signing
        let signature = self.signer.sign_blocking(digest).await?;

        let bridge = self.registry.bridge_for(record.to_chain_id, kind);
        if bridge.is_none() {
            warn!(
                to_chain_id = record.to_chain_id,
                "No destination bridge registered; authorization issued without one"
            );
        }

        Ok(Authorization {
            signature,
            token: record.to_token,
            value: record.value,
            to: record.sender,
            chain_id: record.to_chain_id,
            bridge,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::receipt::DepositReceipt;
    use crate::signer::{KeySource, SignerError};
    use alloy::signers::local::PrivateKeySigner;
    use async_trait::async_trait;

    const TX: &str = "0x7c5ea36004851c764c44143b1dcb59679b11c9a68e5f41497f6cf3d480715331";

    struct NoKey;

    impl KeySource for NoKey {
        fn unlock(&self) -> Result<PrivateKeySigner, SignerError> {
            Err(SignerError::MissingPassword)
        }
    }

    struct Unreachable;

    #[async_trait]
    impl ChainReader for Unreachable {
        async fn block_number(&self, _rpc_url: &str) -> eyre::Result<u64> {
            Err(eyre::eyre!("connection refused"))
        }

        async fn transaction_receipt(
            &self,
            _rpc_url: &str,
            _tx_hash: B256,
        ) -> eyre::Result<Option<DepositReceipt>> {
            Err(eyre::eyre!("connection refused"))
        }
    }

    fn service() -> AuthorizationService {
        AuthorizationService::new(
            Arc::new(ChainRegistry::builtin()),
            Arc::new(Unreachable),
            AuthoritySigner::new(Arc::new(NoKey)),
        )
    }

    #[test]
    fn test_parse_tx_hash() {
        assert!(parse_tx_hash(TX).is_ok());
        assert!(parse_tx_hash(&TX.to_uppercase().replacen("0X", "0x", 1)).is_ok());
        assert!(parse_tx_hash(&TX[2..]).is_err());
        assert!(parse_tx_hash("0x1234").is_err());
        assert!(parse_tx_hash("").is_err());
        assert!(parse_tx_hash("0xzz5ea36004851c764c44143b1dcb59679b11c9a68e5f41497f6cf3d480715331").is_err());
    }

    #[tokio::test]
    async fn test_invalid_hash_reported_before_lookup() {
        let result = service().authorize("nope", 999, AssetKind::Fungible).await;
        assert_eq!(result.reason(), Some(ErrorKind::InvalidTransactionHash));
    }

    #[tokio::test]
    async fn test_unsupported_chain() {
        let result = service().authorize(TX, 999, AssetKind::Fungible).await;
        assert_eq!(result.reason(), Some(ErrorKind::UnsupportedChain));
        assert_eq!(
            result.failure().unwrap().message,
            "No provider for chain ID: 999"
        );
    }

    #[tokio::test]
    async fn test_missing_bridge_checked_before_network() {
        let result = service().authorize(TX, 56, AssetKind::NonFungible).await;
        assert_eq!(result.reason(), Some(ErrorKind::MissingBridgeContract));
    }

    #[tokio::test]
    async fn test_network_error() {
        let err = service()
            .authorize_raw(TX, 5, AssetKind::Fungible)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkError);
        assert!(err.to_string().contains("connection refused"));
    }
}
