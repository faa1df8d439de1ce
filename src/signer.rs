//! Authority signing
//!
//! The authority key never lives in long-lived state. A [`KeySource`] hands
//! out a freshly unlocked key for one signing call; the key is dropped (and
//! zeroized by `k256`) before the signature is returned.
//!
//! Signatures are EIP-191 personal-message signatures over the 32 bytes of
//! the claim hash, encoded as 65 bytes `r || s || v` with `v` in {27, 28},
//! which is what the destination bridge's `ecrecover` path expects.

use alloy::primitives::{Address, Bytes, PrimitiveSignature, B256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum SignerError {
    #[error("Keystore password is not configured")]
    MissingPassword,

    #[error("Failed to unlock keystore {path}: {message}")]
    Keystore { path: String, message: String },

    #[error("Failed to sign message: {0}")]
    Signature(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Signing task failed: {0}")]
    Task(String),
}

/// Scoped access to the authority's private key
pub trait KeySource: Send + Sync {
    /// Unlock the key for a single use. The caller must drop it promptly.
    fn unlock(&self) -> Result<PrivateKeySigner, SignerError>;
}

// ============================================================================
// Encrypted Keystore
// ============================================================================

/// Web3 secret-storage (V3) keystore file protected by a password
#[derive(Clone)]
pub struct KeystoreFile {
    path: PathBuf,
    password: Option<String>,
}

/// Custom Debug that redacts the password to prevent accidental log leakage.
impl fmt::Debug for KeystoreFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeystoreFile")
            .field("path", &self.path)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl KeystoreFile {
    pub fn new(path: impl Into<PathBuf>, password: Option<String>) -> Self {
        Self {
            path: path.into(),
            password,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeySource for KeystoreFile {
    fn unlock(&self) -> Result<PrivateKeySigner, SignerError> {
        let password = self.password.as_ref().ok_or(SignerError::MissingPassword)?;

        PrivateKeySigner::decrypt_keystore(&self.path, password).map_err(|e| {
            SignerError::Keystore {
                path: self.path.display().to_string(),
                message: e.to_string(),
            }
        })
    }
}

// ============================================================================
// Authority Signer
// ============================================================================

/// Signs claim hashes with the authority key
#[derive(Clone)]
pub struct AuthoritySigner {
    keys: Arc<dyn KeySource>,
}

impl fmt::Debug for AuthoritySigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthoritySigner")
            .field("keys", &"<redacted>")
            .finish()
    }
}

impl AuthoritySigner {
    pub fn new(keys: Arc<dyn KeySource>) -> Self {
        Self { keys }
    }

    /// Sign a claim hash.
    ///
    /// Unlocking an encrypted keystore runs scrypt; call this from a blocking
    /// context (see [`AuthoritySigner::sign_blocking`]).
    pub fn sign(&self, digest: B256) -> Result<Bytes, SignerError> {
        let key = self.keys.unlock()?;
        let signature = key
            .sign_message_sync(digest.as_slice())
            .map_err(|e| SignerError::Signature(e.to_string()))?;
        drop(key);

        debug!("Claim hash signed");
        Ok(Bytes::from(signature.as_bytes().to_vec()))
    }

    /// [`AuthoritySigner::sign`] on the blocking thread pool
    pub async fn sign_blocking(&self, digest: B256) -> Result<Bytes, SignerError> {
        let signer = self.clone();
        tokio::task::spawn_blocking(move || signer.sign(digest))
            .await
            .map_err(|e| SignerError::Task(e.to_string()))?
    }

    /// Public address of the authority key
    pub fn address(&self) -> Result<Address, SignerError> {
        let key = self.keys.unlock()?;
        Ok(key.address())
    }
}

/// Recover the address that produced `signature` over `digest`
pub fn recover_authority(digest: B256, signature: &[u8]) -> Result<Address, SignerError> {
    let signature = PrimitiveSignature::try_from(signature)
        .map_err(|e| SignerError::InvalidSignature(e.to_string()))?;
    signature
        .recover_address_from_msg(digest.as_slice())
        .map_err(|e| SignerError::InvalidSignature(e.to_string()))
}
