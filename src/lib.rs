//! Bridge Authority: deposit verification and claim authorization
//!
//! Given a deposit transaction on a source chain, confirms the deposit is
//! final and was emitted by the configured bridge contract, extracts its
//! parameters and signs the claim message the destination bridge verifies.
//!
//! - **Registry** - per-chain RPC endpoint, confirmation depth, bridge contracts
//! - **Receipt** - receipt fetching and finality checks
//! - **Events** - `Deposit` event ABIs and log decoding
//! - **Hash** - claim message hash matching the contract's `encodePacked` layout
//! - **Signer** - scoped keystore unlock and EIP-191 signing
//! - **Service** - the `authorize` operation

pub mod config;
pub mod error;
pub mod events;
pub mod hash;
pub mod receipt;
pub mod registry;
pub mod service;
pub mod signer;
pub mod types;

pub use config::Config;
pub use error::AuthorizationError;
pub use events::{decode_deposit, deposit_topic};
pub use hash::{compute_message_hash, keccak256};
pub use receipt::{
    check_confirmations, verify_receipt, ChainReader, Confirmation, DepositReceipt, ReceiptLog,
    ReceiptStatus, RpcChainReader,
};
pub use registry::{ChainConfig, ChainRegistry, RegistryError};
pub use service::AuthorizationService;
pub use signer::{recover_authority, AuthoritySigner, KeySource, KeystoreFile, SignerError};
pub use types::{
    AssetKind, Authorization, AuthorizationFailure, AuthorizationResult, DepositRecord,
    DepositValue, ErrorKind,
};
