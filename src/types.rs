//! Common types for deposit authorization
//!
//! Everything here is built fresh for a single `authorize` call and never
//! mutated afterwards.

use alloy::primitives::{Address, Bytes, U256};
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use std::fmt;

// ============================================================================
// Asset Kind
// ============================================================================

/// Which bridge path a deposit went through.
///
/// Each kind has its own deposit event, ABI and bridge contract table, so a
/// fungible request can never match a non-fungible log and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    #[default]
    Fungible,
    NonFungible,
}

impl AssetKind {
    /// Map the boolean `isNFT` request flag to an asset kind
    pub fn from_is_nft(is_nft: bool) -> Self {
        if is_nft {
            AssetKind::NonFungible
        } else {
            AssetKind::Fungible
        }
    }

    pub fn is_nft(&self) -> bool {
        matches!(self, AssetKind::NonFungible)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Fungible => "fungible",
            AssetKind::NonFungible => "non_fungible",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Deposit Record
// ============================================================================

/// What was locked on the source chain: an amount or a list of token IDs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepositValue {
    Amount(U256),
    TokenIds(Vec<U256>),
}

impl DepositValue {
    pub fn kind(&self) -> AssetKind {
        match self {
            DepositValue::Amount(_) => AssetKind::Fungible,
            DepositValue::TokenIds(_) => AssetKind::NonFungible,
        }
    }
}

/// Amounts and token IDs are serialized as decimal strings so that values
/// above 2^53 survive JSON consumers.
impl Serialize for DepositValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            DepositValue::Amount(value) => serializer.serialize_str(&value.to_string()),
            DepositValue::TokenIds(ids) => {
                let mut seq = serializer.serialize_seq(Some(ids.len()))?;
                for id in ids {
                    seq.serialize_element(&id.to_string())?;
                }
                seq.end()
            }
        }
    }
}

/// A deposit decoded from a bridge contract log.
///
/// `token` and `sender` come from the indexed topics; `value`, `to_chain_id`
/// and `to_token` come from the data payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositRecord {
    /// Token locked/burned on the source chain
    pub token: Address,
    /// Depositor, who is also the recipient on the destination chain
    pub sender: Address,
    /// Amount (fungible) or token IDs (non-fungible)
    pub value: DepositValue,
    /// Destination chain ID
    pub to_chain_id: u64,
    /// Token to receive on the destination chain
    pub to_token: Address,
}

impl DepositRecord {
    pub fn kind(&self) -> AssetKind {
        self.value.kind()
    }
}

// ============================================================================
// Authorization Result
// ============================================================================

/// Stable failure kinds reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    InvalidTransactionHash,
    UnsupportedChain,
    MissingBridgeContract,
    TransactionNotFound,
    TransactionReverted,
    InsufficientConfirmations,
    EventNotMatched,
    DecodeError,
    SigningError,
    NetworkError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidTransactionHash => "InvalidTransactionHash",
            ErrorKind::UnsupportedChain => "UnsupportedChain",
            ErrorKind::MissingBridgeContract => "MissingBridgeContract",
            ErrorKind::TransactionNotFound => "TransactionNotFound",
            ErrorKind::TransactionReverted => "TransactionReverted",
            ErrorKind::InsufficientConfirmations => "InsufficientConfirmations",
            ErrorKind::EventNotMatched => "EventNotMatched",
            ErrorKind::DecodeError => "DecodeError",
            ErrorKind::SigningError => "SigningError",
            ErrorKind::NetworkError => "NetworkError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Signed claim authorization for the destination chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Authorization {
    /// 65-byte `r || s || v` signature over the message hash
    pub signature: Bytes,
    /// Token to receive on the destination chain
    pub token: Address,
    /// Amount or token IDs to claim
    pub value: DepositValue,
    /// Receiver (the depositor)
    pub to: Address,
    /// Chain where the claim is made
    pub chain_id: u64,
    /// Bridge contract of the same asset kind on the destination chain.
    /// `None` when the registry has no such contract; it is not covered by the signature.
    pub bridge: Option<Address>,
}

/// Typed failure with a human-readable message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationFailure {
    pub reason: ErrorKind,
    pub message: String,
    /// Blocks still required, only set for `InsufficientConfirmations`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u64>,
}

/// Outcome of a single `authorize` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationResult {
    Success(Authorization),
    Failure(AuthorizationFailure),
}

impl AuthorizationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, AuthorizationResult::Success(_))
    }

    pub fn success(&self) -> Option<&Authorization> {
        match self {
            AuthorizationResult::Success(auth) => Some(auth),
            AuthorizationResult::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&AuthorizationFailure> {
        match self {
            AuthorizationResult::Success(_) => None,
            AuthorizationResult::Failure(failure) => Some(failure),
        }
    }

    /// Failure kind, if any
    pub fn reason(&self) -> Option<ErrorKind> {
        self.failure().map(|f| f.reason)
    }
}

/// Serializes as `{"isSuccess": bool, ...fields}`, the response shape
/// callers of the authority endpoint already consume.
impl Serialize for AuthorizationResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Tagged<'a, T: Serialize> {
            is_success: bool,
            #[serde(flatten)]
            body: &'a T,
        }

        match self {
            AuthorizationResult::Success(auth) => Tagged {
                is_success: true,
                body: auth,
            }
            .serialize(serializer),
            AuthorizationResult::Failure(failure) => Tagged {
                is_success: false,
                body: failure,
            }
            .serialize(serializer),
        }
    }
}
