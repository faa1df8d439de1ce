//! Chain registry: RPC endpoint, finality depth and bridge contracts per chain
//!
//! Loaded once at start (built-in table, optionally overridden from the
//! environment) and read-only afterwards. Lookups distinguish a chain with no
//! endpoint from a chain with no bridge contract for the requested asset kind.
//!
//! # Environment Variable Schema
//!
//! ```text
//! AUTHORITY_BUILTIN_CHAINS=true             # optional, start from the built-in table
//! AUTHORITY_CHAINS_COUNT=2                  # number of override entries
//! AUTHORITY_CHAIN_1_CHAIN_ID=31337          # native EVM chain ID
//! AUTHORITY_CHAIN_1_NAME=anvil              # optional
//! AUTHORITY_CHAIN_1_RPC_URL=http://localhost:8545   # required for new chains
//! AUTHORITY_CHAIN_1_CONFIRMATIONS=1         # optional, default 12 for new chains
//! AUTHORITY_CHAIN_1_BRIDGE_ADDRESS=0x...    # optional
//! AUTHORITY_CHAIN_1_NFT_BRIDGE_ADDRESS=0x...# optional
//! ```

use alloy::primitives::{address, Address};
use eyre::{eyre, Result, WrapErr};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

use crate::types::AssetKind;

/// Confirmation depth for chains added from the environment without one
pub const DEFAULT_CONFIRMATIONS: u64 = 12;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("No provider for chain ID: {chain_id}")]
    UnsupportedChain { chain_id: u64 },

    #[error("No {kind} bridge contract for chain ID: {chain_id}")]
    MissingBridgeContract { chain_id: u64, kind: AssetKind },
}

// ============================================================================
// URL Validation
// ============================================================================

/// Validates that a URL uses http/https and has a host component.
pub fn validate_rpc_url(url_str: &str, name: &str) -> Result<()> {
    let parsed =
        url::Url::parse(url_str).map_err(|e| eyre!("{} must be a valid URL: {}", name, e))?;

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(eyre!(
            "{} must use http:// or https:// scheme, got {}",
            name,
            scheme
        ));
    }

    if parsed.host_str().is_none() {
        return Err(eyre!("{} must have a host component", name));
    }

    if scheme == "http" {
        warn!("{} uses unencrypted http://; use https:// in production", name);
    }

    Ok(())
}

// ============================================================================
// Chain Configuration
// ============================================================================

/// Configuration for a single source/destination chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    /// Native EVM chain ID
    pub chain_id: u64,
    /// Human-readable name
    pub name: String,
    /// JSON-RPC endpoint
    pub rpc_url: String,
    /// Blocks required on top of the deposit block before it is final
    pub confirmation_depth: u64,
    /// Fungible token bridge
    pub bridge_contract: Option<Address>,
    /// NFT bridge
    pub nft_bridge_contract: Option<Address>,
}

impl ChainConfig {
    /// Bridge contract for an asset kind, if deployed on this chain
    pub fn bridge(&self, kind: AssetKind) -> Option<Address> {
        match kind {
            AssetKind::Fungible => self.bridge_contract,
            AssetKind::NonFungible => self.nft_bridge_contract,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.rpc_url.is_empty() {
            return Err(eyre!("RPC URL is empty for chain {}", self.chain_id));
        }
        validate_rpc_url(&self.rpc_url, &format!("chain {} RPC URL", self.chain_id))
    }
}

/// A chain resolved for one asset kind: the bridge is guaranteed present
#[derive(Debug, Clone, Copy)]
pub struct ResolvedChain<'a> {
    pub config: &'a ChainConfig,
    pub bridge: Address,
}

// ============================================================================
// Registry
// ============================================================================

/// Immutable chain table keyed by native chain ID
#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
    chains: HashMap<u64, ChainConfig>,
}

impl ChainRegistry {
    /// Build a registry from a list of chains, rejecting duplicates and bad URLs
    pub fn new(chains: Vec<ChainConfig>) -> Result<Self> {
        let mut map = HashMap::with_capacity(chains.len());
        for chain in chains {
            chain.validate()?;
            let chain_id = chain.chain_id;
            if map.insert(chain_id, chain).is_some() {
                return Err(eyre!("Duplicate chain ID: {}", chain_id));
            }
        }
        Ok(Self { chains: map })
    }

    /// The chains and bridges of the production deployment
    pub fn builtin() -> Self {
        let chains = builtin_chains()
            .into_iter()
            .map(|chain| (chain.chain_id, chain))
            .collect();
        Self { chains }
    }

    /// Resolve the endpoint, finality depth and bridge for a deposit on `chain_id`
    pub fn lookup(&self, chain_id: u64, kind: AssetKind) -> Result<ResolvedChain<'_>, RegistryError> {
        let config = self
            .chains
            .get(&chain_id)
            .ok_or(RegistryError::UnsupportedChain { chain_id })?;

        let bridge = config
            .bridge(kind)
            .ok_or(RegistryError::MissingBridgeContract { chain_id, kind })?;

        Ok(ResolvedChain { config, bridge })
    }

    /// Bridge of an asset kind on a chain, if known
    pub fn bridge_for(&self, chain_id: u64, kind: AssetKind) -> Option<Address> {
        self.chains.get(&chain_id).and_then(|c| c.bridge(kind))
    }

    pub fn get(&self, chain_id: u64) -> Option<&ChainConfig> {
        self.chains.get(&chain_id)
    }

    /// All chains ordered by chain ID
    pub fn chains(&self) -> Vec<&ChainConfig> {
        let ordered: BTreeMap<u64, &ChainConfig> =
            self.chains.iter().map(|(id, c)| (*id, c)).collect();
        ordered.into_values().collect()
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Apply overrides on top of this table.
    ///
    /// Existing chains keep any field the override leaves unset; new chains
    /// need an RPC URL.
    pub fn with_overrides(mut self, overrides: Vec<ChainOverride>) -> Result<Self> {
        for o in overrides {
            let chain = match self.chains.remove(&o.chain_id) {
                Some(mut existing) => {
                    if let Some(name) = o.name {
                        existing.name = name;
                    }
                    if let Some(rpc_url) = o.rpc_url {
                        existing.rpc_url = rpc_url;
                    }
                    if let Some(depth) = o.confirmation_depth {
                        existing.confirmation_depth = depth;
                    }
                    if o.bridge_contract.is_some() {
                        existing.bridge_contract = o.bridge_contract;
                    }
                    if o.nft_bridge_contract.is_some() {
                        existing.nft_bridge_contract = o.nft_bridge_contract;
                    }
                    existing
                }
                None => ChainConfig {
                    chain_id: o.chain_id,
                    name: o.name.unwrap_or_else(|| format!("chain_{}", o.chain_id)),
                    rpc_url: o.rpc_url.ok_or_else(|| {
                        eyre!("Chain {} is not built in and has no RPC URL", o.chain_id)
                    })?,
                    confirmation_depth: o.confirmation_depth.unwrap_or(DEFAULT_CONFIRMATIONS),
                    bridge_contract: o.bridge_contract,
                    nft_bridge_contract: o.nft_bridge_contract,
                },
            };

            chain.validate()?;
            debug!(
                chain_id = chain.chain_id,
                name = %chain.name,
                confirmations = chain.confirmation_depth,
                "Chain override applied"
            );
            self.chains.insert(chain.chain_id, chain);
        }
        Ok(self)
    }

    /// Load the registry from environment variables (see module docs)
    pub fn from_env() -> Result<Self> {
        let use_builtin = std::env::var("AUTHORITY_BUILTIN_CHAINS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(true);

        let base = if use_builtin {
            Self::builtin()
        } else {
            Self::default()
        };

        base.with_overrides(overrides_from_env()?)
    }
}

// ============================================================================
// Environment Overrides
// ============================================================================

/// Partial chain entry read from the environment
#[derive(Debug, Clone, Default)]
pub struct ChainOverride {
    pub chain_id: u64,
    pub name: Option<String>,
    pub rpc_url: Option<String>,
    pub confirmation_depth: Option<u64>,
    pub bridge_contract: Option<Address>,
    pub nft_bridge_contract: Option<Address>,
}

fn parse_address_var(var: &str) -> Result<Option<Address>> {
    match std::env::var(var) {
        Ok(s) if !s.trim().is_empty() => Address::from_str(s.trim())
            .map(Some)
            .wrap_err_with(|| format!("Invalid {}: expected 0x-prefixed 20-byte hex", var)),
        _ => Ok(None),
    }
}

/// Read `AUTHORITY_CHAIN_{N}_*` entries.
///
/// Returns an empty list when `AUTHORITY_CHAINS_COUNT` is unset or 0.
pub fn overrides_from_env() -> Result<Vec<ChainOverride>> {
    let count: usize = match std::env::var("AUTHORITY_CHAINS_COUNT") {
        Ok(s) => s
            .trim()
            .parse()
            .map_err(|_| eyre!("Invalid AUTHORITY_CHAINS_COUNT: must be a non-negative integer"))?,
        Err(_) => return Ok(Vec::new()),
    };

    let mut overrides = Vec::with_capacity(count);

    for i in 1..=count {
        let prefix = format!("AUTHORITY_CHAIN_{}", i);

        let chain_id: u64 = std::env::var(format!("{}_CHAIN_ID", prefix))
            .map_err(|_| eyre!("Missing {}_CHAIN_ID", prefix))?
            .trim()
            .parse()
            .map_err(|_| eyre!("Invalid {}_CHAIN_ID: must be a u64", prefix))?;

        let confirmation_depth = match std::env::var(format!("{}_CONFIRMATIONS", prefix)) {
            Ok(s) => Some(s.trim().parse::<u64>().map_err(|_| {
                eyre!("Invalid {}_CONFIRMATIONS: must be a non-negative integer", prefix)
            })?),
            Err(_) => None,
        };

        overrides.push(ChainOverride {
            chain_id,
            name: std::env::var(format!("{}_NAME", prefix)).ok(),
            rpc_url: std::env::var(format!("{}_RPC_URL", prefix)).ok(),
            confirmation_depth,
            bridge_contract: parse_address_var(&format!("{}_BRIDGE_ADDRESS", prefix))?,
            nft_bridge_contract: parse_address_var(&format!("{}_NFT_BRIDGE_ADDRESS", prefix))?,
        });
    }

    Ok(overrides)
}

// ============================================================================
// Built-in Chains
// ============================================================================

fn chain(
    chain_id: u64,
    name: &str,
    rpc_url: &str,
    confirmation_depth: u64,
    bridge_contract: Option<Address>,
    nft_bridge_contract: Option<Address>,
) -> ChainConfig {
    ChainConfig {
        chain_id,
        name: name.to_string(),
        rpc_url: rpc_url.to_string(),
        confirmation_depth,
        bridge_contract,
        nft_bridge_contract,
    }
}

fn builtin_chains() -> Vec<ChainConfig> {
    vec![
        chain(
            1,
            "ethereum",
            "https://rpc.ankr.com/eth",
            4,
            Some(address!("C30B6B57BEC9020a95e0a6CF275b43CC00C9d3f0")),
            None,
        ),
        chain(
            5,
            "goerli",
            "https://rpc.ankr.com/eth_goerli",
            1,
            Some(address!("2f30cf73b5e4E4f79f6aEE1A5871f5E29c1caE98")),
            Some(address!("4b5981260f634F010210267966b2D992ea6271C7")),
        ),
        // Endpoint only: no bridge deployed, every request fails with MissingBridgeContract
        chain(42, "kovan", "https://kovan.poa.network", 1, None, None),
        chain(
            56,
            "bsc",
            "https://bsc-dataseed1.ninicoin.io",
            15,
            Some(address!("C9AA9aa98563c2f1AA66804E1EFa0f07A807321C")),
            None,
        ),
        chain(
            97,
            "bsc-testnet",
            "https://bsctestapi.terminet.io/rpc",
            1,
            Some(address!("fa581215b134E5623830E44cE1E37Fb9830dD412")),
            None,
        ),
        chain(
            256,
            "heco-testnet",
            "https://http-testnet.hecochain.com",
            3,
            Some(address!("Cee23c02B819e4B9b6E34753e3c0C7f21c4bC398")),
            None,
        ),
        chain(
            568,
            "dogechain-testnet",
            "https://rpc-testnet.dogechain.dog",
            1,
            Some(address!("290B5c5587B78C9bf3d9e5D7f1703749037CbE22")),
            None,
        ),
        chain(
            2000,
            "dogechain",
            "https://rpc.dogechain.dog",
            3,
            Some(address!("403bc08DdE4272b91D31155E6905575dd3c1f283")),
            None,
        ),
        chain(
            8453,
            "base",
            "https://mainnet.base.org",
            1,
            None,
            Some(address!("C30B6B57BEC9020a95e0a6CF275b43CC00C9d3f0")),
        ),
        chain(
            10000,
            "smartbch",
            "https://rpc.smartbch.org",
            2,
            Some(address!("1336001CBdb94C5cf95ee93F2dC3CA99Db382Ff4")),
            Some(address!("746B3078284e33Be5eBDb6f3Ac068FC2fAb91c00")),
        ),
        chain(
            84531,
            "base-goerli",
            "https://goerli.base.org",
            1,
            None,
            Some(address!("746B3078284e33Be5eBDb6f3Ac068FC2fAb91c00")),
        ),
    ]
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn test_bridge_address() -> Address {
        address!("5FbDB2315678afecb367f032d93F642f64180aa3")
    }

    fn make_chain(chain_id: u64) -> ChainConfig {
        ChainConfig {
            chain_id,
            name: format!("anvil_{}", chain_id),
            rpc_url: "http://localhost:8545".to_string(),
            confirmation_depth: 1,
            bridge_contract: Some(test_bridge_address()),
            nft_bridge_contract: None,
        }
    }

    fn clear_env() {
        for key in [
            "AUTHORITY_BUILTIN_CHAINS",
            "AUTHORITY_CHAINS_COUNT",
            "AUTHORITY_CHAIN_1_CHAIN_ID",
            "AUTHORITY_CHAIN_1_NAME",
            "AUTHORITY_CHAIN_1_RPC_URL",
            "AUTHORITY_CHAIN_1_CONFIRMATIONS",
            "AUTHORITY_CHAIN_1_BRIDGE_ADDRESS",
            "AUTHORITY_CHAIN_1_NFT_BRIDGE_ADDRESS",
            "AUTHORITY_CHAIN_2_CHAIN_ID",
            "AUTHORITY_CHAIN_2_RPC_URL",
            "AUTHORITY_CHAIN_2_CONFIRMATIONS",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_lookup_unsupported_chain() {
        let registry = ChainRegistry::builtin();
        let err = registry.lookup(999_999, AssetKind::Fungible).unwrap_err();
        assert_eq!(err, RegistryError::UnsupportedChain { chain_id: 999_999 });
    }

    #[test]
    fn test_lookup_missing_bridge_for_kind() {
        let registry = ChainRegistry::builtin();

        // BSC has a token bridge but no NFT bridge
        assert!(registry.lookup(56, AssetKind::Fungible).is_ok());
        let err = registry.lookup(56, AssetKind::NonFungible).unwrap_err();
        assert_eq!(
            err,
            RegistryError::MissingBridgeContract {
                chain_id: 56,
                kind: AssetKind::NonFungible
            }
        );

        // Base has only the NFT bridge
        assert!(registry.lookup(8453, AssetKind::NonFungible).is_ok());
        assert!(matches!(
            registry.lookup(8453, AssetKind::Fungible),
            Err(RegistryError::MissingBridgeContract { .. })
        ));

        // Kovan has an endpoint and nothing else
        assert!(matches!(
            registry.lookup(42, AssetKind::Fungible),
            Err(RegistryError::MissingBridgeContract { .. })
        ));
    }

    #[test]
    fn test_builtin_goerli_tables_are_disjoint() {
        let registry = ChainRegistry::builtin();
        let token = registry.lookup(5, AssetKind::Fungible).unwrap();
        let nft = registry.lookup(5, AssetKind::NonFungible).unwrap();

        assert_eq!(token.config.confirmation_depth, 1);
        assert_eq!(
            token.bridge,
            address!("2f30cf73b5e4E4f79f6aEE1A5871f5E29c1caE98")
        );
        assert_eq!(nft.bridge, address!("4b5981260f634F010210267966b2D992ea6271C7"));
        assert_ne!(token.bridge, nft.bridge);
    }

    #[test]
    fn test_builtin_confirmation_depths() {
        let registry = ChainRegistry::builtin();
        assert_eq!(registry.get(1).unwrap().confirmation_depth, 4);
        assert_eq!(registry.get(56).unwrap().confirmation_depth, 15);
        assert_eq!(registry.get(10000).unwrap().confirmation_depth, 2);
        assert_eq!(registry.len(), 11);
    }

    #[test]
    fn test_chains_sorted() {
        let registry = ChainRegistry::builtin();
        let ids: Vec<u64> = registry.chains().iter().map(|c| c.chain_id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_new_rejects_duplicates() {
        let result = ChainRegistry::new(vec![make_chain(31337), make_chain(31337)]);
        assert!(result.unwrap_err().to_string().contains("Duplicate"));
    }

    #[test]
    fn test_new_rejects_bad_url() {
        let mut chain = make_chain(31337);
        chain.rpc_url = "ws://localhost:8546".to_string();
        assert!(ChainRegistry::new(vec![chain]).is_err());
    }

    #[test]
    fn test_validate_rpc_url() {
        assert!(validate_rpc_url("https://rpc.ankr.com/eth", "test").is_ok());
        assert!(validate_rpc_url("http://localhost:8545", "test").is_ok());
        assert!(validate_rpc_url("not a url", "test").is_err());
        assert!(validate_rpc_url("ftp://example.com", "test").is_err());
    }

    #[test]
    fn test_override_existing_keeps_unset_fields() {
        let registry = ChainRegistry::builtin()
            .with_overrides(vec![ChainOverride {
                chain_id: 56,
                rpc_url: Some("https://bsc.example.org".to_string()),
                ..Default::default()
            }])
            .unwrap();

        let bsc = registry.get(56).unwrap();
        assert_eq!(bsc.rpc_url, "https://bsc.example.org");
        assert_eq!(bsc.confirmation_depth, 15);
        assert_eq!(
            bsc.bridge_contract,
            Some(address!("C9AA9aa98563c2f1AA66804E1EFa0f07A807321C"))
        );
    }

    #[test]
    fn test_override_new_chain_requires_rpc_url() {
        let result = ChainRegistry::default().with_overrides(vec![ChainOverride {
            chain_id: 31337,
            ..Default::default()
        }]);
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_adds_chain() {
        clear_env();
        std::env::set_var("AUTHORITY_BUILTIN_CHAINS", "false");
        std::env::set_var("AUTHORITY_CHAINS_COUNT", "1");
        std::env::set_var("AUTHORITY_CHAIN_1_CHAIN_ID", "31337");
        std::env::set_var("AUTHORITY_CHAIN_1_RPC_URL", "http://localhost:8545");
        std::env::set_var("AUTHORITY_CHAIN_1_CONFIRMATIONS", "0");
        std::env::set_var(
            "AUTHORITY_CHAIN_1_BRIDGE_ADDRESS",
            "0x5FbDB2315678afecb367f032d93F642f64180aa3",
        );

        let registry = ChainRegistry::from_env().unwrap();
        clear_env();

        assert_eq!(registry.len(), 1);
        let anvil = registry.lookup(31337, AssetKind::Fungible).unwrap();
        assert_eq!(anvil.config.confirmation_depth, 0);
        assert_eq!(anvil.config.name, "chain_31337");
        assert_eq!(anvil.bridge, test_bridge_address());
    }

    #[test]
    #[serial]
    fn test_from_env_defaults_to_builtin() {
        clear_env();
        let registry = ChainRegistry::from_env().unwrap();
        assert_eq!(registry.len(), ChainRegistry::builtin().len());
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_invalid_confirmations() {
        clear_env();
        std::env::set_var("AUTHORITY_CHAINS_COUNT", "1");
        std::env::set_var("AUTHORITY_CHAIN_1_CHAIN_ID", "5");
        std::env::set_var("AUTHORITY_CHAIN_1_CONFIRMATIONS", "-3");

        let result = ChainRegistry::from_env();
        clear_env();

        assert!(result
            .unwrap_err()
            .to_string()
            .contains("AUTHORITY_CHAIN_1_CONFIRMATIONS"));
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_invalid_address() {
        clear_env();
        std::env::set_var("AUTHORITY_CHAINS_COUNT", "1");
        std::env::set_var("AUTHORITY_CHAIN_1_CHAIN_ID", "5");
        std::env::set_var("AUTHORITY_CHAIN_1_NFT_BRIDGE_ADDRESS", "0x1234");

        let result = ChainRegistry::from_env();
        clear_env();

        assert!(result.is_err());
    }
}
