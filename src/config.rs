//! Authority configuration

use eyre::{Result, WrapErr};
use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::registry::ChainRegistry;
use crate::signer::KeystoreFile;

/// Keystore written by the provisioning step
pub const DEFAULT_KEYSTORE_PATH: &str = ".keystore.json";

/// Authority configuration, loaded once at start
#[derive(Clone)]
pub struct Config {
    /// Encrypted authority key (web3 secret-storage V3)
    pub keystore_path: PathBuf,
    /// Keystore password. Required only by operations that sign.
    pub keystore_password: Option<String>,
    /// Chains, endpoints and bridge contracts
    pub registry: ChainRegistry,
}

/// Custom Debug that redacts the keystore password to prevent accidental log leakage.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("keystore_path", &self.keystore_path)
            .field(
                "keystore_password",
                &self.keystore_password.as_ref().map(|_| "<redacted>"),
            )
            .field("chains", &self.registry.len())
            .finish()
    }
}

impl Config {
    /// Load configuration from `.env` (if present) and the environment
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded .env from {:?}", path);
        }

        Self::from_env()
    }

    /// Load configuration from the process environment only
    pub fn from_env() -> Result<Self> {
        let keystore_path = env::var("AUTHORITY_KEYSTORE_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_KEYSTORE_PATH));

        // PW is the name the deployment scripts already export
        let keystore_password = env::var("PW")
            .or_else(|_| env::var("AUTHORITY_KEYSTORE_PASSWORD"))
            .ok()
            .filter(|s| !s.is_empty());

        let registry = ChainRegistry::from_env().wrap_err("Invalid chain configuration")?;

        Ok(Self {
            keystore_path,
            keystore_password,
            registry,
        })
    }

    /// Key source backed by the configured keystore
    pub fn keystore(&self) -> KeystoreFile {
        KeystoreFile::new(&self.keystore_path, self.keystore_password.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "PW",
            "AUTHORITY_KEYSTORE_PASSWORD",
            "AUTHORITY_KEYSTORE_PATH",
            "AUTHORITY_BUILTIN_CHAINS",
            "AUTHORITY_CHAINS_COUNT",
            "AUTHORITY_CHAIN_1_CHAIN_ID",
            "AUTHORITY_CHAIN_1_RPC_URL",
            "AUTHORITY_CHAIN_1_CONFIRMATIONS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = Config::from_env().unwrap();
        assert_eq!(config.keystore_path, PathBuf::from(DEFAULT_KEYSTORE_PATH));
        assert!(config.keystore_password.is_none());
        assert_eq!(config.registry.len(), ChainRegistry::builtin().len());
    }

    #[test]
    #[serial]
    fn test_password_alias() {
        clear_env();
        env::set_var("AUTHORITY_KEYSTORE_PASSWORD", "alias");
        assert_eq!(
            Config::from_env().unwrap().keystore_password.as_deref(),
            Some("alias")
        );

        env::set_var("PW", "primary");
        assert_eq!(
            Config::from_env().unwrap().keystore_password.as_deref(),
            Some("primary")
        );
        clear_env();
    }

    #[test]
    #[serial]
    fn test_keystore_path_override() {
        clear_env();
        env::set_var("AUTHORITY_KEYSTORE_PATH", "/etc/authority/key.json");
        let config = Config::from_env().unwrap();
        assert_eq!(config.keystore().path(), PathBuf::from("/etc/authority/key.json"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_chain_config_rejected() {
        clear_env();
        env::set_var("AUTHORITY_CHAINS_COUNT", "1");
        env::set_var("AUTHORITY_CHAIN_1_CHAIN_ID", "31337");
        env::set_var("AUTHORITY_CHAIN_1_RPC_URL", "ws://localhost:8545");
        assert!(Config::from_env().is_err());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_debug_redacts_password() {
        clear_env();
        env::set_var("PW", "hunter2");
        let config = Config::from_env().unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
        clear_env();
    }
}
