//! Bridge Authority CLI
//!
//! ```text
//! bridge-authority authorize --tx 0x... --chain 5 [--nft]
//! bridge-authority address
//! bridge-authority chains
//! ```
//!
//! `authorize` prints the result as JSON on stdout; logs go to stderr.

use clap::{Parser, Subcommand};
use eyre::WrapErr;
use std::sync::Arc;
use tracing::info;

use authority::{
    AssetKind, AuthoritySigner, AuthorizationService, Config, RpcChainReader,
};

#[derive(Parser)]
#[command(name = "bridge-authority")]
#[command(about = "Deposit verification and claim authorization for the bridge", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify a deposit and sign its claim
    Authorize {
        /// Deposit transaction hash (0x-prefixed)
        #[arg(long)]
        tx: String,

        /// Chain ID the deposit was made on
        #[arg(long)]
        chain: u64,

        /// Deposit was made on the NFT bridge
        #[arg(long)]
        nft: bool,
    },

    /// Print the authority's public address
    Address,

    /// List configured chains
    Chains,
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

async fn async_main() -> eyre::Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = Config::load()?;
    info!(
        keystore = %config.keystore_path.display(),
        chains = config.registry.len(),
        "Configuration loaded"
    );

    let signer = AuthoritySigner::new(Arc::new(config.keystore()));

    match cli.command {
        Commands::Authorize { tx, chain, nft } => {
            let service = AuthorizationService::new(
                Arc::new(config.registry),
                Arc::new(RpcChainReader::new()),
                signer,
            );

            let result = service
                .authorize(&tx, chain, AssetKind::from_is_nft(nft))
                .await;
            println!("{}", serde_json::to_string_pretty(&result)?);

            if !result.is_success() {
                std::process::exit(1);
            }
        }
        Commands::Address => {
            let address = tokio::task::spawn_blocking(move || signer.address())
                .await?
                .wrap_err("Failed to unlock authority key")?;
            println!("{}", address);
        }
        Commands::Chains => {
            for chain in config.registry.chains() {
                println!(
                    "{:>6}  {:<18} confirmations={:<3} bridge={} nft_bridge={}  {}",
                    chain.chain_id,
                    chain.name,
                    chain.confirmation_depth,
                    chain
                        .bridge_contract
                        .map(|a| a.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    chain
                        .nft_bridge_contract
                        .map(|a| a.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    chain.rpc_url,
                );
            }
        }
    }

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,authority=debug,bridge_authority=debug"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
