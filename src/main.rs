//! tx-submitter
//!
//! Sends transactions to a Solana-style JSON-RPC network and waits for
//! confirmation.
//!
//! ```text
//!  CLI ──▶ config ──▶ TransactionSender ──▶ RpcConnection ──▶ RPC node
//!                          │                   ├─ HTTP JSON-RPC (send, poll, simulate)
//!                          │                   └─ websocket (signatureSubscribe)
//!                          └─▶ notifications (log)
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use clap::{Parser, Subcommand};

use tx_submitter::accounts::{self, token};
use solana_sdk::pubkey;

use tx_submitter::blockchain::transaction;
use tx_submitter::blockchain::types::{Pubkey, TxId};
use tx_submitter::blockchain::wallet::{LocalWallet, WalletAdapter};
use tx_submitter::blockchain::{AccountMeta, Instruction};
use tx_submitter::config::{self, SubmitterConfig};
use tx_submitter::notify::LogNotifier;
use tx_submitter::observability;
use tx_submitter::rpc::RpcConnection;
use tx_submitter::{SubmitOptions, TransactionSender};

const MEMO_PROGRAM_ID: Pubkey = pubkey!("MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr");

#[derive(Parser)]
#[command(name = "tx-submitter")]
#[command(about = "Submit transactions and race confirmation signals", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override rpc.url
    #[arg(long)]
    rpc_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a signed, base64-encoded transaction and wait for confirmation
    Send {
        /// Wire transaction as base64
        #[arg(conflicts_with = "file", required_unless_present = "file")]
        transaction: Option<String>,
        /// File holding the base64 wire transaction
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Sign and send a memo with a local keypair
    Memo {
        text: String,
        /// Keypair file (JSON array); defaults to TX_SUBMITTER_KEYPAIR
        #[arg(long)]
        keypair: Option<PathBuf>,
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Show signature statuses
    Status {
        #[arg(required = true)]
        txids: Vec<String>,
    },
    /// Simulate a base64-encoded transaction
    Simulate { transaction: String },
    /// Show accounts
    Accounts {
        #[arg(required = true)]
        pubkeys: Vec<String>,
    },
    /// List SPL token accounts owned by an address
    TokenAccounts { owner: String },
    /// Check node health
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => SubmitterConfig::default(),
    };
    if let Some(url) = cli.rpc_url {
        config.rpc.url = url;
        config::validate_config(&config).map_err(config::ConfigError::Validation)?;
    }

    observability::logging::init(&config.observability)?;
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    tracing::debug!(
        rpc_url = %config.rpc.url,
        commitment = %config.rpc.commitment,
        timeout_ms = config.confirmation.timeout_ms,
        "Configuration loaded"
    );

    let connection = RpcConnection::new(config.rpc.clone())?;
    let client = connection.client().clone();

    match cli.command {
        Commands::Send {
            transaction,
            file,
            timeout_ms,
        } => {
            let encoded = match (transaction, file) {
                (Some(encoded), _) => encoded,
                (None, Some(path)) => std::fs::read_to_string(path)?,
                (None, None) => return Err("a transaction or --file is required".into()),
            };
            let raw = BASE64.decode(encoded.trim())?;
            let sender = TransactionSender::from_config(
                Arc::new(connection),
                Arc::new(LogNotifier),
                &config,
            );
            let txid = sender
                .send_wire_transaction(&raw, &submit_options(timeout_ms))
                .await?;
            println!("{}", txid);
        }
        Commands::Memo {
            text,
            keypair,
            timeout_ms,
        } => {
            let wallet = match keypair {
                Some(path) => LocalWallet::from_file(&path)?,
                None => LocalWallet::from_env()?,
            };
            let memo = Instruction::new_with_bytes(
                MEMO_PROGRAM_ID,
                text.as_bytes(),
                vec![AccountMeta::new_readonly(wallet.public_key(), true)],
            );
            let sender = TransactionSender::from_config(
                Arc::new(connection),
                Arc::new(LogNotifier),
                &config,
            );
            let txid = sender
                .send_transaction(&[memo], &wallet, &[], &submit_options(timeout_ms))
                .await?;
            println!("{}", txid);
        }
        Commands::Status { txids } => {
            let txids = txids
                .iter()
                .map(|txid| txid.parse())
                .collect::<Result<Vec<TxId>, _>>()?;
            let statuses = client.get_signature_statuses(&txids).await?;
            for (txid, status) in txids.iter().zip(statuses) {
                println!("{}: {}", txid, serde_json::to_string(&status)?);
            }
        }
        Commands::Simulate { transaction } => {
            let raw = BASE64.decode(transaction.trim())?;
            let transaction = transaction::deserialize(&raw)?;
            let result = client.simulate_transaction(&transaction).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Accounts { pubkeys } => {
            let pubkeys = pubkeys
                .iter()
                .map(|key| key.parse())
                .collect::<Result<Vec<Pubkey>, _>>()?;
            let snapshot = accounts::fetch_accounts(&client, &pubkeys).await?;
            println!("slot {}", snapshot.slot);
            for pubkey in &pubkeys {
                match snapshot.get(pubkey) {
                    Some(account) => println!(
                        "{}: {} lamports, owner {}, {} bytes",
                        pubkey,
                        account.lamports,
                        account.owner,
                        account.data.len()
                    ),
                    None => println!("{}: not found", pubkey),
                }
            }
        }
        Commands::TokenAccounts { owner } => {
            let owner: Pubkey = owner.parse()?;
            for owned in token::get_owned_token_accounts(&client, &owner).await? {
                println!(
                    "{}: mint {} amount {}",
                    owned.pubkey, owned.account.mint, owned.account.amount
                );
            }
        }
        Commands::Health => {
            client.get_health().await?;
            println!("ok");
        }
    }

    Ok(())
}

fn submit_options(timeout_ms: Option<u64>) -> SubmitOptions {
    SubmitOptions {
        timeout: timeout_ms.map(Duration::from_millis),
        ..SubmitOptions::default()
    }
}
