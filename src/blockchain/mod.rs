//! Chain primitives, transactions and wallets.
//!
//! # Data Flow
//! ```text
//! Instructions
//!     → transaction.rs (fee payer, blockhash, message compilation)
//!     → co-signer keypairs (partial signatures)
//!     → wallet.rs (fee payer signature via WalletAdapter)
//!     → signed Transaction, handed to submit/
//! ```
//!
//! # Security Constraints
//! - Secret keys ONLY from environment variables or keypair files
//! - Never log private keys or sensitive data

pub mod keypair;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use solana_sdk::instruction::{AccountMeta, Instruction};
pub use solana_sdk::signature::Keypair;
pub use solana_sdk::signer::Signer;
pub use solana_sdk::transaction::Transaction;

pub use transaction::TransactionError;
pub use types::{Commitment, Hash, KeyError, Pubkey, Signature, TxId};
pub use wallet::{LocalWallet, WalletAdapter, WalletError};
