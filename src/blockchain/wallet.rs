//! Wallet capability and the local keypair-backed wallet.
//!
//! # Security
//! - Keypairs are loaded ONLY from environment variables or keypair files
//! - Keys are never logged or serialized

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::{Signer, SignerError};
use solana_sdk::transaction::Transaction;
use thiserror::Error;

use crate::blockchain::keypair::{keypair_from_base58, read_keypair};
use crate::blockchain::types::{KeyError, Pubkey};

/// Environment variable holding a base58-encoded keypair.
pub const KEYPAIR_ENV_VAR: &str = "TX_SUBMITTER_KEYPAIR";

/// Errors surfaced by a wallet while signing.
#[derive(Debug, Error)]
pub enum WalletError {
    /// The wallet declined to sign.
    #[error("Wallet rejected signing: {0}")]
    Rejected(String),

    /// The transaction could not be signed as built.
    #[error("Wallet could not sign transaction: {0}")]
    Signing(#[from] SignerError),

    /// Key material could not be loaded.
    #[error("Wallet error: {0}")]
    Key(#[from] KeyError),
}

/// An external signer holding the fee payer key.
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    /// The key that pays fees and signs first.
    fn public_key(&self) -> Pubkey;

    /// Add the wallet's signature to a prepared transaction.
    async fn sign_transaction(&self, transaction: Transaction) -> Result<Transaction, WalletError>;

    /// Sign a batch in one interaction.
    async fn sign_all_transactions(
        &self,
        transactions: Vec<Transaction>,
    ) -> Result<Vec<Transaction>, WalletError> {
        let mut signed = Vec::with_capacity(transactions.len());
        for transaction in transactions {
            signed.push(self.sign_transaction(transaction).await?);
        }
        Ok(signed)
    }
}

/// Wallet backed by a keypair held in process memory.
#[derive(Clone)]
pub struct LocalWallet {
    keypair: Arc<Keypair>,
}

impl LocalWallet {
    pub fn new(keypair: Keypair) -> Self {
        tracing::info!(pubkey = %keypair.pubkey(), "Wallet initialized");
        Self {
            keypair: Arc::new(keypair),
        }
    }

    /// Load the wallet from `TX_SUBMITTER_KEYPAIR`.
    pub fn from_env() -> Result<Self, WalletError> {
        let encoded = std::env::var(KEYPAIR_ENV_VAR).map_err(|_| {
            KeyError::Unavailable(format!("Environment variable {} not set", KEYPAIR_ENV_VAR))
        })?;
        Ok(Self::new(keypair_from_base58(&encoded)?))
    }

    /// Load the wallet from a CLI keypair file.
    pub fn from_file(path: &Path) -> Result<Self, WalletError> {
        Ok(Self::new(read_keypair(path)?))
    }
}

impl fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalWallet")
            .field("pubkey", &self.keypair.pubkey())
            .finish()
    }
}

#[async_trait]
impl WalletAdapter for LocalWallet {
    fn public_key(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign_transaction(
        &self,
        mut transaction: Transaction,
    ) -> Result<Transaction, WalletError> {
        let blockhash = transaction.message.recent_blockhash;
        transaction.try_partial_sign(&[self.keypair.as_ref()], blockhash)?;
        Ok(transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::transaction::{build_unsigned, ensure_signed};
    use solana_sdk::hash::Hash;
    use solana_sdk::instruction::{AccountMeta, Instruction};

    fn prepared(payer: &Pubkey) -> Transaction {
        let ix = Instruction::new_with_bytes(
            Pubkey::new_from_array([42u8; 32]),
            &[],
            vec![AccountMeta::new(*payer, true)],
        );
        build_unsigned(&[ix], payer, Hash::new_from_array([1u8; 32]))
    }

    #[tokio::test]
    async fn test_local_wallet_signs() {
        let wallet = LocalWallet::new(Keypair::new());
        let signed = wallet
            .sign_transaction(prepared(&wallet.public_key()))
            .await
            .unwrap();
        assert!(ensure_signed(&signed).is_ok());
    }

    #[tokio::test]
    async fn test_sign_all_transactions() {
        let wallet = LocalWallet::new(Keypair::new());
        let payer = wallet.public_key();
        let signed = wallet
            .sign_all_transactions(vec![prepared(&payer), prepared(&payer)])
            .await
            .unwrap();
        assert_eq!(signed.len(), 2);
        assert!(signed.iter().all(|tx| ensure_signed(tx).is_ok()));
    }

    #[tokio::test]
    async fn test_foreign_transaction_rejected() {
        let wallet = LocalWallet::new(Keypair::new());
        let err = wallet
            .sign_transaction(prepared(&Pubkey::new_unique()))
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::Signing(SignerError::KeypairPubkeyMismatch)));
    }

    #[test]
    fn test_debug_hides_secret() {
        let keypair = Keypair::new();
        let secret = keypair.to_base58_string();
        let wallet = LocalWallet::new(keypair);
        let debug = format!("{:?}", wallet);
        assert!(debug.contains(&wallet.public_key().to_string()));
        assert!(!debug.contains(&secret));
    }

    #[test]
    fn test_missing_env_var() {
        std::env::remove_var(KEYPAIR_ENV_VAR);
        let err = LocalWallet::from_env().unwrap_err();
        assert!(err.to_string().contains(KEYPAIR_ENV_VAR));
    }
}
