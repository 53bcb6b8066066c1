//! Chain primitives and error definitions.

use std::fmt;

use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_transaction_status::TransactionConfirmationStatus;
use thiserror::Error;

pub use solana_sdk::hash::Hash;
pub use solana_sdk::pubkey::Pubkey;
pub use solana_sdk::signature::Signature;

/// Network-facing transaction identifier.
///
/// The network reports the first signature of a transaction as its id. The
/// confirmation path treats it as an opaque handle.
pub type TxId = Signature;

/// Errors raised while loading keys or decoding key material.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// Input was not valid base58.
    #[error("Invalid base58 string: {0}")]
    Base58(String),

    /// Decoded input had the wrong size.
    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },

    /// Secret key material was rejected.
    #[error("Invalid keypair: {0}")]
    InvalidKeypair(String),

    /// Keypair could not be loaded from its source.
    #[error("Keypair unavailable: {0}")]
    Unavailable(String),
}

/// Result type for key handling.
pub type KeyResult<T> = Result<T, KeyError>;

/// Commitment level requested from the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Commitment::Processed => "processed",
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
        };
        f.write_str(s)
    }
}

impl From<Commitment> for CommitmentConfig {
    fn from(commitment: Commitment) -> Self {
        match commitment {
            Commitment::Processed => CommitmentConfig::processed(),
            Commitment::Confirmed => CommitmentConfig::confirmed(),
            Commitment::Finalized => CommitmentConfig::finalized(),
        }
    }
}

impl From<TransactionConfirmationStatus> for Commitment {
    fn from(status: TransactionConfirmationStatus) -> Self {
        match status {
            TransactionConfirmationStatus::Processed => Commitment::Processed,
            TransactionConfirmationStatus::Confirmed => Commitment::Confirmed,
            TransactionConfirmationStatus::Finalized => Commitment::Finalized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commitment_serde() {
        assert_eq!(serde_json::to_string(&Commitment::Finalized).unwrap(), "\"finalized\"");
        assert_eq!(Commitment::default(), Commitment::Confirmed);
    }

    #[test]
    fn test_commitment_config() {
        assert_eq!(
            CommitmentConfig::from(Commitment::Finalized),
            CommitmentConfig::finalized()
        );
        assert_eq!(
            Commitment::from(TransactionConfirmationStatus::Processed),
            Commitment::Processed
        );
    }

    #[test]
    fn test_txid_is_base58_signature() {
        let txid = TxId::from([1u8; 64]);
        assert_eq!(txid.to_string().parse::<TxId>().unwrap(), txid);
    }
}
