//! Transaction submission and confirmation.
//!
//! # Data Flow
//! ```text
//! Instructions
//!     → signing.rs (blockhash, local signers, wallet)
//!     → sender.rs (initial broadcast, rebroadcast loop)
//!     → confirm.rs (subscription vs polling vs timer, via race.rs)
//!     → diagnosis.rs (simulation on failure or timeout)
//!     → TxId or SendError, plus notifications
//! ```

pub mod confirm;
pub mod diagnosis;
pub mod race;
pub mod sender;
pub mod signing;

use thiserror::Error;

use crate::blockchain::transaction::TransactionError;
use crate::blockchain::types::TxId;
use crate::blockchain::wallet::WalletError;
use crate::rpc::RpcError;

pub use confirm::{
    await_signature_confirmation, Confirmation, ConfirmationOutcome, ConfirmationSource,
    RaceSettings,
};
pub use diagnosis::Diagnosis;
pub use sender::{SubmitOptions, SubmittedTransaction, TransactionSender};
pub use signing::{sign_transaction, sign_transactions, TransactionAndSigners};

/// Errors from signing and submitting a transaction.
#[derive(Debug, Error)]
pub enum SendError {
    /// The initial broadcast was rejected. Not retried.
    #[error("Failed to broadcast transaction: {0}")]
    Broadcast(#[source] RpcError),

    #[error("Timed out awaiting confirmation on transaction {txid}")]
    Timeout { txid: TxId, timeout_ms: u64 },

    /// The network or a simulation reported the transaction as failed.
    #[error("Transaction failed: {detail}")]
    OnChain { txid: TxId, detail: String },

    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error("Invalid transaction: {0}")]
    Transaction(#[from] TransactionError),
}

impl SendError {
    /// The transaction id, if the transaction reached the network.
    pub fn txid(&self) -> Option<&TxId> {
        match self {
            SendError::Timeout { txid, .. } | SendError::OnChain { txid, .. } => Some(txid),
            _ => None,
        }
    }
}

pub type SendResult<T> = Result<T, SendError>;
