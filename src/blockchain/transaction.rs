//! Building, checking and encoding transactions.
//!
//! # Wire Format
//! Transactions travel as the bincode encoding of the legacy
//! [`Transaction`]: signatures, then the compiled message.

use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::signer::SignerError;
use solana_sdk::transaction::Transaction;
use thiserror::Error;

/// Errors that can occur while building or signing a transaction.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum TransactionError {
    #[error("Missing signature for {0}")]
    MissingSignature(Pubkey),

    #[error("Signature verification failed")]
    InvalidSignature,

    #[error("Signing failed: {0}")]
    Signer(#[from] SignerError),

    #[error("Malformed wire transaction: {0}")]
    Encoding(String),
}

/// Result type for transaction operations.
pub type TransactionResult<T> = Result<T, TransactionError>;

/// Compile `instructions` into an unsigned transaction paid by `fee_payer`.
pub fn build_unsigned(
    instructions: &[Instruction],
    fee_payer: &Pubkey,
    blockhash: Hash,
) -> Transaction {
    Transaction::new_unsigned(Message::new_with_blockhash(
        instructions,
        Some(fee_payer),
        &blockhash,
    ))
}

/// Check that every required signature is present and valid.
pub fn ensure_signed(transaction: &Transaction) -> TransactionResult<()> {
    let required = usize::from(transaction.message.header.num_required_signatures);
    let keys = &transaction.message.account_keys;
    for position in 0..required {
        let signed = transaction
            .signatures
            .get(position)
            .is_some_and(|signature| *signature != Signature::default());
        if !signed {
            let key = keys.get(position).copied().unwrap_or_default();
            return Err(TransactionError::MissingSignature(key));
        }
    }
    transaction
        .verify()
        .map_err(|_| TransactionError::InvalidSignature)
}

/// Encode for broadcast.
pub fn serialize(transaction: &Transaction) -> TransactionResult<Vec<u8>> {
    bincode::serialize(transaction).map_err(|e| TransactionError::Encoding(e.to_string()))
}

/// Decode wire bytes.
pub fn deserialize(raw: &[u8]) -> TransactionResult<Transaction> {
    bincode::deserialize(raw).map_err(|e| TransactionError::Encoding(e.to_string()))
}
