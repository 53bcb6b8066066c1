//! Two-phase signing: local signers first, then the wallet.
//!
//! ```text
//! latest blockhash (once per call)
//!     → message with the wallet key as fee payer
//!     → partial sign with the additional signers
//!     → wallet.sign_transaction / sign_all_transactions
//! ```

use crate::blockchain::transaction::{build_unsigned, TransactionError};
use crate::blockchain::types::{Hash, Pubkey};
use crate::blockchain::wallet::WalletAdapter;
use crate::blockchain::{Instruction, Keypair, Transaction};
use crate::rpc::Connection;
use crate::submit::SendResult;

/// Instructions for one transaction and the local keypairs that must co-sign it.
pub struct TransactionAndSigners<'a> {
    pub instructions: Vec<Instruction>,
    pub signers: Vec<&'a Keypair>,
}

impl<'a> TransactionAndSigners<'a> {
    pub fn new(instructions: Vec<Instruction>, signers: Vec<&'a Keypair>) -> Self {
        Self {
            instructions,
            signers,
        }
    }
}

/// Sign one transaction with `signers` and then the wallet.
pub async fn sign_transaction(
    connection: &dyn Connection,
    wallet: &dyn WalletAdapter,
    instructions: &[Instruction],
    signers: &[&Keypair],
) -> SendResult<Transaction> {
    let blockhash = connection.get_latest_blockhash().await?;
    let prepared = prepare(instructions, blockhash, &wallet.public_key(), signers)?;
    Ok(wallet.sign_transaction(prepared).await?)
}

/// Sign a batch with one blockhash fetch and one wallet interaction.
pub async fn sign_transactions(
    connection: &dyn Connection,
    wallet: &dyn WalletAdapter,
    batch: Vec<TransactionAndSigners<'_>>,
) -> SendResult<Vec<Transaction>> {
    let blockhash = connection.get_latest_blockhash().await?;
    let fee_payer = wallet.public_key();

    let prepared = batch
        .iter()
        .map(|item| prepare(&item.instructions, blockhash, &fee_payer, &item.signers))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(count = prepared.len(), blockhash = %blockhash, "Requesting wallet signatures");
    Ok(wallet.sign_all_transactions(prepared).await?)
}

/// Every signer must appear as a signing account in `instructions`.
fn prepare(
    instructions: &[Instruction],
    blockhash: Hash,
    fee_payer: &Pubkey,
    signers: &[&Keypair],
) -> Result<Transaction, TransactionError> {
    let mut transaction = build_unsigned(instructions, fee_payer, blockhash);
    if !signers.is_empty() {
        transaction.try_partial_sign(signers, blockhash)?;
    }
    Ok(transaction)
}
