//! Account lookups.

pub mod token;

use std::collections::HashMap;

use solana_sdk::account::Account;

use crate::blockchain::types::Pubkey;
use crate::rpc::{RpcClient, RpcResult};

pub use token::{
    get_owned_token_accounts, parse_token_account_data, OwnedTokenAccount, TokenAccount,
};

/// Accounts fetched together, keyed by address. Missing accounts map to `None`.
#[derive(Debug, Clone, Default)]
pub struct AccountsSnapshot {
    pub slot: u64,
    pub accounts: HashMap<Pubkey, Option<Account>>,
}

impl AccountsSnapshot {
    pub fn get(&self, pubkey: &Pubkey) -> Option<&Account> {
        self.accounts.get(pubkey).and_then(Option::as_ref)
    }
}

/// Fetch `pubkeys` in one `getMultipleAccounts` call.
pub async fn fetch_accounts(client: &RpcClient, pubkeys: &[Pubkey]) -> RpcResult<AccountsSnapshot> {
    let response = client.get_multiple_accounts(pubkeys).await?;
    Ok(AccountsSnapshot {
        slot: response.context.slot,
        accounts: pubkeys.iter().copied().zip(response.value).collect(),
    })
}
