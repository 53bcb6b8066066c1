//! SPL token accounts.
//!
//! Layout of the 165-byte account data:
//! ```text
//! 0..32   mint
//! 32..64  owner
//! 64..72  amount (u64, little endian)
//! 72..165 delegate, state, native, close authority (not decoded)
//! ```

use solana_client::rpc_filter::{Memcmp, RpcFilterType};
use solana_sdk::pubkey;

use crate::blockchain::types::{KeyError, Pubkey};
use crate::rpc::{RpcClient, RpcError, RpcResult};

pub const TOKEN_PROGRAM_ID: Pubkey = pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");

pub const TOKEN_ACCOUNT_LEN: usize = 165;

const OWNER_OFFSET: usize = 32;
const AMOUNT_OFFSET: usize = 64;
const DECODED_LEN: usize = 72;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAccount {
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
}

/// A token account together with its address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedTokenAccount {
    pub pubkey: Pubkey,
    pub account: TokenAccount,
}

fn key_at(data: &[u8], offset: usize) -> Pubkey {
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&data[offset..offset + 32]);
    Pubkey::new_from_array(bytes)
}

pub fn parse_token_account_data(data: &[u8]) -> Result<TokenAccount, KeyError> {
    if data.len() < DECODED_LEN {
        return Err(KeyError::Length {
            expected: TOKEN_ACCOUNT_LEN,
            actual: data.len(),
        });
    }
    let mut amount = [0u8; 8];
    amount.copy_from_slice(&data[AMOUNT_OFFSET..DECODED_LEN]);

    Ok(TokenAccount {
        mint: key_at(data, 0),
        owner: key_at(data, OWNER_OFFSET),
        amount: u64::from_le_bytes(amount),
    })
}

/// Filters selecting token accounts owned by `owner`.
pub fn owned_accounts_filters(owner: &Pubkey) -> Vec<RpcFilterType> {
    vec![
        RpcFilterType::Memcmp(Memcmp::new_base58_encoded(OWNER_OFFSET, owner.as_ref())),
        RpcFilterType::DataSize(TOKEN_ACCOUNT_LEN as u64),
    ]
}

/// All token accounts owned by `owner`.
pub async fn get_owned_token_accounts(
    client: &RpcClient,
    owner: &Pubkey,
) -> RpcResult<Vec<OwnedTokenAccount>> {
    let accounts = client
        .get_program_accounts(&TOKEN_PROGRAM_ID, owned_accounts_filters(owner))
        .await?;

    accounts
        .into_iter()
        .map(|(pubkey, account)| {
            parse_token_account_data(&account.data)
                .map(|account| OwnedTokenAccount { pubkey, account })
                .map_err(|e| RpcError::schema("getProgramAccounts", format!("{pubkey}: {e}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_account_bytes(mint: Pubkey, owner: Pubkey, amount: u64) -> Vec<u8> {
        let mut data = vec![0u8; TOKEN_ACCOUNT_LEN];
        data[0..32].copy_from_slice(mint.as_ref());
        data[32..64].copy_from_slice(owner.as_ref());
        data[64..72].copy_from_slice(&amount.to_le_bytes());
        data
    }

    #[test]
    fn test_parse_token_account() {
        let mint = Pubkey::new_from_array([3; 32]);
        let owner = Pubkey::new_from_array([4; 32]);
        let data = token_account_bytes(mint, owner, 1_500_000);

        let parsed = parse_token_account_data(&data).unwrap();
        assert_eq!(parsed.mint, mint);
        assert_eq!(parsed.owner, owner);
        assert_eq!(parsed.amount, 1_500_000);
    }

    #[test]
    fn test_short_data() {
        let err = parse_token_account_data(&[0u8; 40]).unwrap_err();
        assert!(matches!(err, KeyError::Length { actual: 40, .. }));
    }

    #[test]
    fn test_filters_shape() {
        let owner = Pubkey::new_from_array([4; 32]);
        let filters = serde_json::to_value(owned_accounts_filters(&owner)).unwrap();
        assert_eq!(filters[0]["memcmp"]["offset"], 32);
        assert_eq!(filters[0]["memcmp"]["bytes"], owner.to_string());
        assert_eq!(filters[1]["dataSize"], 165);
        assert_eq!(
            TOKEN_PROGRAM_ID.to_string(),
            "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA"
        );
    }
}
