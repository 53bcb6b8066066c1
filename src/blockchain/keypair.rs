//! Loading ed25519 keypairs for co-signing and local wallets.
//!
//! # Security
//! - Secret bytes are never logged or serialized
//! - Keypairs come ONLY from environment variables or keypair files

use std::path::Path;

use solana_sdk::signature::{read_keypair_file, Keypair};

use crate::blockchain::types::{KeyError, KeyResult};

const KEYPAIR_LEN: usize = 64;

/// Decode a base58-encoded 64-byte keypair (`secret || public`).
pub fn keypair_from_base58(encoded: &str) -> KeyResult<Keypair> {
    let bytes = bs58::decode(encoded.trim())
        .into_vec()
        .map_err(|e| KeyError::Base58(e.to_string()))?;
    if bytes.len() != KEYPAIR_LEN {
        return Err(KeyError::Length {
            expected: KEYPAIR_LEN,
            actual: bytes.len(),
        });
    }
    Keypair::from_bytes(&bytes).map_err(|e| KeyError::InvalidKeypair(e.to_string()))
}

/// Read a keypair file in the CLI JSON format (an array of 64 integers).
pub fn read_keypair(path: &Path) -> KeyResult<Keypair> {
    read_keypair_file(path)
        .map_err(|e| KeyError::Unavailable(format!("cannot read {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::signature::write_keypair_file;
    use solana_sdk::signer::Signer;

    #[test]
    fn test_base58_keypair() {
        let keypair = Keypair::new();
        let restored = keypair_from_base58(&keypair.to_base58_string()).unwrap();
        assert_eq!(restored.pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_bad_base58_rejected() {
        assert!(matches!(keypair_from_base58("0OIl"), Err(KeyError::Base58(_))));
        assert!(matches!(
            keypair_from_base58("abc123"),
            Err(KeyError::Length { expected: 64, .. })
        ));
    }

    #[test]
    fn test_mismatched_public_half_rejected() {
        let mut bytes = vec![9u8; 32];
        bytes.extend_from_slice(&[0u8; 32]);
        let encoded = bs58::encode(&bytes).into_string();
        assert!(matches!(
            keypair_from_base58(&encoded),
            Err(KeyError::InvalidKeypair(_))
        ));
    }

    #[test]
    fn test_keypair_file() {
        let keypair = Keypair::new();
        let path = std::env::temp_dir().join(format!("tx-submitter-{}.json", keypair.pubkey()));
        write_keypair_file(&keypair, &path).unwrap();

        let restored = read_keypair(&path).unwrap();
        assert_eq!(restored.pubkey(), keypair.pubkey());

        std::fs::remove_file(&path).unwrap();
        assert!(matches!(read_keypair(&path), Err(KeyError::Unavailable(_))));
    }
}
