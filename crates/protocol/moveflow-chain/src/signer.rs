//! Local Ed25519 account signer.
//!
//! Aptos derives a single-key account address as
//! `sha3_256(public_key || 0x00)`.

use ed25519_dalek::{Signer, SigningKey};
use sha3::{Digest, Sha3_256};

use moveflow_types::{is_valid_address, normalize_address};

use crate::error::{ChainError, ChainResult};

/// Authentication scheme byte for single Ed25519 keys.
const ED25519_SCHEME: u8 = 0x00;

/// Holds the account key and the address it signs for.
#[derive(Clone)]
pub struct LocalSigner {
    signing_key: SigningKey,
    address: String,
}

impl std::fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl LocalSigner {
    /// Parse a hex private key.
    ///
    /// Accepts an optional `0x` or `ed25519-priv-` prefix.
    pub fn from_hex(private_key: &str) -> ChainResult<Self> {
        let trimmed = private_key.trim();
        let body = trimmed
            .strip_prefix("ed25519-priv-")
            .unwrap_or(trimmed);
        let body = body
            .strip_prefix("0x")
            .or_else(|| body.strip_prefix("0X"))
            .unwrap_or(body);

        let bytes = hex::decode(body)
            .map_err(|e| ChainError::signing(format!("private key is not hex: {}", e)))?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| {
            ChainError::signing(format!("private key must be 32 bytes, got {}", v.len()))
        })?;

        Ok(Self::from_signing_key(SigningKey::from_bytes(&bytes)))
    }

    /// Wrap an existing key, deriving its address.
    pub fn from_signing_key(signing_key: SigningKey) -> Self {
        let address = derive_address(&signing_key.verifying_key().to_bytes());
        Self {
            signing_key,
            address,
        }
    }

    /// Use an explicit account address (rotated keys).
    pub fn with_address(mut self, address: &str) -> ChainResult<Self> {
        if !is_valid_address(address) {
            return Err(ChainError::config(format!("invalid account address: {}", address)));
        }
        self.address = normalize_address(address);
        Ok(self)
    }

    /// Account address this signer acts for.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// `0x`-prefixed hex public key.
    pub fn public_key_hex(&self) -> String {
        format!("0x{}", hex::encode(self.signing_key.verifying_key().to_bytes()))
    }

    /// Sign a message, returning the `0x`-prefixed hex signature.
    pub fn sign_hex(&self, message: &[u8]) -> String {
        let signature = self.signing_key.sign(message);
        format!("0x{}", hex::encode(signature.to_bytes()))
    }
}

/// Derive the account address of a single Ed25519 public key.
pub fn derive_address(public_key: &[u8; 32]) -> String {
    let mut hasher = Sha3_256::new();
    hasher.update(public_key);
    hasher.update([ED25519_SCHEME]);
    format!("0x{}", hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signature, Verifier};

    const KEY: &str = "0x1111111111111111111111111111111111111111111111111111111111111111";

    #[test]
    fn test_prefixes_accepted() {
        let a = LocalSigner::from_hex(KEY).unwrap();
        let b = LocalSigner::from_hex(&KEY[2..]).unwrap();
        let c = LocalSigner::from_hex(&format!("ed25519-priv-{}", KEY)).unwrap();
        assert_eq!(a.address(), b.address());
        assert_eq!(a.address(), c.address());
    }

    #[test]
    fn test_address_shape() {
        let signer = LocalSigner::from_hex(KEY).unwrap();
        assert_eq!(signer.address().len(), 66);
        assert!(is_valid_address(signer.address()));
        assert_eq!(signer.public_key_hex().len(), 66);
    }

    #[test]
    fn test_rejects_bad_keys() {
        assert!(matches!(LocalSigner::from_hex("zz"), Err(ChainError::Signing(_))));
        assert!(matches!(LocalSigner::from_hex("0xabcd"), Err(ChainError::Signing(_))));
    }

    #[test]
    fn test_signature_verifies() {
        let key = SigningKey::generate(&mut rand::rngs::OsRng);
        let verifying = key.verifying_key();
        let signer = LocalSigner::from_signing_key(key);

        let sig_hex = signer.sign_hex(b"moveflow");
        let bytes = hex::decode(sig_hex.trim_start_matches("0x")).unwrap();
        let sig = Signature::from_slice(&bytes).unwrap();
        assert!(verifying.verify(b"moveflow", &sig).is_ok());
    }

    #[test]
    fn test_address_override() {
        let signer = LocalSigner::from_hex(KEY).unwrap().with_address("0xABC").unwrap();
        assert_eq!(signer.address(), "0xabc");
        assert!(LocalSigner::from_hex(KEY).unwrap().with_address("nothex!").is_err());
    }
}
