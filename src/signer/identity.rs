use bip39::{Language, Mnemonic, Seed};
use ed25519_dalek::{Signer as _, SigningKey};
use sha2::{Digest, Sha256};

use crate::ledger::{LedgerClient, LedgerError, SubmitResponse};
use crate::types::{Address, ObjectRef, SignedPayload};

/// Signature scheme flag prefixed to the public key for address derivation
const ED25519_FLAG: u8 = 0x00;

/// Errors from key derivation
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    /// The seed phrase is not a valid BIP-39 mnemonic
    #[error("invalid seed phrase")]
    InvalidSeed,
}

/// The orchestrator's signing identity
///
/// Holds the ed25519 key pair derived from the seed phrase and the address
/// computed from the public key. Derivation is deterministic: the same
/// phrase always yields the same key pair and address.
pub struct Identity {
    signing_key: SigningKey,
    address: Address,
}

impl Identity {
    /// Derive an identity from a BIP-39 seed phrase
    ///
    /// The phrase is expanded to a 64-byte seed (empty passphrase) and the
    /// first 32 bytes become the ed25519 secret key.
    ///
    /// # Returns
    /// * `Ok(Identity)` for a well-formed phrase
    /// * `Err(SeedError::InvalidSeed)` for malformed input
    pub fn from_seed_phrase(phrase: &str) -> Result<Self, SeedError> {
        let mnemonic =
            Mnemonic::from_phrase(phrase, Language::English).map_err(|_| SeedError::InvalidSeed)?;
        let seed = Seed::new(&mnemonic, "");

        let mut key_bytes = [0u8; 32];
        key_bytes.copy_from_slice(&seed.as_bytes()[..32]);
        let signing_key = SigningKey::from_bytes(&key_bytes);

        let address = derive_address(&signing_key);
        Ok(Self { signing_key, address })
    }

    /// The address derived from this identity's public key
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Sign transaction bytes offline
    ///
    /// Pure cryptographic operation: no ledger interaction, no shared state.
    /// ed25519 signatures are deterministic, so the same bytes always produce
    /// the same signature.
    pub fn sign_offline(&self, tx_bytes: &[u8]) -> Vec<u8> {
        self.signing_key.sign(tx_bytes).to_bytes().to_vec()
    }

    /// Sign transaction bytes and submit them in one step
    ///
    /// Convenience composition used by the combined pipeline mode; the
    /// pre-sign mode signs once via [`Identity::sign_offline`] and submits
    /// the stored payload separately.
    pub async fn sign_and_submit<L>(
        &self,
        client: &L,
        worker: usize,
        tx_bytes: Vec<u8>,
        gas: ObjectRef,
    ) -> Result<SubmitResponse, LedgerError>
    where
        L: LedgerClient + ?Sized,
    {
        let signature = self.sign_offline(&tx_bytes);
        let payload = SignedPayload { worker, tx_bytes, signature, gas };
        client.submit(&payload).await
    }
}

/// Compute the address for a signing key: sha256 over the scheme flag byte
/// followed by the public key bytes
fn derive_address(key: &SigningKey) -> Address {
    let mut hasher = Sha256::new();
    hasher.update([ED25519_FLAG]);
    hasher.update(key.verifying_key().as_bytes());
    Address(format!("0x{}", hex::encode(hasher.finalize())))
}

#[cfg(test)]
mod tests {
    use super::*;

    // BIP-39 test vector phrase; never holds funds
    const PHRASE: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn derivation_is_deterministic() {
        let a = Identity::from_seed_phrase(PHRASE).unwrap();
        let b = Identity::from_seed_phrase(PHRASE).unwrap();
        assert_eq!(a.address(), b.address());
        assert!(a.address().0.starts_with("0x"));
        // 32-byte digest, hex encoded
        assert_eq!(a.address().0.len(), 2 + 64);
    }

    #[test]
    fn malformed_phrase_is_rejected() {
        let result = Identity::from_seed_phrase("definitely not a mnemonic");
        assert!(matches!(result, Err(SeedError::InvalidSeed)));
    }

    #[test]
    fn offline_signing_is_deterministic() {
        let identity = Identity::from_seed_phrase(PHRASE).unwrap();
        let bytes = b"tx bytes".to_vec();
        assert_eq!(identity.sign_offline(&bytes), identity.sign_offline(&bytes));
        assert_ne!(identity.sign_offline(&bytes), identity.sign_offline(b"other"));
    }
}
