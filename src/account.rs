//! The account handle: an Ed25519 key with its derived on-chain identity.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use std::fmt;
use std::sync::OnceLock;
use zeroize::Zeroizing;

use crate::address::{derive_address, AccountAddress, AuthenticationKey};
use crate::keys::Keypair;

/// A signing account.
///
/// Immutable after construction. The address and authentication key are
/// computed lazily from the public key and memoized in [`OnceLock`] cells, so
/// concurrent readers either see nothing or the final value, and two racing
/// initializers compute identical bytes.
pub struct Account {
    signing_key: SigningKey,
    address: OnceLock<AccountAddress>,
    authentication_key: OnceLock<AuthenticationKey>,
}

impl Account {
    pub fn new(keypair: Keypair) -> Self {
        Self::from_signing_key(keypair.into_signing_key())
    }

    pub fn from_signing_key(signing_key: SigningKey) -> Self {
        Self {
            signing_key,
            address: OnceLock::new(),
            authentication_key: OnceLock::new(),
        }
    }

    /// A fresh account from OS randomness.
    pub fn generate() -> Self {
        Self::new(Keypair::generate())
    }

    /// Use an authentication key that was rotated on chain instead of the one
    /// derived from the public key.
    pub fn with_authentication_key(self, key: AuthenticationKey) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(key);
        Self {
            authentication_key: cell,
            ..self
        }
    }

    pub fn address(&self) -> AccountAddress {
        *self
            .address
            .get_or_init(|| derive_address(&self.public_key_bytes()).0)
    }

    pub fn authentication_key(&self) -> AuthenticationKey {
        *self
            .authentication_key
            .get_or_init(|| derive_address(&self.public_key_bytes()).1)
    }

    pub fn public_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// `0x`-prefixed hex of the public key.
    pub fn public_key_hex(&self) -> String {
        format!("0x{}", hex::encode(self.public_key_bytes()))
    }

    /// Sign `message` as-is. No hashing or domain separation is added, so the
    /// caller must pass the exact bytes that have to be signed.
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }

    /// Verify `signature` over `message` against this account's key.
    ///
    /// Returns false for signatures of the wrong length instead of failing.
    pub fn verify(&self, signature: &[u8], message: &[u8]) -> bool {
        let Ok(signature) = Signature::from_slice(signature) else {
            return false;
        };
        self.public_key().verify(message, &signature).is_ok()
    }

    /// Base58 of the 64-byte expanded key (seed followed by public key).
    ///
    /// Re-importable as an encoded private key.
    pub fn private_key_base58(&self) -> Zeroizing<String> {
        let bytes = Zeroizing::new(self.signing_key.to_keypair_bytes());
        Zeroizing::new(bs58::encode(&bytes[..]).into_string())
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address())
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}
