use bip32::{DerivationPath, XPrv};
use bip39::Mnemonic;
use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use tracing::debug;
use zeroize::Zeroizing;

use super::credential::KeyCredential;
use crate::account::Account;
use crate::error::{AptError, AptResult};

/// BIP44 purpose level.
pub const BIP44_PURPOSE: u32 = 44;
/// SLIP-44 coin type registered for Aptos.
pub const APTOS_COIN_TYPE: u32 = 637;

/// Largest index usable as a hardened BIP32 child.
const MAX_HARDENED_INDEX: i64 = 0x7FFF_FFFF;

/// HD path for the account at `index`: `m/44'/637'/{index}'/0/0`.
pub fn derivation_path(index: u32) -> String {
    format!("m/{BIP44_PURPOSE}'/{APTOS_COIN_TYPE}'/{index}'/0/0")
}

/// An Ed25519 keypair produced by one of the derivation strategies.
///
/// The secret half lives in [`SigningKey`], which zeroizes itself on drop.
#[derive(Debug)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a keypair from OS randomness.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Build a keypair from the first 32 bytes of `seed`.
    pub fn from_seed(seed: &[u8]) -> AptResult<Self> {
        let bytes: [u8; 32] = seed
            .get(..32)
            .and_then(|s| s.try_into().ok())
            .ok_or(AptError::SeedLength(seed.len()))?;
        let seed = Zeroizing::new(bytes);
        Ok(Self {
            signing_key: SigningKey::from_bytes(&seed),
        })
    }

    /// Decode an encoded private key: `0x`/`0X` selects hex, anything else is
    /// read as base58.
    pub fn from_encoded(encoded: &str) -> AptResult<Self> {
        let encoded = encoded.trim();
        let decoded = match encoded
            .strip_prefix("0x")
            .or_else(|| encoded.strip_prefix("0X"))
        {
            Some(hex_digits) => hex::decode(hex_digits)
                .map_err(|e| AptError::decode(format!("invalid hex private key: {e}")))?,
            None => bs58::decode(encoded)
                .into_vec()
                .map_err(|e| AptError::decode(format!("invalid base58 private key: {e}")))?,
        };
        let decoded = Zeroizing::new(decoded);
        Self::from_seed(&decoded)
    }

    /// Derive the keypair at `index` from a BIP39 phrase (empty passphrase).
    pub fn from_mnemonic(phrase: &str, index: u32) -> AptResult<Self> {
        let mnemonic: Mnemonic = phrase
            .parse()
            .map_err(|e| AptError::Mnemonic(format!("{}", e)))?;
        let seed = Zeroizing::new(mnemonic.to_seed(""));

        let path: DerivationPath = derivation_path(index)
            .parse()
            .map_err(|e| AptError::Mnemonic(format!("invalid HD path: {}", e)))?;

        let child_xprv = XPrv::derive_from_path(&*seed, &path)
            .map_err(|e| AptError::Mnemonic(format!("key derivation failed: {}", e)))?;

        // The 32-byte child key becomes the Ed25519 seed, same as an encoded key
        let child_key = Zeroizing::new(child_xprv.private_key().to_bytes().to_vec());
        Self::from_seed(&child_key)
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    pub fn into_signing_key(self) -> SigningKey {
        self.signing_key
    }
}

/// The closed set of ways to obtain a keypair, chosen once from a
/// [`KeyCredential`].
pub enum DerivationStrategy {
    Random,
    EncodedKey(Zeroizing<String>),
    Mnemonic {
        phrase: Zeroizing<String>,
        index: u32,
    },
}

impl DerivationStrategy {
    pub fn derive(&self) -> AptResult<Keypair> {
        match self {
            Self::Random => Ok(Keypair::generate()),
            Self::EncodedKey(encoded) => Keypair::from_encoded(encoded),
            Self::Mnemonic { phrase, index } => Keypair::from_mnemonic(phrase, *index),
        }
    }
}

/// Routes a classified credential to its derivation strategy.
///
/// Each typed operation checks the credential tag first and fails with
/// [`AptError::KeyTypeMismatch`] without touching any key material when
/// called against the wrong kind.
#[derive(Debug, Clone)]
pub struct KeyDeriver {
    credential: KeyCredential,
}

impl KeyDeriver {
    pub fn new(credential: KeyCredential) -> Self {
        Self { credential }
    }

    /// Classify `raw` and wrap it.
    pub fn classify(raw: &str) -> Self {
        Self::new(KeyCredential::classify(raw))
    }

    pub fn credential(&self) -> &KeyCredential {
        &self.credential
    }

    /// Generate a fresh keypair. Requires an empty credential.
    pub fn from_random(&self) -> AptResult<Keypair> {
        match &self.credential {
            KeyCredential::None => DerivationStrategy::Random.derive(),
            other => Err(mismatch("none", other)),
        }
    }

    /// Decode the credential as a private key.
    pub fn from_encoded_private_key(&self) -> AptResult<Keypair> {
        match &self.credential {
            KeyCredential::PrivateKeyEncoded(encoded) => Keypair::from_encoded(encoded),
            other => Err(mismatch("private key", other)),
        }
    }

    /// Walk the HD path at `index` from the credential's mnemonic.
    ///
    /// `index` is signed at this boundary so negative input is reported
    /// rather than wrapped by the unsigned cast.
    pub fn from_mnemonic(&self, index: i64) -> AptResult<Keypair> {
        match &self.credential {
            KeyCredential::Mnemonic(phrase) => {
                let index = check_index(index)?;
                Keypair::from_mnemonic(phrase, index)
            }
            other => Err(mismatch("mnemonic", other)),
        }
    }

    /// The strategy matching this credential. `index` only matters for
    /// mnemonics.
    pub fn strategy(&self, index: i64) -> AptResult<DerivationStrategy> {
        Ok(match &self.credential {
            KeyCredential::None => DerivationStrategy::Random,
            KeyCredential::PrivateKeyEncoded(encoded) => {
                DerivationStrategy::EncodedKey(Zeroizing::new(encoded.clone()))
            }
            KeyCredential::Mnemonic(phrase) => DerivationStrategy::Mnemonic {
                phrase: Zeroizing::new(phrase.clone()),
                index: check_index(index)?,
            },
        })
    }

    /// Derive the keypair for this credential.
    pub fn derive(&self, index: i64) -> AptResult<Keypair> {
        debug!(kind = self.credential.kind(), index, "Deriving account key");
        self.strategy(index)?.derive()
    }

    /// Derive the keypair and wrap it in an [`Account`].
    pub fn derive_account(&self, index: i64) -> AptResult<Account> {
        self.derive(index).map(Account::new)
    }
}

/// Classify `credential` and derive the account at `index`.
pub fn derive_account(credential: &str, index: i64) -> AptResult<Account> {
    KeyDeriver::classify(credential).derive_account(index)
}

fn check_index(index: i64) -> AptResult<u32> {
    if !(0..=MAX_HARDENED_INDEX).contains(&index) {
        return Err(AptError::Index(index));
    }
    u32::try_from(index).map_err(|_| AptError::Index(index))
}

fn mismatch(expected: &'static str, actual: &KeyCredential) -> AptError {
    AptError::KeyTypeMismatch {
        expected,
        actual: actual.kind(),
    }
}
