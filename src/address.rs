//! Account address and authentication key derivation.
//!
//! Both values are `SHA3-256(public_key || 0x00)`, where the trailing byte is
//! the single-signer Ed25519 scheme identifier. They only diverge after an
//! on-chain key rotation, which this crate never performs.

use sha3::{Digest, Sha3_256};
use std::fmt;
use std::str::FromStr;

use crate::error::AptError;

/// Scheme byte appended to an Ed25519 public key before hashing.
pub const ED25519_SCHEME: u8 = 0x00;

/// Length of the textual form: `0x` plus 64 hex digits.
pub const ADDRESS_HEX_LENGTH: usize = 66;

/// Hash a public key into the 32-byte authentication key.
pub fn authentication_key_bytes(public_key: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    hasher.update(public_key);
    hasher.update([ED25519_SCHEME]);
    hasher.finalize().into()
}

/// Address and authentication key for a freshly derived single-signer account.
pub fn derive_address(public_key: &[u8; 32]) -> (AccountAddress, AuthenticationKey) {
    let bytes = authentication_key_bytes(public_key);
    (AccountAddress(bytes), AuthenticationKey(bytes))
}

fn parse_prefixed(s: &str) -> Result<[u8; 32], AptError> {
    let invalid = || AptError::InvalidAddress(s.to_string());
    if s.len() != ADDRESS_HEX_LENGTH {
        return Err(invalid());
    }
    let digits = s.strip_prefix("0x").ok_or_else(invalid)?;
    let mut out = [0u8; 32];
    hex::decode_to_slice(digits, &mut out).map_err(|_| invalid())?;
    Ok(out)
}

/// A 32-byte account address, displayed as `0x` + 64 lowercase hex digits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountAddress([u8; 32]);

impl AccountAddress {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountAddress({self})")
    }
}

impl FromStr for AccountAddress {
    type Err = AptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_prefixed(s).map(Self)
    }
}

/// The key that authorizes transactions for an account.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AuthenticationKey([u8; 32]);

impl AuthenticationKey {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_public_key(public_key: &[u8; 32]) -> Self {
        Self(authentication_key_bytes(public_key))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The address this key derives when no rotation has happened.
    pub fn derived_address(&self) -> AccountAddress {
        AccountAddress(self.0)
    }
}

impl fmt::Display for AuthenticationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for AuthenticationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthenticationKey({self})")
    }
}

impl FromStr for AuthenticationKey {
    type Err = AptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_prefixed(s).map(Self)
    }
}
