//! Account key material.
//!
//! A caller-supplied credential string is classified once
//! ([`KeyCredential::classify`]) and then turned into an Ed25519 keypair by
//! exactly one of three strategies:
//!
//! - empty credential: fresh OS randomness
//! - encoded private key: `0x` hex or base58, first 32 bytes are the seed
//! - mnemonic phrase: BIP39 seed walked along `m/44'/637'/{index}'/0/0`
//!
//! ## Usage
//!
//! ```ignore
//! let account = keys::derive_account("abandon abandon ... about", 0)?;
//! println!("{}", account.address());
//! ```

pub mod credential;
pub mod derive;

pub use credential::{is_mnemonic, KeyCredential, MNEMONIC_WORD_COUNTS};
pub use derive::{
    derivation_path, derive_account, DerivationStrategy, KeyDeriver, Keypair, APTOS_COIN_TYPE,
    BIP44_PURPOSE,
};
