//! Client toolkit for Aptos-style ledgers.
//!
//! Key derivation ([`keys`]), account identity ([`account`], [`address`]),
//! and the transaction signing protocol ([`transaction`]) against a node REST
//! API reached through an injected [`transport::Transport`].

pub mod account;
pub mod address;
pub mod client;
pub mod config;
pub mod error;
pub mod keys;
pub mod transaction;
pub mod transport;

pub use account::Account;
pub use address::{derive_address, AccountAddress, AuthenticationKey};
pub use client::AptClient;
pub use config::AppConfig;
pub use error::{AptError, AptResult, ErrorKind};
pub use keys::{derive_account, KeyCredential, KeyDeriver, Keypair};
pub use transaction::{TransactionBuilder, TransactionLifecycle, TxStage};
pub use transport::{HttpTransport, Transport};

pub use aptkit_types as types;
