//! Transaction construction and the signing protocol.
//!
//! The node computes the canonical signing message for a transaction; the
//! client only signs the digest it is handed. [`TransactionLifecycle`] drives
//! one transaction through the exchange stage by stage, while the methods on
//! [`AptClient`](crate::client::AptClient) expose each exchange directly.

mod builder;
mod lifecycle;
mod protocol;

pub use builder::{
    coin_transfer, entry_function, TransactionBuilder, APTOS_COIN, COIN_TRANSFER_FUNCTION,
};
pub use lifecycle::{TransactionLifecycle, TxStage};
pub use protocol::{decode_digest, parse_signing_message, sign_message, POLL_INTERVAL};
