//! Wire types for the Aptos node REST API.
//!
//! This crate only models the JSON shapes the client reads or writes. Unknown
//! fields in node responses are ignored so newer node versions keep decoding.

pub mod decimal;
pub mod envelope;
pub mod records;
pub mod submission;

pub use envelope::{ErrorEnvelope, StringOrNumber, TRANSACTION_NOT_FOUND};
pub use records::{
    AccountData, AccountResource, Block, Event, EventGuid, GasEstimation, LedgerInfo,
    MoveFunction, MoveModule, MoveModuleBytecode, MoveStruct, NodeHealth, TransactionChange,
    TransactionRecord,
};
pub use submission::{
    EntryFunctionPayload, SignedTransaction, SigningMessage, TransactionPayload,
    TransactionSignature, UnsignedTransaction, ED25519_SIGNATURE,
};
