//! Request bodies for transaction submission.

use serde::{Deserialize, Serialize};

/// Signature scheme tag for single-signer Ed25519 transactions.
pub const ED25519_SIGNATURE: &str = "ed25519_signature";

/// Arguments of an entry function call.
///
/// Arguments are passed as strings; the node converts them according to the
/// function's Move signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFunctionPayload {
    /// Fully qualified `address::module::function`.
    pub function: String,
    #[serde(default)]
    pub type_arguments: Vec<String>,
    #[serde(default)]
    pub arguments: Vec<String>,
}

/// Transaction payload, tagged on the wire by its `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TransactionPayload {
    #[serde(rename = "entry_function_payload")]
    EntryFunction(EntryFunctionPayload),
}

/// A transaction before it has been signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    pub sender: String,
    #[serde(with = "crate::decimal")]
    pub sequence_number: u64,
    #[serde(with = "crate::decimal")]
    pub max_gas_amount: u64,
    #[serde(with = "crate::decimal")]
    pub gas_unit_price: u64,
    #[serde(with = "crate::decimal")]
    pub expiration_timestamp_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<TransactionPayload>,
}

/// The signing message returned by `encode_submission`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningMessage {
    pub message: String,
}

impl SigningMessage {
    /// The hex digits of the digest, if the message carries the `0x` prefix.
    pub fn digest_hex(&self) -> Option<&str> {
        self.message.strip_prefix("0x")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSignature {
    #[serde(rename = "type")]
    pub scheme: String,
    pub public_key: String,
    pub signature: String,
}

/// An [`UnsignedTransaction`] with its signature attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    #[serde(flatten)]
    pub transaction: UnsignedTransaction,
    pub signature: TransactionSignature,
}
