//! The error envelope returned by the node.
//!
//! Node failures do not map cleanly onto HTTP status codes (some gateways
//! answer 200 with an envelope), so every response body has to be probed for
//! this shape before it is decoded as anything else.

use serde::{Deserialize, Serialize};
use std::fmt;

/// `error_code` the node sends when a transaction hash is not (yet) known.
pub const TRANSACTION_NOT_FOUND: &str = "transaction_not_found";

/// A scalar that different API revisions send either as a string or a number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrNumber {
    Text(String),
    Number(i64),
}

impl StringOrNumber {
    /// Whether the value carries information (non-empty text or non-zero number).
    pub fn is_set(&self) -> bool {
        match self {
            Self::Text(s) => !s.is_empty(),
            Self::Number(n) => *n != 0,
        }
    }
}

impl fmt::Display for StringOrNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

/// `{message, error_code, ledger_version}` as sent by the node on failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub error_code: Option<StringOrNumber>,
    #[serde(default)]
    pub ledger_version: Option<StringOrNumber>,
    #[serde(default)]
    pub vm_error_code: Option<i64>,
}

impl ErrorEnvelope {
    /// Returns the envelope if `body` is an error-shaped JSON object.
    ///
    /// Arrays, strings and objects without a message or code are not
    /// envelopes, so a successful record never probes as one.
    pub fn probe(body: &str) -> Option<Self> {
        let envelope: Self = serde_json::from_str(body).ok()?;
        envelope.is_error().then_some(envelope)
    }

    pub fn is_error(&self) -> bool {
        !self.message.is_empty() || self.error_code.as_ref().is_some_and(StringOrNumber::is_set)
    }

    /// Whether the node only reports that the transaction is not known yet.
    pub fn is_transaction_not_found(&self) -> bool {
        matches!(&self.error_code, Some(StringOrNumber::Text(code)) if code == TRANSACTION_NOT_FOUND)
    }

    /// Text propagated to callers: the message, or the code when the node sent
    /// no message.
    pub fn description(&self) -> String {
        match (&self.message, &self.error_code) {
            (m, _) if !m.is_empty() => m.clone(),
            (_, Some(code)) => format!("error code {code}"),
            _ => String::from("unknown node error"),
        }
    }
}
