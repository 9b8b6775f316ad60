use thiserror::Error;

/// Error types for key derivation, signing and the node protocol
#[derive(Error, Debug)]
pub enum AptError {
    #[error("Credential mismatch: expected {expected}, got {actual}")]
    KeyTypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Transaction stage mismatch: expected {expected}, currently {actual}")]
    InvalidStage {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("Seed too short: need 32 bytes, decoded {0}")]
    SeedLength(usize),

    #[error("Invalid mnemonic: {0}")]
    Mnemonic(String),

    #[error("Invalid derivation index {0}: must be between 0 and 2^31 - 1")]
    Index(i64),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid address {0:?}: expected 0x followed by 64 hex digits")]
    InvalidAddress(String),

    #[error("Node rejected request: {0}")]
    Rpc(String),

    #[error("Transaction payload is missing")]
    PayloadMissing,

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Signing message is not valid hex: {0}")]
    DigestDecode(String),

    #[error("Batch submission rejected: {0}")]
    BatchRejected(String),

    #[error("Transaction {hash} not final after {attempts} attempts")]
    Timeout { hash: String, attempts: u32 },

    #[error("Response decode error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

/// Broad failure classes callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller used the wrong credential, stage or argument.
    Classification,
    /// The key material cannot produce a keypair.
    Derivation,
    /// Hex, base58 or address text is malformed.
    Encoding,
    /// The node answered with an error or with something unusable.
    Protocol,
    /// Polling ran out of attempts; the outcome is unknown.
    Timeout,
    /// The request never got a response.
    Transport,
}

impl AptError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::KeyTypeMismatch { .. } | Self::InvalidStage { .. } | Self::InvalidArgument(_) => {
                ErrorKind::Classification
            }
            Self::SeedLength(_) | Self::Mnemonic(_) | Self::Index(_) => ErrorKind::Derivation,
            Self::Decode(_) | Self::InvalidAddress(_) => ErrorKind::Encoding,
            Self::Rpc(_)
            | Self::PayloadMissing
            | Self::MalformedResponse(_)
            | Self::DigestDecode(_)
            | Self::BatchRejected(_)
            | Self::Json(_) => ErrorKind::Protocol,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Http(_) | Self::Config(_) => ErrorKind::Transport,
        }
    }

    /// Only transport failures are worth repeating unchanged. A timeout is
    /// ambiguous and left to the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(_))
    }

    pub fn decode<S: Into<String>>(msg: S) -> Self {
        Self::Decode(msg.into())
    }

    pub fn rpc<S: Into<String>>(msg: S) -> Self {
        Self::Rpc(msg.into())
    }
}

/// Result type alias using AptError
pub type AptResult<T> = Result<T, AptError>;
