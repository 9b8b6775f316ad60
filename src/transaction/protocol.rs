//! Signing and submission exchanges with the node.

use aptkit_types::{
    ErrorEnvelope, SignedTransaction, SigningMessage, TransactionRecord, TransactionSignature,
    UnsignedTransaction, ED25519_SIGNATURE,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::builder::{coin_transfer, TransactionBuilder};
use super::lifecycle::TransactionLifecycle;
use crate::account::Account;
use crate::address::AccountAddress;
use crate::client::AptClient;
use crate::error::{AptError, AptResult};
use crate::transport::Transport;

/// Interval between finality checks.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<TransactionRecord>),
    One(Box<TransactionRecord>),
}

#[derive(Deserialize)]
struct BatchFailure {
    #[serde(default)]
    error: ErrorEnvelope,
    #[serde(default)]
    transaction_index: u64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BatchResponse {
    Records(Vec<TransactionRecord>),
    Failures {
        transaction_failures: Vec<BatchFailure>,
    },
}

/// Interpret the `encode_submission` response body.
///
/// Success is a `0x`-prefixed string, JSON-quoted or bare; an error envelope
/// is a node rejection and anything else is malformed.
pub fn parse_signing_message(body: &str) -> AptResult<SigningMessage> {
    let body = body.trim();
    if body.is_empty() {
        return Err(AptError::MalformedResponse(
            "empty signing message response".into(),
        ));
    }

    if let Ok(Value::String(message)) = serde_json::from_str::<Value>(body) {
        if message.starts_with("0x") {
            return Ok(SigningMessage { message });
        }
        return Err(AptError::MalformedResponse(format!(
            "signing message without 0x prefix: {message}"
        )));
    }

    if let Some(envelope) = ErrorEnvelope::probe(body) {
        return Err(AptError::rpc(envelope.description()));
    }

    if body.starts_with("0x") && !body.contains(char::is_whitespace) {
        return Ok(SigningMessage {
            message: body.to_string(),
        });
    }

    Err(AptError::MalformedResponse(format!(
        "unexpected signing message response: {body}"
    )))
}

/// Hex-decode the digest carried by a signing message.
pub fn decode_digest(message: &SigningMessage) -> AptResult<Vec<u8>> {
    let digits = message
        .digest_hex()
        .ok_or_else(|| AptError::MalformedResponse(message.message.clone()))?;
    if digits.is_empty() {
        return Err(AptError::DigestDecode("empty digest".into()));
    }
    hex::decode(digits).map_err(|e| AptError::DigestDecode(e.to_string()))
}

/// Sign the node-provided digest and attach the signature to `transaction`.
pub fn sign_message(
    account: &Account,
    transaction: UnsignedTransaction,
    message: &SigningMessage,
) -> AptResult<SignedTransaction> {
    let digest = decode_digest(message)?;
    let signature = account.sign(&digest);

    Ok(SignedTransaction {
        transaction,
        signature: TransactionSignature {
            scheme: ED25519_SIGNATURE.to_string(),
            public_key: account.public_key_hex(),
            signature: format!("0x{}", hex::encode(signature.to_bytes())),
        },
    })
}

fn batch_body(transactions: &[SignedTransaction]) -> AptResult<Value> {
    let mut batch = Map::with_capacity(transactions.len());
    for (index, signed) in transactions.iter().enumerate() {
        batch.insert(index.to_string(), serde_json::to_value(signed)?);
    }
    Ok(Value::Object(batch))
}

fn describe_failures(failures: &[BatchFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("transaction {}: {}", f.transaction_index, f.error.description()))
        .collect::<Vec<_>>()
        .join("; ")
}

impl<T: Transport> AptClient<T> {
    /// Ask the node for the canonical signing message of `transaction`.
    pub async fn signing_message(
        &self,
        transaction: &UnsignedTransaction,
    ) -> AptResult<SigningMessage> {
        if transaction.payload.is_none() {
            return Err(AptError::PayloadMissing);
        }

        let body = serde_json::to_value(transaction)?;
        let response = self
            .transport
            .post(&self.paths.encode_submission, &body)
            .await?;
        parse_signing_message(&response)
    }

    /// Obtain the signing message for `transaction` and sign it with `account`.
    pub async fn sign_transaction(
        &self,
        account: &Account,
        transaction: &UnsignedTransaction,
    ) -> AptResult<SignedTransaction> {
        if transaction.sender != account.address().to_string() {
            return Err(AptError::InvalidArgument(
                "transaction sender is not the signing account",
            ));
        }

        let message = self.signing_message(transaction).await?;
        let signed = sign_message(account, transaction.clone(), &message)?;
        debug!(
            sender = %transaction.sender,
            sequence_number = transaction.sequence_number,
            "Signed transaction"
        );
        Ok(signed)
    }

    pub async fn submit(&self, signed: &SignedTransaction) -> AptResult<TransactionRecord> {
        let body = serde_json::to_value(signed)?;
        let record: TransactionRecord = self.post_json(&self.paths.submit, &body).await?;
        info!(
            hash = %record.hash,
            sender = %signed.transaction.sender,
            sequence_number = signed.transaction.sequence_number,
            "Submitted transaction"
        );
        Ok(record)
    }

    /// Dry-run `signed` without committing state.
    pub async fn simulate(&self, signed: &SignedTransaction) -> AptResult<Vec<TransactionRecord>> {
        let body = serde_json::to_value(signed)?;
        let response: OneOrMany = self.post_json(&self.paths.simulate, &body).await?;
        let records = match response {
            OneOrMany::Many(records) => records,
            OneOrMany::One(record) => vec![*record],
        };
        debug!(count = records.len(), "Simulation returned");
        Ok(records)
    }

    /// Submit several transactions in one request.
    ///
    /// Any rejection fails the whole call with a single error; callers that
    /// need per-transaction status have to submit individually. A node that
    /// only acknowledges the batch yields an empty list.
    pub async fn submit_batch(
        &self,
        transactions: &[SignedTransaction],
    ) -> AptResult<Vec<TransactionRecord>> {
        if transactions.is_empty() {
            return Err(AptError::InvalidArgument("batch is empty"));
        }

        let body = batch_body(transactions)?;
        let response = self.transport.post(&self.paths.batch, &body).await?;
        if let Some(envelope) = ErrorEnvelope::probe(&response) {
            return Err(AptError::BatchRejected(envelope.description()));
        }

        let parsed: BatchResponse = serde_json::from_str(&response)?;
        match parsed {
            BatchResponse::Records(records) => {
                info!(count = records.len(), "Submitted batch");
                Ok(records)
            }
            BatchResponse::Failures {
                transaction_failures,
            } if transaction_failures.is_empty() => {
                info!(count = transactions.len(), "Batch accepted");
                Ok(Vec::new())
            }
            BatchResponse::Failures {
                transaction_failures,
            } => {
                warn!(
                    failed = transaction_failures.len(),
                    total = transactions.len(),
                    "Batch rejected"
                );
                Err(AptError::BatchRejected(describe_failures(
                    &transaction_failures,
                )))
            }
        }
    }

    /// Poll `hash` until it is committed and return the committed record.
    ///
    /// The node's `transaction_not_found` answer (typical right after
    /// submission) counts as still unconfirmed. Any other error envelope is
    /// returned as [`AptError::Rpc`].
    pub async fn wait_for_record(
        &self,
        hash: &str,
        max_attempts: u32,
    ) -> AptResult<TransactionRecord> {
        if max_attempts == 0 {
            return Err(AptError::InvalidArgument("poll attempts must be positive"));
        }
        if hash.is_empty() {
            return Err(AptError::InvalidArgument("transaction hash is empty"));
        }

        let path = self.paths.transaction_by_hash(hash);
        for attempt in 1..=max_attempts {
            let body = self.transport.get(&path).await?;
            match ErrorEnvelope::probe(&body) {
                Some(envelope) if envelope.is_transaction_not_found() => {
                    debug!(hash, attempt, "Transaction not found yet")
                }
                Some(envelope) => {
                    warn!(hash, error_code = ?envelope.error_code, "Lookup rejected");
                    return Err(AptError::rpc(envelope.description()));
                }
                None => {
                    let record: TransactionRecord = serde_json::from_str(&body)?;
                    if !record.is_pending() {
                        info!(
                            hash,
                            version = record.version.as_deref().unwrap_or_default(),
                            success = record.success,
                            "Transaction finalized"
                        );
                        return Ok(record);
                    }
                    debug!(hash, attempt, "Transaction still pending");
                }
            }

            if attempt < max_attempts {
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        }

        warn!(hash, attempts = max_attempts, "Gave up waiting for transaction");
        Err(AptError::Timeout {
            hash: hash.to_string(),
            attempts: max_attempts,
        })
    }

    /// Poll until final and report whether the transaction succeeded.
    ///
    /// `Timeout` means the outcome is unknown, not that it failed.
    pub async fn poll_until_final(&self, hash: &str, max_attempts: u32) -> AptResult<bool> {
        Ok(self.wait_for_record(hash, max_attempts).await?.success)
    }

    /// [`poll_until_final`](Self::poll_until_final) with the configured ceiling.
    pub async fn wait_for_transaction(&self, hash: &str) -> AptResult<bool> {
        self.poll_until_final(hash, self.defaults.poll_attempts)
            .await
    }

    /// A builder for `sender` carrying this client's transaction defaults.
    pub fn transaction_builder(&self, sender: AccountAddress) -> TransactionBuilder {
        TransactionBuilder::new(sender, &self.defaults)
    }

    /// Start a staged lifecycle for `transaction`.
    pub fn lifecycle(&self, transaction: UnsignedTransaction) -> TransactionLifecycle {
        TransactionLifecycle::new(transaction)
    }

    /// Transfer `amount` octas from `account` to `to` and return the pending
    /// record.
    pub async fn transfer(
        &self,
        account: &Account,
        to: &str,
        amount: u64,
    ) -> AptResult<TransactionRecord> {
        let receiver: AccountAddress = to.parse()?;
        let sender = account.address();
        let sequence_number = self.sequence_number(&sender.to_string()).await?;

        let transaction = self
            .transaction_builder(sender)
            .sequence_number(sequence_number)
            .payload(coin_transfer(&receiver, amount))
            .build();

        let signed = self.sign_transaction(account, &transaction).await?;
        self.submit(&signed).await
    }
}
