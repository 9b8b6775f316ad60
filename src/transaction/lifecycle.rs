//! Staged driver for a single transaction.

use aptkit_types::{SignedTransaction, SigningMessage, TransactionRecord, UnsignedTransaction};
use tracing::{debug, info};

use super::protocol::sign_message;
use crate::account::Account;
use crate::client::AptClient;
use crate::error::{AptError, AptResult};
use crate::transport::Transport;

/// Where a transaction is in its exchange with the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStage {
    Built,
    MessageRequested,
    Signed,
    Submitted,
    Simulated,
    Finalized,
    Failed,
}

impl TxStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Built => "built",
            Self::MessageRequested => "message_requested",
            Self::Signed => "signed",
            Self::Submitted => "submitted",
            Self::Simulated => "simulated",
            Self::Finalized => "finalized",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TxStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One transaction moving through
/// `Built -> MessageRequested -> Signed -> {Submitted | Simulated} -> Finalized`.
///
/// Each step checks the current stage and fails with
/// [`AptError::InvalidStage`] when called out of order. A failed step moves
/// the lifecycle to [`TxStage::Failed`], except a polling timeout, which
/// leaves it `Submitted` so the caller can poll again. A simulated
/// transaction may still be submitted.
#[derive(Debug)]
pub struct TransactionLifecycle {
    stage: TxStage,
    transaction: UnsignedTransaction,
    message: Option<SigningMessage>,
    signed: Option<SignedTransaction>,
    record: Option<TransactionRecord>,
}

impl TransactionLifecycle {
    pub fn new(transaction: UnsignedTransaction) -> Self {
        Self {
            stage: TxStage::Built,
            transaction,
            message: None,
            signed: None,
            record: None,
        }
    }

    pub fn stage(&self) -> TxStage {
        self.stage
    }

    pub fn transaction(&self) -> &UnsignedTransaction {
        &self.transaction
    }

    pub fn signing_message(&self) -> Option<&SigningMessage> {
        self.message.as_ref()
    }

    pub fn signed(&self) -> Option<&SignedTransaction> {
        self.signed.as_ref()
    }

    /// The submitted record, replaced by the committed one once final.
    pub fn record(&self) -> Option<&TransactionRecord> {
        self.record.as_ref()
    }

    fn require_stage(&self, allowed: &[TxStage], expected: &'static str) -> AptResult<()> {
        if allowed.contains(&self.stage) {
            Ok(())
        } else {
            Err(AptError::InvalidStage {
                expected,
                actual: self.stage.as_str(),
            })
        }
    }

    fn advance(&mut self, next: TxStage) {
        debug!(from = %self.stage, to = %next, "Transaction stage");
        self.stage = next;
    }

    fn fail(&mut self, err: AptError) -> AptError {
        self.advance(TxStage::Failed);
        err
    }

    pub async fn request_message<T: Transport>(
        &mut self,
        client: &AptClient<T>,
    ) -> AptResult<&SigningMessage> {
        self.require_stage(&[TxStage::Built], "built")?;
        match client.signing_message(&self.transaction).await {
            Ok(message) => {
                self.advance(TxStage::MessageRequested);
                Ok(&*self.message.insert(message))
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    pub fn sign(&mut self, account: &Account) -> AptResult<&SignedTransaction> {
        self.require_stage(&[TxStage::MessageRequested], "message_requested")?;
        let Some(message) = self.message.as_ref() else {
            return Err(self.fail(AptError::InvalidStage {
                expected: "message_requested",
                actual: "built",
            }));
        };
        match sign_message(account, self.transaction.clone(), message) {
            Ok(signed) => {
                self.advance(TxStage::Signed);
                Ok(&*self.signed.insert(signed))
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn signed_transaction(&self) -> AptResult<&SignedTransaction> {
        self.signed.as_ref().ok_or(AptError::InvalidStage {
            expected: "signed",
            actual: self.stage.as_str(),
        })
    }

    pub async fn submit<T: Transport>(
        &mut self,
        client: &AptClient<T>,
    ) -> AptResult<&TransactionRecord> {
        self.require_stage(&[TxStage::Signed, TxStage::Simulated], "signed")?;
        let result = client.submit(self.signed_transaction()?).await;
        match result {
            Ok(record) => {
                self.advance(TxStage::Submitted);
                Ok(&*self.record.insert(record))
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Dry-run the signed transaction. Simulation never finalizes.
    pub async fn simulate<T: Transport>(
        &mut self,
        client: &AptClient<T>,
    ) -> AptResult<Vec<TransactionRecord>> {
        self.require_stage(&[TxStage::Signed, TxStage::Simulated], "signed")?;
        let result = client.simulate(self.signed_transaction()?).await;
        match result {
            Ok(records) => {
                self.advance(TxStage::Simulated);
                Ok(records)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Poll until the submitted transaction is final and return its success
    /// flag.
    pub async fn wait<T: Transport>(
        &mut self,
        client: &AptClient<T>,
        max_attempts: u32,
    ) -> AptResult<bool> {
        self.require_stage(&[TxStage::Submitted], "submitted")?;
        let hash = match self.record.as_ref() {
            Some(record) => record.hash.clone(),
            None => {
                return Err(self.fail(AptError::InvalidStage {
                    expected: "submitted",
                    actual: self.stage.as_str(),
                }))
            }
        };

        match client.wait_for_record(&hash, max_attempts).await {
            Ok(record) => {
                let success = record.success;
                self.record = Some(record);
                self.advance(TxStage::Finalized);
                info!(hash = %hash, success, "Lifecycle finalized");
                Ok(success)
            }
            Err(e @ AptError::Timeout { .. }) => Err(e),
            Err(e) => Err(self.fail(e)),
        }
    }
}
