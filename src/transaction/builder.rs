use aptkit_types::{EntryFunctionPayload, TransactionPayload, UnsignedTransaction};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::address::AccountAddress;
use crate::config::TransactionConfig;

pub const COIN_TRANSFER_FUNCTION: &str = "0x1::coin::transfer";
pub const APTOS_COIN: &str = "0x1::aptos_coin::AptosCoin";

/// Entry function call payload.
pub fn entry_function(
    function: impl Into<String>,
    type_arguments: Vec<String>,
    arguments: Vec<String>,
) -> TransactionPayload {
    TransactionPayload::EntryFunction(EntryFunctionPayload {
        function: function.into(),
        type_arguments,
        arguments,
    })
}

/// `0x1::coin::transfer<AptosCoin>(to, amount)`, amount in octas.
pub fn coin_transfer(to: &AccountAddress, amount: u64) -> TransactionPayload {
    entry_function(
        COIN_TRANSFER_FUNCTION,
        vec![APTOS_COIN.to_string()],
        vec![to.to_string(), amount.to_string()],
    )
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Builds an [`UnsignedTransaction`] with gas and expiration defaults taken
/// from [`TransactionConfig`].
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    sender: AccountAddress,
    sequence_number: u64,
    max_gas_amount: u64,
    gas_unit_price: u64,
    expiration_secs: u64,
    expiration_timestamp_secs: Option<u64>,
    payload: Option<TransactionPayload>,
}

impl TransactionBuilder {
    pub fn new(sender: AccountAddress, defaults: &TransactionConfig) -> Self {
        Self {
            sender,
            sequence_number: 0,
            max_gas_amount: defaults.max_gas_amount,
            gas_unit_price: defaults.gas_unit_price,
            expiration_secs: defaults.expiration_secs,
            expiration_timestamp_secs: None,
            payload: None,
        }
    }

    pub fn sequence_number(mut self, sequence_number: u64) -> Self {
        self.sequence_number = sequence_number;
        self
    }

    pub fn max_gas_amount(mut self, max_gas_amount: u64) -> Self {
        self.max_gas_amount = max_gas_amount;
        self
    }

    pub fn gas_unit_price(mut self, gas_unit_price: u64) -> Self {
        self.gas_unit_price = gas_unit_price;
        self
    }

    /// Absolute expiration; overrides the relative default.
    pub fn expiration_timestamp_secs(mut self, timestamp: u64) -> Self {
        self.expiration_timestamp_secs = Some(timestamp);
        self
    }

    pub fn payload(mut self, payload: TransactionPayload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// A missing payload is not rejected here; requesting a signing message
    /// for it fails instead.
    pub fn build(self) -> UnsignedTransaction {
        let expiration = self
            .expiration_timestamp_secs
            .unwrap_or_else(|| unix_now().saturating_add(self.expiration_secs));

        UnsignedTransaction {
            sender: self.sender.to_string(),
            sequence_number: self.sequence_number,
            max_gas_amount: self.max_gas_amount,
            gas_unit_price: self.gas_unit_price,
            expiration_timestamp_secs: expiration,
            payload: self.payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn receiver() -> AccountAddress {
        AccountAddress::new([0x6d; 32])
    }

    #[test]
    fn coin_transfer_payload() {
        let TransactionPayload::EntryFunction(call) = coin_transfer(&receiver(), 100);
        assert_eq!(call.function, "0x1::coin::transfer");
        assert_eq!(call.type_arguments, vec!["0x1::aptos_coin::AptosCoin"]);
        assert_eq!(call.arguments, vec![receiver().to_string(), "100".to_string()]);
    }

    #[test]
    fn builder_applies_defaults() {
        let defaults = TransactionConfig::default();
        let before = unix_now();
        let tx = TransactionBuilder::new(receiver(), &defaults)
            .sequence_number(5)
            .payload(coin_transfer(&receiver(), 1))
            .build();

        assert_eq!(tx.sender, receiver().to_string());
        assert_eq!(tx.sequence_number, 5);
        assert_eq!(tx.max_gas_amount, 2000);
        assert_eq!(tx.gas_unit_price, 100);
        assert!(tx.expiration_timestamp_secs >= before + 600);
    }

    #[test]
    fn explicit_values_win() {
        let tx = TransactionBuilder::new(receiver(), &TransactionConfig::default())
            .max_gas_amount(10)
            .gas_unit_price(1)
            .expiration_timestamp_secs(42)
            .build();

        assert_eq!(tx.max_gas_amount, 10);
        assert_eq!(tx.gas_unit_price, 1);
        assert_eq!(tx.expiration_timestamp_secs, 42);
        assert!(tx.payload.is_none());
    }
}
