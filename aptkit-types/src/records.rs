//! Records returned by the read endpoints and by submission/simulation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeHealth {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LedgerInfo {
    pub chain_id: u8,
    pub epoch: String,
    #[serde(with = "crate::decimal")]
    pub ledger_version: u64,
    pub oldest_ledger_version: String,
    #[serde(with = "crate::decimal")]
    pub ledger_timestamp: u64,
    pub node_role: String,
    #[serde(default)]
    pub block_height: Option<String>,
    #[serde(default)]
    pub git_hash: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Block {
    pub block_height: String,
    pub block_hash: String,
    pub block_timestamp: String,
    pub first_version: String,
    pub last_version: String,
    #[serde(default)]
    pub transactions: Option<Vec<TransactionRecord>>,
}

/// `GET /accounts/{address}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountData {
    #[serde(with = "crate::decimal")]
    pub sequence_number: u64,
    pub authentication_key: String,
}

/// A Move resource stored under an account. `data` mirrors the resource's
/// struct layout, which depends on `resource_type`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub data: Value,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MoveModuleBytecode {
    pub bytecode: String,
    #[serde(default)]
    pub abi: Option<MoveModule>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MoveModule {
    pub address: String,
    pub name: String,
    #[serde(default)]
    pub friends: Vec<String>,
    #[serde(default)]
    pub exposed_functions: Vec<MoveFunction>,
    #[serde(default)]
    pub structs: Vec<MoveStruct>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MoveFunction {
    pub name: String,
    pub visibility: String,
    #[serde(default)]
    pub is_entry: bool,
    #[serde(default)]
    pub generic_type_params: Vec<Value>,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(rename = "return", default)]
    pub returns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MoveStruct {
    pub name: String,
    #[serde(default)]
    pub is_native: bool,
    #[serde(default)]
    pub abilities: Vec<String>,
    #[serde(default)]
    pub generic_type_params: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventGuid {
    pub creation_number: String,
    pub account_address: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Event {
    #[serde(default)]
    pub guid: Option<EventGuid>,
    #[serde(default)]
    pub key: Option<String>,
    pub sequence_number: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransactionChange {
    #[serde(rename = "type")]
    pub change_type: String,
    #[serde(default)]
    pub state_key_hash: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub resource: Option<String>,
}

/// A transaction as reported by the node: pending, committed or simulated.
///
/// Committed-only fields are optional because a pending record carries none
/// of them.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TransactionRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub hash: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub vm_status: Option<String>,
    #[serde(default)]
    pub gas_used: Option<String>,
    #[serde(default)]
    pub state_change_hash: Option<String>,
    #[serde(default)]
    pub event_root_hash: Option<String>,
    #[serde(default)]
    pub accumulator_root_hash: Option<String>,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub sequence_number: Option<String>,
    #[serde(default)]
    pub max_gas_amount: Option<String>,
    #[serde(default)]
    pub gas_unit_price: Option<String>,
    #[serde(default)]
    pub expiration_timestamp_secs: Option<String>,
    /// Node-rendered payload; may be any payload kind, not only the ones this
    /// client can build.
    #[serde(default)]
    pub payload: Option<Value>,
    #[serde(default)]
    pub signature: Option<Value>,
    #[serde(default)]
    pub changes: Vec<TransactionChange>,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl TransactionRecord {
    pub const PENDING: &'static str = "pending_transaction";

    /// A record is unconfirmed while it is pending or has no committed version
    /// (absent, empty or the `"0"` sentinel).
    pub fn is_pending(&self) -> bool {
        self.kind == Self::PENDING
            || matches!(self.version.as_deref(), None | Some("") | Some("0"))
    }

    pub fn gas_used(&self) -> Option<u64> {
        self.gas_used.as_deref().and_then(|g| g.parse().ok())
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct GasEstimation {
    pub gas_estimate: u64,
    #[serde(default)]
    pub deprioritized_gas_estimate: Option<u64>,
    #[serde(default)]
    pub prioritized_gas_estimate: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_record_is_unconfirmed() {
        let rec: TransactionRecord = serde_json::from_str(
            r#"{"type":"pending_transaction","hash":"0xaa","sender":"0x1","sequence_number":"3"}"#,
        )
        .unwrap();
        assert!(rec.is_pending());
    }

    #[test]
    fn committed_record() {
        let rec: TransactionRecord = serde_json::from_str(
            r#"{"type":"user_transaction","hash":"0xaa","version":"1234","success":true,
                "vm_status":"Executed successfully","gas_used":"9",
                "changes":[{"type":"write_resource","address":"0x1","state_key_hash":"0x2"}],
                "payload":{"type":"script_payload","code":{}}}"#,
        )
        .unwrap();
        assert!(!rec.is_pending());
        assert!(rec.success);
        assert_eq!(rec.gas_used(), Some(9));
        assert_eq!(rec.changes.len(), 1);
    }

    #[test]
    fn zero_version_is_sentinel() {
        let rec = TransactionRecord {
            kind: "user_transaction".into(),
            version: Some("0".into()),
            ..Default::default()
        };
        assert!(rec.is_pending());
    }

    #[test]
    fn ledger_info_numeric_strings() {
        let info: LedgerInfo = serde_json::from_str(
            r#"{"chain_id":2,"epoch":"10","ledger_version":"555","oldest_ledger_version":"0",
                "ledger_timestamp":"1700000000000000","node_role":"full_node"}"#,
        )
        .unwrap();
        assert_eq!(info.ledger_version, 555);
        assert_eq!(info.chain_id, 2);
    }
}
