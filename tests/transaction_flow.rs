//! End-to-end signing protocol tests against an in-memory node.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use aptkit::transaction::{coin_transfer, TxStage};
use aptkit::{
    derive_account, Account, AccountAddress, AppConfig, AptClient, AptError, AptResult, ErrorKind,
    KeyDeriver, Transport,
};

const MNEMONIC: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
const DIGEST: &str = "0xb5e97db07fa0bd0e5598aa3643a9bc6f6693bddc1a9fec9e674a461eaa00b193";
const TX_HASH: &str = "0x6a1dbf3c5e2c6e9a2f0b0e3a4a0f0d9e8b7c6a5f4e3d2c1b0a9f8e7d6c5b4a39";

/// Scripted node: each `METHOD path` key holds a queue of bodies. The last
/// body of a queue is repeated once the others are used up.
#[derive(Default)]
struct FakeNode {
    routes: Mutex<HashMap<String, VecDeque<String>>>,
    requests: Mutex<Vec<(String, Option<Value>)>>,
}

impl FakeNode {
    fn respond(&self, route: &str, body: impl Into<String>) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .entry(route.to_string())
            .or_default()
            .push_back(body.into());
        self
    }

    fn requests(&self) -> Vec<(String, Option<Value>)> {
        self.requests.lock().unwrap().clone()
    }

    fn count(&self, route: &str) -> usize {
        self.requests().iter().filter(|(r, _)| r == route).count()
    }

    fn reply(&self, route: String, body: Option<Value>) -> AptResult<String> {
        self.requests.lock().unwrap().push((route.clone(), body));
        let mut routes = self.routes.lock().unwrap();
        let queue = routes
            .get_mut(&route)
            .ok_or_else(|| AptError::rpc(format!("no route for {route}")))?;
        let next = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        next.ok_or_else(|| AptError::rpc(format!("no body for {route}")))
    }
}

#[async_trait]
impl Transport for FakeNode {
    async fn get(&self, path: &str) -> AptResult<String> {
        self.reply(format!("GET {path}"), None)
    }

    async fn post(&self, path: &str, body: &Value) -> AptResult<String> {
        self.reply(format!("POST {path}"), Some(body.clone()))
    }
}

fn client(node: &Arc<FakeNode>) -> AptClient<Arc<FakeNode>> {
    AptClient::with_transport(Arc::clone(node), &AppConfig::for_node("http://fake.node/v1"))
}

fn mnemonic_account() -> Account {
    derive_account(MNEMONIC, 0).unwrap()
}

fn receiver() -> AccountAddress {
    AccountAddress::new([0x42; 32])
}

fn transfer_tx(client: &AptClient<Arc<FakeNode>>, account: &Account) -> aptkit::types::UnsignedTransaction {
    client
        .transaction_builder(account.address())
        .sequence_number(5)
        .max_gas_amount(10)
        .gas_unit_price(1)
        .payload(coin_transfer(&receiver(), 100))
        .build()
}

fn pending_record() -> String {
    json!({
        "type": "pending_transaction",
        "hash": TX_HASH,
        "sender": "0x1",
        "sequence_number": "5"
    })
    .to_string()
}

fn committed_record(success: bool) -> String {
    let vm_status = if success { "Executed successfully" } else { "Move abort" };
    json!({
        "type": "user_transaction",
        "hash": TX_HASH,
        "version": "1024",
        "success": success,
        "vm_status": vm_status,
        "gas_used": "7"
    })
    .to_string()
}

fn by_hash() -> String {
    format!("GET /transactions/by_hash/{TX_HASH}")
}

#[tokio::test]
async fn signed_transfer_verifies_against_node_digest() {
    let node = Arc::new(FakeNode::default());
    node.respond("POST /transactions/encode_submission", format!("\"{DIGEST}\""));
    let client = client(&node);
    let account = mnemonic_account();

    let tx = transfer_tx(&client, &account);
    let signed = client.sign_transaction(&account, &tx).await.unwrap();

    let digest = hex::decode(DIGEST.trim_start_matches("0x")).unwrap();
    let signature = hex::decode(signed.signature.signature.trim_start_matches("0x")).unwrap();
    assert!(account.verify(&signature, &digest));
    assert_eq!(signed.signature.scheme, "ed25519_signature");
    assert_eq!(signed.transaction, tx);

    // numerics travel as decimal strings
    let requests = node.requests();
    let (_, body) = &requests[0];
    let body = body.as_ref().unwrap();
    assert_eq!(body["sequence_number"], json!("5"));
    assert_eq!(body["max_gas_amount"], json!("10"));
    assert_eq!(body["gas_unit_price"], json!("1"));
    assert_eq!(body["payload"]["function"], json!("0x1::coin::transfer"));
    assert_eq!(body["sender"], json!(account.address().to_string()));
}

#[tokio::test(start_paused = true)]
async fn lifecycle_runs_to_finalized() {
    let node = Arc::new(FakeNode::default());
    node.respond("POST /transactions/encode_submission", format!("\"{DIGEST}\""))
        .respond("POST /transactions", pending_record())
        .respond(&by_hash(), pending_record())
        .respond(&by_hash(), committed_record(true));
    let client = client(&node);
    let account = mnemonic_account();

    let mut lifecycle = client.lifecycle(transfer_tx(&client, &account));
    lifecycle.request_message(&client).await.unwrap();
    assert_eq!(lifecycle.stage(), TxStage::MessageRequested);

    lifecycle.sign(&account).unwrap();
    assert_eq!(lifecycle.stage(), TxStage::Signed);

    let pending = lifecycle.submit(&client).await.unwrap();
    assert!(pending.is_pending());
    assert_eq!(lifecycle.stage(), TxStage::Submitted);

    assert!(lifecycle.wait(&client, 5).await.unwrap());
    assert_eq!(lifecycle.stage(), TxStage::Finalized);
    assert_eq!(lifecycle.record().unwrap().version.as_deref(), Some("1024"));
    assert_eq!(node.count(&by_hash()), 2);
}

#[tokio::test]
async fn lifecycle_rejects_out_of_order_calls() {
    let node = Arc::new(FakeNode::default());
    let client = client(&node);
    let account = mnemonic_account();

    let mut lifecycle = client.lifecycle(transfer_tx(&client, &account));
    let err = lifecycle.submit(&client).await.unwrap_err();
    assert!(matches!(err, AptError::InvalidStage { expected: "signed", actual: "built" }));
    assert_eq!(err.kind(), ErrorKind::Classification);
    assert!(node.requests().is_empty());
}

#[tokio::test]
async fn submit_error_envelope_is_protocol_error() {
    let node = Arc::new(FakeNode::default());
    node.respond("POST /transactions/encode_submission", format!("\"{DIGEST}\""))
        .respond(
            "POST /transactions",
            r#"{"message":"Invalid transaction: Type: Validation Code: SEQUENCE_NUMBER_TOO_OLD","error_code":"vm_error","vm_error_code":3}"#,
        );
    let client = client(&node);
    let account = mnemonic_account();

    let mut lifecycle = client.lifecycle(transfer_tx(&client, &account));
    lifecycle.request_message(&client).await.unwrap();
    lifecycle.sign(&account).unwrap();
    let err = lifecycle.submit(&client).await.unwrap_err();

    match &err {
        AptError::Rpc(message) => assert!(message.contains("SEQUENCE_NUMBER_TOO_OLD")),
        other => panic!("expected rpc error, got {other:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert!(!err.is_retryable());
    assert_eq!(lifecycle.stage(), TxStage::Failed);
}

#[tokio::test(start_paused = true)]
async fn polling_a_pending_transaction_times_out() {
    let node = Arc::new(FakeNode::default());
    node.respond(&by_hash(), pending_record());
    let client = client(&node);

    let err = client.poll_until_final(TX_HASH, 3).await.unwrap_err();
    assert!(matches!(err, AptError::Timeout { ref hash, attempts: 3 } if hash == TX_HASH));
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(node.count(&by_hash()), 3);
}

#[tokio::test(start_paused = true)]
async fn timeout_leaves_lifecycle_submitted() {
    let node = Arc::new(FakeNode::default());
    node.respond("POST /transactions/encode_submission", format!("\"{DIGEST}\""))
        .respond("POST /transactions", pending_record())
        .respond(&by_hash(), pending_record());
    let client = client(&node);
    let account = mnemonic_account();

    let mut lifecycle = client.lifecycle(transfer_tx(&client, &account));
    lifecycle.request_message(&client).await.unwrap();
    lifecycle.sign(&account).unwrap();
    lifecycle.submit(&client).await.unwrap();

    let err = lifecycle.wait(&client, 2).await.unwrap_err();
    assert!(matches!(err, AptError::Timeout { .. }));
    assert_eq!(lifecycle.stage(), TxStage::Submitted);
}

#[tokio::test(start_paused = true)]
async fn not_found_while_polling_counts_as_pending() {
    let node = Arc::new(FakeNode::default());
    node.respond(
        &by_hash(),
        r#"{"message":"Transaction not found","error_code":"transaction_not_found"}"#,
    )
    .respond(&by_hash(), committed_record(false));
    let client = client(&node);

    assert!(!client.poll_until_final(TX_HASH, 4).await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn rejected_lookup_while_polling_is_rpc_error() {
    let node = Arc::new(FakeNode::default());
    let route = "GET /transactions/by_hash/0xnothex";
    node.respond(
        route,
        r#"{"message":"failed to parse path `txn_hash`: invalid hex","error_code":"web_framework_error"}"#,
    );
    let client = client(&node);

    let err = client.poll_until_final("0xnothex", 3).await.unwrap_err();
    assert!(matches!(err, AptError::Rpc(ref m) if m.contains("invalid hex")));
    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert_eq!(node.count(route), 1);
}

#[tokio::test]
async fn missing_payload_fails_before_network() {
    let node = Arc::new(FakeNode::default());
    let client = client(&node);
    let account = mnemonic_account();

    let tx = client
        .transaction_builder(account.address())
        .sequence_number(5)
        .build();
    let err = client.sign_transaction(&account, &tx).await.unwrap_err();

    assert!(matches!(err, AptError::PayloadMissing));
    assert!(node.requests().is_empty());
}

#[tokio::test]
async fn signing_message_without_prefix_is_malformed() {
    let node = Arc::new(FakeNode::default());
    node.respond("POST /transactions/encode_submission", "\"b5e97db07fa0bd0e\"");
    let client = client(&node);
    let account = mnemonic_account();

    let err = client
        .sign_transaction(&account, &transfer_tx(&client, &account))
        .await
        .unwrap_err();
    assert!(matches!(err, AptError::MalformedResponse(_)));
}

#[tokio::test]
async fn foreign_sender_is_rejected() {
    let node = Arc::new(FakeNode::default());
    let client = client(&node);
    let signer = mnemonic_account();
    let other = derive_account(MNEMONIC, 1).unwrap();

    let err = client
        .sign_transaction(&signer, &transfer_tx(&client, &other))
        .await
        .unwrap_err();
    assert!(matches!(err, AptError::InvalidArgument(_)));
    assert!(node.requests().is_empty());
}

#[tokio::test]
async fn simulation_does_not_finalize() {
    let node = Arc::new(FakeNode::default());
    node.respond("POST /transactions/encode_submission", format!("\"{DIGEST}\""))
        .respond("POST /transactions/simulate", format!("[{}]", committed_record(true)))
        .respond("POST /transactions", pending_record());
    let client = client(&node);
    let account = mnemonic_account();

    let mut lifecycle = client.lifecycle(transfer_tx(&client, &account));
    lifecycle.request_message(&client).await.unwrap();
    lifecycle.sign(&account).unwrap();

    let simulated = lifecycle.simulate(&client).await.unwrap();
    assert_eq!(simulated.len(), 1);
    assert_eq!(simulated[0].gas_used(), Some(7));
    assert_eq!(lifecycle.stage(), TxStage::Simulated);

    let err = lifecycle.wait(&client, 1).await.unwrap_err();
    assert!(matches!(err, AptError::InvalidStage { .. }));

    lifecycle.submit(&client).await.unwrap();
    assert_eq!(lifecycle.stage(), TxStage::Submitted);
}

#[tokio::test]
async fn batch_failure_is_one_aggregate_error() {
    let node = Arc::new(FakeNode::default());
    node.respond("POST /transactions/encode_submission", format!("\"{DIGEST}\""))
        .respond(
            "POST /transactions/batch",
            r#"{"transaction_failures":[{"error":{"message":"SEQUENCE_NUMBER_TOO_NEW","error_code":"vm_error"},"transaction_index":1}]}"#,
        );
    let client = client(&node);
    let account = mnemonic_account();

    let first = transfer_tx(&client, &account);
    let mut second = first.clone();
    second.sequence_number = 6;
    let signed = vec![
        client.sign_transaction(&account, &first).await.unwrap(),
        client.sign_transaction(&account, &second).await.unwrap(),
    ];

    let err = client.submit_batch(&signed).await.unwrap_err();
    match err {
        AptError::BatchRejected(message) => {
            assert_eq!(message, "transaction 1: SEQUENCE_NUMBER_TOO_NEW")
        }
        other => panic!("expected batch rejection, got {other:?}"),
    }

    let requests = node.requests();
    let (route, body) = requests.last().unwrap();
    assert_eq!(route, "POST /transactions/batch");
    let body = body.as_ref().unwrap();
    assert_eq!(body["0"]["sequence_number"], json!("5"));
    assert_eq!(body["1"]["sequence_number"], json!("6"));
}

#[tokio::test]
async fn batch_of_records_is_returned() {
    let node = Arc::new(FakeNode::default());
    node.respond("POST /transactions/encode_submission", format!("\"{DIGEST}\""))
        .respond("POST /transactions/batch", format!("[{}]", pending_record()));
    let client = client(&node);
    let account = mnemonic_account();

    let signed = client
        .sign_transaction(&account, &transfer_tx(&client, &account))
        .await
        .unwrap();
    let records = client.submit_batch(&[signed]).await.unwrap();
    assert_eq!(records.len(), 1);
    assert!(client.submit_batch(&[]).await.is_err());
}

#[tokio::test]
async fn transfer_reads_sequence_number_and_submits() {
    let account = mnemonic_account();
    let resource_route = format!(
        "GET /accounts/{}/resource/0x1::account::Account",
        account.address()
    );
    let node = Arc::new(FakeNode::default());
    node.respond(
        &resource_route,
        r#"{"type":"0x1::account::Account","data":{"sequence_number":"12","authentication_key":"0x00"}}"#,
    )
    .respond("POST /transactions/encode_submission", format!("\"{DIGEST}\""))
    .respond("POST /transactions", pending_record());
    let client = client(&node);

    let pending = client
        .transfer(&account, &receiver().to_string(), 250)
        .await
        .unwrap();
    assert_eq!(pending.hash, TX_HASH);

    let requests = node.requests();
    let (_, submitted) = requests.last().unwrap();
    let submitted = submitted.as_ref().unwrap();
    assert_eq!(submitted["sequence_number"], json!("12"));
    assert_eq!(submitted["payload"]["arguments"][1], json!("250"));
    assert_eq!(submitted["signature"]["public_key"], json!(account.public_key_hex()));
}

#[test]
fn mnemonic_operation_on_private_key_is_a_mismatch() {
    let exported = Account::generate().private_key_base58();
    let deriver = KeyDeriver::classify(&exported);
    let err = deriver.from_mnemonic(0).unwrap_err();
    assert!(matches!(err, AptError::KeyTypeMismatch { .. }));
    assert_eq!(err.kind(), ErrorKind::Classification);
}
