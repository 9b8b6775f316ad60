//! reqwest transport against a mock node.

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use aptkit::{AppConfig, AptClient, AptError, HttpTransport, Transport};

const ADDRESS: &str = "0x4242424242424242424242424242424242424242424242424242424242424242";

async fn client(server: &MockServer) -> AptClient {
    let config = AppConfig::for_node(format!("{}/v1/", server.uri()));
    AptClient::from_config(&config).unwrap()
}

#[tokio::test]
async fn error_status_body_is_returned_to_caller() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/transactions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "Invalid transaction: INVALID_SIGNATURE",
            "error_code": "vm_error",
            "vm_error_code": 1
        })))
        .mount(&server)
        .await;

    let config = AppConfig::for_node(format!("{}/v1", server.uri()));
    let transport = HttpTransport::new(&config.node).unwrap();
    let body = transport
        .post("/transactions", &json!({"sender": ADDRESS}))
        .await
        .unwrap();
    assert!(body.contains("INVALID_SIGNATURE"));
}

#[tokio::test]
async fn balance_reads_coin_store() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(format!(
            "^/v1/accounts/{ADDRESS}/resource/0x1::coin::CoinStore"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin>",
            "data": {
                "coin": { "value": "150000000" },
                "frozen": false
            }
        })))
        .mount(&server)
        .await;

    let client = client(&server).await;
    assert_eq!(client.balance(ADDRESS).await.unwrap(), 150_000_000);
}

#[tokio::test]
async fn not_found_envelope_becomes_rpc_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/transactions/by_hash/0xdead"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Transaction not found by Transaction hash(0xdead)",
            "error_code": "transaction_not_found",
            "vm_error_code": null
        })))
        .mount(&server)
        .await;

    let client = client(&server).await;
    let err = client.transaction_by_hash("0xdead").await.unwrap_err();
    assert!(matches!(err, AptError::Rpc(ref m) if m.contains("not found")));
}

#[tokio::test]
async fn signing_message_request_uses_decimal_strings() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/transactions/encode_submission"))
        .and(body_partial_json(json!({
            "sequence_number": "3",
            "gas_unit_price": "100"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("0x0102")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server).await;
    let account = aptkit::Account::generate();
    let tx = client
        .transaction_builder(account.address())
        .sequence_number(3)
        .payload(aptkit::transaction::coin_transfer(&account.address(), 1))
        .build();

    let message = client.signing_message(&tx).await.unwrap();
    assert_eq!(message.message, "0x0102");
}

#[tokio::test]
async fn ledger_info_decodes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "chain_id": 2,
            "epoch": "5021",
            "ledger_version": "891203",
            "oldest_ledger_version": "0",
            "ledger_timestamp": "1700000000000000",
            "node_role": "full_node",
            "oldest_block_height": "0",
            "block_height": "401200"
        })))
        .mount(&server)
        .await;

    let client = client(&server).await;
    let info = client.ledger_info().await.unwrap();
    assert_eq!(info.chain_id, 2);
    assert_eq!(info.ledger_version, 891_203);
}

#[tokio::test]
async fn unreachable_node_is_a_transport_error() {
    let mut config = AppConfig::for_node("http://127.0.0.1:9/v1");
    config.node.max_retries = 0;
    config.node.timeout_secs = 2;
    let client = AptClient::from_config(&config).unwrap();

    let err = client.ledger_info().await.unwrap_err();
    assert!(matches!(err, AptError::Http(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn healthy_node_message_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/-/healthy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "aptos-node:ok"
        })))
        .mount(&server)
        .await;

    let client = client(&server).await;
    let health = client.node_health(None).await.unwrap();
    assert_eq!(health.message, "aptos-node:ok");
}
