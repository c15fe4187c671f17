use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use eth_tx_parser::api::{router, AppState};
use eth_tx_parser::blockchain::{BlockSource, RpcClient};
use eth_tx_parser::models::{Address, Transaction};
use eth_tx_parser::parser::{ChainId, ChainRegistry, EthereumParser};
use eth_tx_parser::storage::LedgerIndex;
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt;

const WATCHED: &str = "0xf977814e90da44bfa03b6295a0616a897441acec";

/// Router over a fresh index; the node endpoint is never contacted by these routes
fn setup_app() -> (Router, Arc<LedgerIndex>) {
    let index = Arc::new(LedgerIndex::new());
    let client: Arc<dyn BlockSource> = Arc::new(RpcClient::new("http://127.0.0.1:8545".to_string()));

    let mut registry = ChainRegistry::new();
    registry.register(ChainId::Ethereum, Arc::new(EthereumParser::new(client, index.clone())));

    let app = router(AppState {
        registry: Arc::new(registry),
    });
    (app, index)
}

async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    (status, json)
}

fn sample_transaction(hash: &str, block_number: &str) -> Transaction {
    Transaction {
        hash: hash.to_string(),
        from: Address::from(WATCHED),
        to: Address::from("0x0000000000000000000000000000000000000001"),
        value: "0xde0b6b3a7640000".to_string(),
        block_number: block_number.to_string(),
    }
}

#[tokio::test]
async fn test_current_block_starts_at_zero() {
    let (app, _) = setup_app();

    let (status, json) = send(&app, "GET", "/blocks/current").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["block_number"], 0);
}

#[tokio::test]
async fn test_current_block_follows_recorded_transactions() {
    let (app, index) = setup_app();
    index.subscribe(Address::from(WATCHED)).unwrap();
    index.record(&Address::from(WATCHED), sample_transaction("h1", "0x4b7"));

    let (status, json) = send(&app, "GET", "/blocks/current").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["block_number"], 1207);
}

#[tokio::test]
async fn test_subscribe_then_conflict() {
    let (app, index) = setup_app();
    let uri = format!("/subscribe?address={}", WATCHED);

    let (status, json) = send(&app, "POST", &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!({}));
    assert!(index.is_watched(&Address::from(WATCHED)));

    let (status, json) = send(&app, "POST", &uri).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "conflict");
}

#[tokio::test]
async fn test_subscribe_is_case_insensitive() {
    let (app, _) = setup_app();

    let (status, _) = send(&app, "POST", "/subscribe?address=0xF977814e90dA44bFA03b6295A0616a897441aceC").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "POST", &format!("/subscribe?address={}", WATCHED)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_subscribe_rejects_invalid_address() {
    let (app, index) = setup_app();

    let padded = format!("/subscribe?address=%20{}", WATCHED);
    let upper_prefix = format!("/subscribe?address=0X{}", &WATCHED[2..]);
    for uri in [
        "/subscribe?address=0x123",
        "/subscribe?address=not-an-address",
        "/subscribe",
        padded.as_str(),
        upper_prefix.as_str(),
    ] {
        let (status, json) = send(&app, "POST", uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(json["error"], "validation_error");
    }
    assert_eq!(index.watched_count(), 0);
}

#[tokio::test]
async fn test_transactions_for_unsubscribed_address() {
    let (app, _) = setup_app();

    let (status, json) = send(&app, "GET", &format!("/transactions?address={}", WATCHED)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");
}

#[tokio::test]
async fn test_transactions_for_invalid_address() {
    let (app, _) = setup_app();

    let (status, json) = send(&app, "GET", "/transactions?address=0xzz").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "validation_error");
}

#[tokio::test]
async fn test_transactions_lists_history_in_order() {
    let (app, index) = setup_app();
    let (status, _) = send(&app, "POST", &format!("/subscribe?address={}", WATCHED)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(&app, "GET", &format!("/transactions?address={}", WATCHED)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!([]));

    index.record(&Address::from(WATCHED), sample_transaction("h1", "0x10"));
    index.record(&Address::from(WATCHED), sample_transaction("h2", "0x11"));

    let (status, json) = send(&app, "GET", &format!("/transactions?address={}", WATCHED)).await;
    assert_eq!(status, StatusCode::OK);

    let transactions = json.as_array().unwrap();
    assert_eq!(transactions.len(), 2);
    assert_eq!(transactions[0]["hash"], "h1");
    assert_eq!(transactions[0]["from"], WATCHED);
    assert_eq!(transactions[0]["blockNumber"], "0x10");
    assert_eq!(transactions[1]["hash"], "h2");
}

#[tokio::test]
async fn test_status_reports_index_size() {
    let (app, index) = setup_app();
    index.subscribe(Address::from(WATCHED)).unwrap();
    index.record(&Address::from(WATCHED), sample_transaction("h1", "0x2a"));

    let (status, json) = send(&app, "GET", "/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["watched_addresses"], 1);
    assert_eq!(json["stored_transactions"], 1);
    assert_eq!(json["last_parsed_block"], "0x2a");
}
