use std::net::SocketAddr;

use anyhow::Result;
use axum::{
    Json, Router,
    extract::Path,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use rust_decimal::Decimal;
use serde_json::json;
use token_explorer::{
    error::AppError,
    implementations::pricing::{FunkitClient, PricingService},
};
use tokio::net::TcpListener;

const API_KEY: &str = "test-key";

fn authorised(headers: &HeaderMap) -> bool {
    headers.get("x-api-key").and_then(|v| v.to_str().ok()) == Some(API_KEY)
}

async fn asset(headers: HeaderMap, Path((chain, symbol)): Path<(String, String)>) -> Response {
    if !authorised(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    match (chain.as_str(), symbol.as_str()) {
        ("1", "USDC") => Json(json!({
            "address": "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48",
            "chain": "1",
            "decimals": 6,
            "name": "USD Coin",
            "symbol": "USDC",
        }))
        .into_response(),
        ("1", "BAD") => Json(json!({"address": 42})).into_response(),
        _ => (StatusCode::NOT_FOUND, "asset not found").into_response(),
    }
}

async fn price(headers: HeaderMap, Path((_chain, address)): Path<(String, String)>) -> Response {
    if !authorised(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if address == "0xzero" {
        return Json(json!({"unitPrice": 0})).into_response();
    }
    Json(json!({"unitPrice": 0.9998, "amount": 1, "total": 0.9998})).into_response()
}

async fn allowed(headers: HeaderMap) -> Response {
    if !authorised(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    // Keys deliberately not in numeric order.
    Json(json!({
        "8453": ["0xbase1"],
        "1": ["0xeth1", "0xeth2"],
        "10": null,
    }))
    .into_response()
}

async fn spawn_provider() -> SocketAddr {
    let app = Router::new()
        .route("/v1/asset/erc20/{chain}/{symbol}", get(asset))
        .route("/v1/asset/erc20/price/{chain}/{address}", get(price))
        .route("/v1/allow/assets", get(allowed));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn client(api_key: &str) -> FunkitClient {
    let addr = spawn_provider().await;
    FunkitClient::new(&format!("http://{addr}/v1"), api_key).unwrap()
}

#[tokio::test]
async fn resolves_token_and_price() -> Result<()> {
    let client = client(API_KEY).await;

    let token = client.resolve_token("1", "USDC").await?;
    assert_eq!(token.symbol, "USDC");
    assert_eq!(token.decimals, 6);

    let price = client.fetch_price("1", &token.address).await?;
    assert_eq!(price.unit_price, Decimal::new(9998, 4));
    assert!(price.unit_price > Decimal::ZERO);
    Ok(())
}

#[tokio::test]
async fn unknown_symbol_is_a_provider_error() {
    let client = client(API_KEY).await;
    let err = client.resolve_token("1", "NOPE").await.unwrap_err();
    assert!(matches!(err, AppError::Provider(msg) if msg.contains("404")));
}

#[tokio::test]
async fn wrong_key_is_a_provider_error() {
    let client = client("other-key").await;
    let err = client.list_allowed_addresses().await.unwrap_err();
    assert!(matches!(err, AppError::Provider(_)));
}

#[tokio::test]
async fn malformed_bodies_are_schema_errors() {
    let client = client(API_KEY).await;

    let err = client.resolve_token("1", "BAD").await.unwrap_err();
    assert!(matches!(err, AppError::Schema(_)));

    let err = client.fetch_price("1", "0xzero").await.unwrap_err();
    assert!(matches!(err, AppError::Schema(_)));
}

#[tokio::test]
async fn allow_list_keeps_provider_order() -> Result<()> {
    let client = client(API_KEY).await;
    let allowed = client.list_allowed_addresses().await?;

    assert_eq!(allowed.chain_ids(), vec!["8453", "1", "10"]);
    assert_eq!(allowed.addresses_for("1"), ["0xeth1", "0xeth2"]);
    assert!(allowed.addresses_for("10").is_empty());
    Ok(())
}
