#![allow(dead_code)]

use std::{
    net::SocketAddr,
    str::FromStr,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use ethers::{
    abi::{self, Token},
    providers::{MockProvider, Provider},
    types::U256,
};
use rust_decimal::Decimal;
use token_explorer::{
    error::{AppError, AppResult},
    implementations::{
        chain::{ChainConfig, ChainMetadataService},
        erc20::{self, Erc20Metadata, MULTICALL3_ADDRESS},
        pricing::{AllowedAssets, PricingService},
    },
    layers::{
        http::HttpServer,
        service::{ServiceContext, ServiceLayer},
    },
    types::{PriceInfo, TokenInfo},
};
use tokio::{net::TcpListener, sync::oneshot};

pub const USDC_ADDRESS: &str = "0xAAA0000000000000000000000000000000000001";
pub const BROKEN_ADDRESS: &str = "0xBBB0000000000000000000000000000000000002";

/// Pricing provider double with a fixed symbol table.
pub struct FakePricing {
    pub allowed: AllowedAssets,
    pub prices: Vec<(&'static str, &'static str, &'static str, Decimal)>,
    pub calls: Mutex<Vec<String>>,
}

impl FakePricing {
    pub fn new(allowed: Vec<(&str, Vec<&str>)>) -> Self {
        Self {
            allowed: AllowedAssets::new(
                allowed
                    .into_iter()
                    .map(|(id, list)| {
                        (id.to_string(), list.into_iter().map(String::from).collect())
                    })
                    .collect(),
            ),
            prices: vec![
                ("1", "USDC", USDC_ADDRESS, Decimal::from_str("0.9999").unwrap()),
                ("8453", "ETH", "0xEEE0000000000000000000000000000000000003", Decimal::from(4)),
            ],
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PricingService for FakePricing {
    async fn resolve_token(&self, chain_id: &str, symbol: &str) -> AppResult<TokenInfo> {
        self.calls.lock().unwrap().push(format!("token {chain_id} {symbol}"));
        self.prices
            .iter()
            .find(|(chain, sym, _, _)| *chain == chain_id && *sym == symbol)
            .map(|(_, sym, address, _)| TokenInfo {
                address: address.to_string(),
                chain: None,
                decimals: 18,
                name: sym.to_string(),
                symbol: sym.to_string(),
            })
            .ok_or_else(|| AppError::Provider(format!("unknown {symbol} on {chain_id}")))
    }

    async fn fetch_price(&self, chain_id: &str, address: &str) -> AppResult<PriceInfo> {
        self.calls.lock().unwrap().push(format!("price {chain_id} {address}"));
        self.prices
            .iter()
            .find(|(chain, _, addr, _)| *chain == chain_id && *addr == address)
            .map(|(_, _, _, price)| PriceInfo {
                unit_price: *price,
                amount: None,
                total: None,
            })
            .ok_or_else(|| AppError::Provider(format!("no price for {address}")))
    }

    async fn list_allowed_addresses(&self) -> AppResult<AllowedAssets> {
        Ok(self.allowed.clone())
    }
}

/// Chain client that runs the real Multicall3 decoding against a mocked JSON-RPC transport.
pub struct MockedChain {
    pub known_chains: Vec<u64>,
    pub multicall_results: Mutex<Option<Vec<Token>>>,
}

impl MockedChain {
    pub fn new(known_chains: Vec<u64>, results: Vec<Token>) -> Self {
        Self {
            known_chains,
            multicall_results: Mutex::new(Some(results)),
        }
    }
}

#[async_trait]
impl ChainMetadataService for MockedChain {
    fn resolve_chain_config(&self, chain_id: u64) -> Option<ChainConfig> {
        self.known_chains.contains(&chain_id).then(|| ChainConfig {
            id: chain_id,
            name: format!("chain {chain_id}"),
            rpc_url: "http://mock".into(),
            multicall_address: *MULTICALL3_ADDRESS,
        })
    }

    async fn batch_read_token_metadata(
        &self,
        chain: &ChainConfig,
        addresses: &[String],
    ) -> AppResult<Vec<Option<Erc20Metadata>>> {
        let results = self
            .multicall_results
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| AppError::ChainRead("no mocked response left".into()))?;

        let mock = MockProvider::new();
        let encoded = abi::encode(&[Token::Array(results)]);
        mock.push::<String, _>(format!("0x{}", hex::encode(encoded)))
            .map_err(|err| AppError::Internal(err.to_string()))?;

        erc20::batch_read_metadata(
            Arc::new(Provider::new(mock)),
            chain.multicall_address,
            addresses,
        )
        .await
    }
}

pub fn ok_string(value: &str) -> Token {
    Token::Tuple(vec![
        Token::Bool(true),
        Token::Bytes(abi::encode(&[Token::String(value.to_string())])),
    ])
}

pub fn ok_uint(value: u64) -> Token {
    Token::Tuple(vec![
        Token::Bool(true),
        Token::Bytes(abi::encode(&[Token::Uint(U256::from(value))])),
    ])
}

pub fn failed() -> Token {
    Token::Tuple(vec![Token::Bool(false), Token::Bytes(vec![])])
}

/// A running API server on an ephemeral port. Dropping it stops the server.
pub struct TestServer {
    pub addr: SocketAddr,
    _shutdown: oneshot::Sender<()>,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

pub async fn spawn_server(
    pricing: Arc<dyn PricingService>,
    chains: Arc<dyn ChainMetadataService>,
) -> TestServer {
    let service = ServiceLayer::new(Arc::new(ServiceContext::new(pricing, chains)));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let shutdown = async move {
            let _ = rx.await;
        };
        HttpServer::new(service).serve(listener, shutdown).await.unwrap();
    });

    TestServer {
        addr,
        _shutdown: tx,
    }
}
