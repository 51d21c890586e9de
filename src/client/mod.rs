//! Client side of the explorer: the HTTP client for the endpoint layer, the per-slot price
//! query, the selection state and the two token selectors.

pub mod hook;
pub mod render;
pub mod selection;
pub mod selector;

use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::{
    error::{AppError, AppResult},
    types::{ListTokensParams, TokenPriceOut, TokenPriceParams, TokensOut},
};

/// Calls the explorer's own HTTP endpoints.
#[async_trait]
pub trait ExplorerApi: Send + Sync {
    async fn token_price(&self, chain_id: &str, symbol: &str) -> AppResult<TokenPriceOut>;

    async fn tokens(&self, chain_id: Option<&str>) -> AppResult<TokensOut>;
}

#[derive(Debug, Clone)]
pub struct HttpExplorerClient {
    http: Client,
    base_url: Url,
}

impl HttpExplorerClient {
    pub fn new(base_url: &str) -> AppResult<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|err| AppError::Config(format!("invalid server url {base_url}: {err}")))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            http: Client::new(),
            base_url,
        })
    }

    fn endpoint(&self, path: &str) -> AppResult<Url> {
        self.base_url
            .join(path)
            .map_err(|err| AppError::Internal(format!("failed to build url for {path}: {err}")))
    }
}

#[async_trait]
impl ExplorerApi for HttpExplorerClient {
    async fn token_price(&self, chain_id: &str, symbol: &str) -> AppResult<TokenPriceOut> {
        let response = self
            .http
            .post(self.endpoint("token-price")?)
            .json(&TokenPriceParams::new(chain_id, symbol))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Http(format!("token-price responded with {status}")));
        }
        Ok(response.json().await?)
    }

    async fn tokens(&self, chain_id: Option<&str>) -> AppResult<TokensOut> {
        let params = ListTokensParams {
            chain_id: chain_id.map(str::to_string),
        };
        let response = self
            .http
            .get(self.endpoint("tokens")?)
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Http(format!("tokens responded with {status}")));
        }
        Ok(response.json().await?)
    }
}
