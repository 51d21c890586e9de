use async_trait::async_trait;
use reqwest::{Client, Url};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::{
    config::AppConfig,
    error::{AppError, AppResult},
    types::{PriceInfo, TokenInfo},
};

const API_KEY_HEADER: &str = "X-Api-Key";
const ERROR_BODY_EXCERPT: usize = 200;

/// Token and price lookups against the remote asset provider.
#[async_trait]
pub trait PricingService: Send + Sync {
    async fn resolve_token(&self, chain_id: &str, symbol: &str) -> AppResult<TokenInfo>;

    async fn fetch_price(&self, chain_id: &str, address: &str) -> AppResult<PriceInfo>;

    async fn list_allowed_addresses(&self) -> AppResult<AllowedAssets>;
}

/// Provider allow-list: chain id to token addresses, in the order the provider sent them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedAssets {
    entries: Vec<(String, Vec<String>)>,
}

impl AllowedAssets {
    pub fn new(entries: Vec<(String, Vec<String>)>) -> Self {
        Self { entries }
    }

    /// Decode the provider payload. A `null` list is kept as a chain without tokens.
    pub fn from_value(value: Value) -> AppResult<Self> {
        let Value::Object(map) = value else {
            return Err(AppError::Schema(
                "allowed assets response is not an object".into(),
            ));
        };

        let mut entries = Vec::with_capacity(map.len());
        for (chain_id, list) in map {
            let addresses = match list {
                Value::Null => Vec::new(),
                Value::Array(items) => items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(address) => Ok(address),
                        other => Err(AppError::Schema(format!(
                            "allowed asset for chain {chain_id} is not a string: {other}"
                        ))),
                    })
                    .collect::<AppResult<Vec<_>>>()?,
                other => {
                    return Err(AppError::Schema(format!(
                        "allowed assets for chain {chain_id} is not a list: {other}"
                    )));
                }
            };
            entries.push((chain_id, addresses));
        }

        Ok(Self { entries })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn chain_ids(&self) -> Vec<String> {
        self.entries.iter().map(|(id, _)| id.clone()).collect()
    }

    pub fn first_chain(&self) -> Option<&str> {
        self.entries.first().map(|(id, _)| id.as_str())
    }

    pub fn addresses_for(&self, chain_id: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(id, _)| id == chain_id)
            .map(|(_, addresses)| addresses.as_slice())
            .unwrap_or(&[])
    }
}

/// HTTP client for the Fun.xyz asset API.
#[derive(Debug, Clone)]
pub struct FunkitClient {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl FunkitClient {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> AppResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AppError::Config("FUNKIT_API_KEY is not set".into()));
        }

        let base_url = Url::parse(base_url)
            .map_err(|err| AppError::Config(format!("invalid funkit base url: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Config(format!(
                "funkit base url cannot carry a path: {base_url}"
            )));
        }

        Ok(Self {
            http: Client::new(),
            base_url,
            api_key,
        })
    }

    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        Self::new(&config.funkit_base_url, config.funkit_api_key.clone())
    }

    /// Append percent-encoded path segments to the base url.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> AppResult<T> {
        let url = self.endpoint(segments);
        debug!(%url, "provider request");

        let response = self
            .http
            .get(url.clone())
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|err| AppError::Provider(format!("request to {url} failed: {err}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| AppError::Provider(format!("failed to read body from {url}: {err}")))?;

        if !status.is_success() {
            let excerpt: String = body.chars().take(ERROR_BODY_EXCERPT).collect();
            return Err(AppError::Provider(format!(
                "{url} responded with {status}: {excerpt}"
            )));
        }

        serde_json::from_str(&body)
            .map_err(|err| AppError::Schema(format!("unexpected response from {url}: {err}")))
    }
}

#[async_trait]
impl PricingService for FunkitClient {
    async fn resolve_token(&self, chain_id: &str, symbol: &str) -> AppResult<TokenInfo> {
        let info: TokenInfo = self
            .get_json(&["asset", "erc20", chain_id, symbol])
            .await?;
        if info.address.trim().is_empty() {
            return Err(AppError::Schema(format!(
                "provider returned no address for {symbol} on chain {chain_id}"
            )));
        }
        Ok(info)
    }

    async fn fetch_price(&self, chain_id: &str, address: &str) -> AppResult<PriceInfo> {
        let info: PriceInfo = self
            .get_json(&["asset", "erc20", "price", chain_id, address])
            .await?;
        validate_unit_price(&info)?;
        Ok(info)
    }

    async fn list_allowed_addresses(&self) -> AppResult<AllowedAssets> {
        let raw: Value = self.get_json(&["allow", "assets"]).await?;
        AllowedAssets::from_value(raw)
    }
}

pub(crate) fn validate_unit_price(info: &PriceInfo) -> AppResult<()> {
    if info.unit_price <= Decimal::ZERO {
        return Err(AppError::Schema(format!(
            "provider returned non-positive unit price {}",
            info.unit_price
        )));
    }
    Ok(())
}
