use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult};

pub const PRICE_PARAMS_REQUIRED: &str = "chainId and symbol are required";

#[derive(Debug, Default, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenPriceParams {
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub chain_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub symbol: Option<String>,
}

impl TokenPriceParams {
    pub fn new(chain_id: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            chain_id: Some(chain_id.into()),
            symbol: Some(symbol.into()),
        }
    }

    /// Both fields, or the validation error the price endpoint reports.
    pub fn required(self) -> AppResult<(String, String)> {
        match (self.chain_id, self.symbol) {
            (Some(chain_id), Some(symbol)) => Ok((chain_id, symbol)),
            _ => Err(AppError::InvalidInput(PRICE_PARAMS_REQUIRED.into())),
        }
    }
}

/// Token metadata as reported by the pricing provider.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TokenInfo {
    pub address: String,
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub chain: Option<String>,
    pub decimals: u32,
    pub name: String,
    pub symbol: String,
}

/// Point-in-time USD price for one whole token.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PriceInfo {
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub amount: Option<Decimal>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub total: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenPriceOut {
    pub token_info: TokenInfo,
    pub price_info: PriceInfo,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTokensParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub chain_id: String,
}

/// Discovery response. `chains` and `chain_id` are only present when the caller let the server
/// pick the chain.
#[derive(Debug, Default, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokensOut {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chains: Option<Vec<String>>,
    #[serde(default)]
    pub tokens: Vec<TokenRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Accept a JSON string or number. Empty strings, zero, `null` and other types count as absent.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    })
}
