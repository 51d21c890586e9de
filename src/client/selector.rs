use tracing::{debug, warn};

use crate::{
    error::AppResult,
    types::{TokenRecord, TokensOut},
};

/// A token the user can click on.
#[derive(Debug, Clone, Eq)]
pub struct SelectableToken {
    pub chain_id: String,
    pub symbol: String,
    pub name: String,
    pub address: Option<String>,
    pub decimals: Option<u8>,
}

impl SelectableToken {
    /// Entry of the fixed list, which knows tokens by symbol only.
    pub fn fixed(symbol: &str, chain_id: &str) -> Self {
        Self {
            chain_id: chain_id.to_string(),
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            address: None,
            decimals: None,
        }
    }
}

impl From<TokenRecord> for SelectableToken {
    fn from(record: TokenRecord) -> Self {
        Self {
            chain_id: record.chain_id,
            symbol: record.symbol,
            name: record.name,
            address: Some(record.address),
            decimals: Some(record.decimals),
        }
    }
}

/// `(chain, address)` when both sides know the address, `(chain, symbol)` otherwise.
impl PartialEq for SelectableToken {
    fn eq(&self, other: &Self) -> bool {
        if self.chain_id != other.chain_id {
            return false;
        }
        match (&self.address, &other.address) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            _ => self.symbol == other.symbol,
        }
    }
}

const FIXED_TOKENS: [(&str, &str); 4] = [("USDC", "1"), ("USDT", "137"), ("ETH", "8453"), ("WBTC", "1")];

/// Hardcoded token list; needs no discovery call.
#[derive(Debug, Clone)]
pub struct FixedTokenSelector {
    tokens: Vec<SelectableToken>,
}

impl Default for FixedTokenSelector {
    fn default() -> Self {
        Self {
            tokens: FIXED_TOKENS
                .iter()
                .map(|(symbol, chain_id)| SelectableToken::fixed(symbol, chain_id))
                .collect(),
        }
    }
}

impl FixedTokenSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tokens(&self) -> &[SelectableToken] {
        &self.tokens
    }
}

/// Token list discovered per chain through the `/tokens` endpoint.
#[derive(Debug, Clone)]
pub struct DynamicTokenSelector {
    chains: Vec<String>,
    selected_chain: Option<String>,
    tokens: Vec<SelectableToken>,
    loading_chains: bool,
    loading_tokens: bool,
}

impl Default for DynamicTokenSelector {
    fn default() -> Self {
        Self {
            chains: Vec::new(),
            selected_chain: None,
            tokens: Vec::new(),
            loading_chains: true,
            loading_tokens: false,
        }
    }
}

impl DynamicTokenSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chains(&self) -> &[String] {
        &self.chains
    }

    pub fn selected_chain(&self) -> Option<&str> {
        self.selected_chain.as_deref()
    }

    pub fn tokens(&self) -> &[SelectableToken] {
        &self.tokens
    }

    pub fn is_loading_chains(&self) -> bool {
        self.loading_chains
    }

    pub fn is_loading_tokens(&self) -> bool {
        self.loading_tokens
    }

    /// Chain of the currently loaded tokens.
    pub fn loaded_chain(&self) -> Option<&str> {
        self.tokens.first().map(|token| token.chain_id.as_str())
    }

    /// Apply the response of the initial, parameterless `/tokens` call.
    pub fn apply_initial(&mut self, result: AppResult<TokensOut>) {
        match result {
            Ok(out) => {
                if let Some(chains) = out.chains {
                    self.chains = chains;
                }
                if let Some(chain_id) = out.chain_id {
                    self.selected_chain = Some(chain_id);
                }
                self.tokens = out.tokens.into_iter().map(SelectableToken::from).collect();
            }
            Err(err) => warn!("failed to fetch initial token data: {err}"),
        }
        self.loading_chains = false;
        self.loading_tokens = false;
    }

    /// Switch chains. Returns the chain to fetch, or `None` when its tokens are already loaded.
    pub fn select_chain(&mut self, chain_id: &str) -> Option<String> {
        let chain_id = chain_id.trim();
        if chain_id.is_empty() {
            return None;
        }
        self.selected_chain = Some(chain_id.to_string());

        if self.loaded_chain() == Some(chain_id) {
            debug!(chain = chain_id, "tokens already loaded");
            return None;
        }

        self.loading_tokens = true;
        Some(chain_id.to_string())
    }

    /// Apply a `/tokens?chainId=` response. Responses for a chain that is no longer selected
    /// are dropped.
    pub fn apply_tokens(&mut self, chain_id: &str, result: AppResult<TokensOut>) {
        if self.selected_chain.as_deref() != Some(chain_id) {
            debug!(chain = chain_id, "discarding tokens for deselected chain");
            return;
        }
        match result {
            Ok(out) => {
                self.tokens = out.tokens.into_iter().map(SelectableToken::from).collect();
            }
            Err(err) => warn!(chain = chain_id, "failed to fetch tokens: {err}"),
        }
        self.loading_tokens = false;
    }
}
