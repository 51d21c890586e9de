use std::sync::Arc;

use crate::{
    error::AppResult,
    implementations::{chain::ChainMetadataService, pricing::PricingService},
    types::{ListTokensParams, TokenPriceOut, TokenPriceParams, TokenRecord, TokensOut},
};
use tracing::{info, instrument, warn};

/// Shared context that higher layers pass around. Holds the two remote clients.
#[derive(Clone)]
pub struct ServiceContext {
    pub pricing: Arc<dyn PricingService>,
    pub chains: Arc<dyn ChainMetadataService>,
}

impl ServiceContext {
    pub fn new(pricing: Arc<dyn PricingService>, chains: Arc<dyn ChainMetadataService>) -> Self {
        Self { pricing, chains }
    }
}

/// Middle layer that exposes business-level operations while delegating remote work to the
/// implementation modules.
#[derive(Clone)]
pub struct ServiceLayer {
    ctx: Arc<ServiceContext>,
}

impl ServiceLayer {
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Resolve the token address for a chain/symbol pair, then price it.
    #[instrument(skip(self), fields(chain_id = ?params.chain_id, symbol = ?params.symbol))]
    pub async fn get_token_price(&self, params: TokenPriceParams) -> AppResult<TokenPriceOut> {
        let (chain_id, symbol) = params.required()?;

        let mut token_info = self.ctx.pricing.resolve_token(&chain_id, &symbol).await?;
        if token_info.chain.is_none() {
            token_info.chain = Some(chain_id.clone());
        }

        let price_info = self
            .ctx
            .pricing
            .fetch_price(&chain_id, &token_info.address)
            .await?;

        info!(address = %token_info.address, "price lookup succeeded");
        Ok(TokenPriceOut {
            token_info,
            price_info,
        })
    }

    /// List provider-allowed tokens for one chain, enriched with on-chain metadata.
    ///
    /// Without a `chainId` the first chain of the allow-list is used, and the response also
    /// carries the full chain list and the chosen chain id.
    #[instrument(skip(self), fields(chain_id = ?params.chain_id))]
    pub async fn list_tokens(&self, params: ListTokensParams) -> AppResult<TokensOut> {
        let allowed = self.ctx.pricing.list_allowed_addresses().await?;

        let requested = params
            .chain_id
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty());

        let (chains, chain_id, chain_label) = match requested {
            None => {
                let Some(first) = allowed.first_chain() else {
                    return Ok(TokensOut {
                        chains: Some(Vec::new()),
                        tokens: Vec::new(),
                        chain_id: None,
                    });
                };
                let chain_id = parse_chain_id(first);
                let label = chain_id.map_or_else(|| first.to_string(), |id| id.to_string());
                (Some(allowed.chain_ids()), chain_id, label)
            }
            Some(raw) => {
                let chain_id = parse_chain_id(raw);
                let label = chain_id.map_or_else(|| raw.to_string(), |id| id.to_string());
                (None, chain_id, label)
            }
        };

        let respond = |tokens: Vec<TokenRecord>| {
            let chain_id = chains.as_ref().map(|_| chain_label.clone());
            TokensOut {
                chains: chains.clone(),
                tokens,
                chain_id,
            }
        };

        let Some(chain_id) = chain_id else {
            warn!("chain id {chain_label} is not numeric");
            return Ok(respond(Vec::new()));
        };

        let addresses = allowed.addresses_for(&chain_label);
        if addresses.is_empty() {
            return Ok(respond(Vec::new()));
        }

        let Some(chain) = self.ctx.chains.resolve_chain_config(chain_id) else {
            warn!("chain {chain_id} not found in chain registry");
            return Ok(respond(Vec::new()));
        };

        let metadata = self
            .ctx
            .chains
            .batch_read_token_metadata(&chain, addresses)
            .await?;

        let tokens: Vec<TokenRecord> = addresses
            .iter()
            .zip(metadata)
            .filter_map(|(address, metadata)| {
                let metadata = metadata?;
                Some(TokenRecord {
                    address: address.clone(),
                    name: metadata.name,
                    symbol: metadata.symbol,
                    decimals: metadata.decimals,
                    chain_id: chain_label.clone(),
                })
            })
            .collect();

        info!(
            chain = %chain.name,
            listed = addresses.len(),
            readable = tokens.len(),
            "token discovery succeeded"
        );
        Ok(respond(tokens))
    }
}

fn parse_chain_id(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok()
}
