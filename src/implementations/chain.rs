use std::{collections::HashMap, str::FromStr, sync::Arc};

use async_trait::async_trait;
use ethers::{
    providers::{Http, Provider},
    types::Address,
};
use tracing::debug;

use crate::{
    config::{AppConfig, ChainSettings},
    error::{AppError, AppResult},
    implementations::erc20::{self, Erc20Metadata, MULTICALL3_ADDRESS},
};

mod defaults;

/// Connection parameters for one EVM network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    pub id: u64,
    pub name: String,
    pub rpc_url: String,
    pub multicall_address: Address,
}

/// Known chains, keyed by numeric chain id.
#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
    by_id: HashMap<u64, ChainConfig>,
}

impl ChainRegistry {
    pub fn new() -> Self {
        Self {
            by_id: HashMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        defaults::populate_defaults(&mut registry);
        registry
    }

    /// Built-in chains with the configured overrides applied on top.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let mut registry = Self::with_defaults();
        registry.apply_overrides(&config.chains)?;
        Ok(registry)
    }

    pub fn add_chain(&mut self, chain: ChainConfig) {
        self.by_id.insert(chain.id, chain);
    }

    /// Replace or extend entries. Unset fields keep the built-in value for that chain.
    pub fn apply_overrides(&mut self, overrides: &[ChainSettings]) -> AppResult<()> {
        for settings in overrides {
            let existing = self.by_id.get(&settings.id);

            let multicall_address = match &settings.multicall_address {
                Some(raw) => Address::from_str(raw).map_err(|err| {
                    AppError::Config(format!(
                        "invalid multicall address for chain {}: {err}",
                        settings.id
                    ))
                })?,
                None => existing
                    .map(|chain| chain.multicall_address)
                    .unwrap_or(*MULTICALL3_ADDRESS),
            };

            let name = settings
                .name
                .clone()
                .or_else(|| existing.map(|chain| chain.name.clone()))
                .unwrap_or_else(|| format!("chain {}", settings.id));

            self.add_chain(ChainConfig {
                id: settings.id,
                name,
                rpc_url: settings.rpc_url.clone(),
                multicall_address,
            });
        }
        Ok(())
    }

    pub fn resolve(&self, chain_id: u64) -> Option<&ChainConfig> {
        self.by_id.get(&chain_id)
    }
}

/// Chain lookups and batched ERC-20 metadata reads.
#[async_trait]
pub trait ChainMetadataService: Send + Sync {
    /// `None` means the chain is unknown, which callers treat as "no tokens".
    fn resolve_chain_config(&self, chain_id: u64) -> Option<ChainConfig>;

    async fn batch_read_token_metadata(
        &self,
        chain: &ChainConfig,
        addresses: &[String],
    ) -> AppResult<Vec<Option<Erc20Metadata>>>;
}

/// Reads metadata over JSON-RPC, one HTTP provider per call.
#[derive(Debug, Clone)]
pub struct EvmChainClient {
    registry: Arc<ChainRegistry>,
}

impl EvmChainClient {
    pub fn new(registry: ChainRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }
}

#[async_trait]
impl ChainMetadataService for EvmChainClient {
    fn resolve_chain_config(&self, chain_id: u64) -> Option<ChainConfig> {
        self.registry.resolve(chain_id).cloned()
    }

    async fn batch_read_token_metadata(
        &self,
        chain: &ChainConfig,
        addresses: &[String],
    ) -> AppResult<Vec<Option<Erc20Metadata>>> {
        let provider = Provider::<Http>::try_from(chain.rpc_url.as_str()).map_err(|err| {
            AppError::ChainRead(format!("invalid rpc url for {}: {err}", chain.name))
        })?;

        debug!(chain = chain.id, count = addresses.len(), "batch reading token metadata");
        erc20::batch_read_metadata(Arc::new(provider), chain.multicall_address, addresses).await
    }
}
