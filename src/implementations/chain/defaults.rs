use std::str::FromStr;

use ethers::types::Address;
use serde::Deserialize;
use serde_json::from_str;

use crate::implementations::erc20::MULTICALL3_ADDRESS;

use super::{ChainConfig, ChainRegistry};

#[derive(Debug, Deserialize)]
struct ChainDefaultsEntry {
    id: u64,
    name: String,
    rpc_url: String,
    #[serde(default)]
    multicall_address: Option<String>,
}

const DEFAULTS_JSON: &str = include_str!("../../../config/chains.json");

pub(crate) fn populate_defaults(registry: &mut ChainRegistry) {
    let entries: Vec<ChainDefaultsEntry> =
        from_str(DEFAULTS_JSON).expect("failed to parse chains.json");

    for entry in entries {
        let multicall_address = match entry.multicall_address {
            Some(raw) => Address::from_str(&raw)
                .unwrap_or_else(|_| panic!("invalid multicall address for chain {}", entry.id)),
            None => *MULTICALL3_ADDRESS,
        };

        registry.add_chain(ChainConfig {
            id: entry.id,
            name: entry.name,
            rpc_url: entry.rpc_url,
            multicall_address,
        });
    }
}
