use crate::error::{AppError, AppResult};
use dotenvy::dotenv;
use serde::Deserialize;
use std::{env, fs, net::SocketAddr, path::Path};

const DEFAULT_CONFIG_PATH: &str = "Config.toml";
const DEFAULT_FUNKIT_BASE_URL: &str = "https://api.fun.xyz/v1";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const RPC_URL_ENV_PREFIX: &str = "RPC_URL_";

/// Strongly-typed configuration derived from a `Config.toml` or environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub funkit_api_key: String,
    #[serde(default = "default_funkit_base_url")]
    pub funkit_base_url: String,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Extra chains, or replacements for built-in chains with the same id.
    #[serde(default)]
    pub chains: Vec<ChainSettings>,
}

/// One `[[chains]]` entry.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ChainSettings {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    pub rpc_url: String,
    #[serde(default)]
    pub multicall_address: Option<String>,
}

fn default_funkit_base_url() -> String {
    DEFAULT_FUNKIT_BASE_URL.to_string()
}

fn default_bind_addr() -> String {
    DEFAULT_BIND_ADDR.to_string()
}

impl AppConfig {
    /// Load configuration, preferring a user-provided config file and falling back to env vars.
    ///
    /// The result is validated before it is returned, so a missing pricing credential stops the
    /// process here instead of surfacing on the first request.
    pub fn load() -> AppResult<Self> {
        dotenv().ok();

        let configured_path =
            env::var("EXPLORER_CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let config_path = Path::new(&configured_path);

        let cfg = if config_path.exists() {
            let raw = fs::read_to_string(config_path)
                .map_err(|err| AppError::Config(format!("failed to read config file: {err}")))?;
            Self::from_toml(&raw)?
        } else {
            Self::from_env()
        };

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_toml(raw: &str) -> AppResult<Self> {
        toml::from_str(raw)
            .map_err(|err| AppError::Config(format!("failed to parse config file: {err}")))
    }

    /// Helper used when no config file is present.
    fn from_env() -> Self {
        let funkit_api_key = env::var("FUNKIT_API_KEY").unwrap_or_default();
        let funkit_base_url =
            env::var("FUNKIT_BASE_URL").unwrap_or_else(|_| default_funkit_base_url());
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| default_bind_addr());
        let chains = chains_from_env(env::vars());

        Self {
            funkit_api_key,
            funkit_base_url,
            bind_addr,
            chains,
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.funkit_api_key.trim().is_empty() {
            return Err(AppError::Config("FUNKIT_API_KEY is not set".into()));
        }

        if !self.funkit_base_url.starts_with("http://")
            && !self.funkit_base_url.starts_with("https://")
        {
            return Err(AppError::Config(format!(
                "funkit_base_url must be an http(s) url, got {}",
                self.funkit_base_url
            )));
        }

        self.socket_addr()?;

        for chain in &self.chains {
            if chain.rpc_url.trim().is_empty() {
                return Err(AppError::Config(format!(
                    "chain {} has an empty rpc_url",
                    chain.id
                )));
            }
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> AppResult<SocketAddr> {
        self.bind_addr
            .parse()
            .map_err(|err| AppError::Config(format!("invalid bind_addr {}: {err}", self.bind_addr)))
    }
}

/// Collect `RPC_URL_<chainId>` variables into chain overrides, ordered by chain id.
fn chains_from_env<I>(vars: I) -> Vec<ChainSettings>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut chains: Vec<ChainSettings> = vars
        .into_iter()
        .filter_map(|(key, value)| {
            let id = key.strip_prefix(RPC_URL_ENV_PREFIX)?.parse::<u64>().ok()?;
            Some(ChainSettings {
                id,
                name: None,
                rpc_url: value,
                multicall_address: None,
            })
        })
        .collect();
    chains.sort_by_key(|chain| chain.id);
    chains
}
