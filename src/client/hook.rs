use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::{
    client::ExplorerApi,
    error::AppResult,
    types::TokenPriceOut,
};

pub const FETCH_FAILED: &str = "Failed to fetch token price";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PriceState {
    #[default]
    Idle,
    Loading,
    Loaded(TokenPriceOut),
    Failed(String),
}

/// Identifies one fetch. Only the ticket carrying the current generation may update the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub chain_id: String,
    pub symbol: String,
}

impl FetchTicket {
    pub async fn fetch<A>(&self, api: &A) -> AppResult<TokenPriceOut>
    where
        A: ExplorerApi + ?Sized,
    {
        api.token_price(&self.chain_id, &self.symbol).await
    }
}

/// Token info + price for one `(chain_id, symbol)` input pair.
///
/// Every input change bumps the generation, so a response that arrives after the inputs moved
/// on is dropped instead of overwriting newer state.
#[derive(Debug, Default)]
pub struct TokenPriceQuery {
    inputs: Option<(String, String)>,
    generation: u64,
    state: PriceState,
}

impl TokenPriceQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PriceState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, PriceState::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            PriceState::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn data(&self) -> Option<&TokenPriceOut> {
        match &self.state {
            PriceState::Loaded(data) => Some(data),
            _ => None,
        }
    }

    pub fn unit_price(&self) -> Option<Decimal> {
        self.data().map(|data| data.price_info.unit_price)
    }

    /// Feed new inputs. Returns a ticket when a fetch should start.
    ///
    /// A missing input resets to `Idle` right away and invalidates any fetch in flight.
    pub fn set_inputs(&mut self, chain_id: Option<&str>, symbol: Option<&str>) -> Option<FetchTicket> {
        let present = |value: Option<&str>| value.filter(|v| !v.trim().is_empty()).map(str::to_string);

        let (Some(chain_id), Some(symbol)) = (present(chain_id), present(symbol)) else {
            if self.inputs.is_some() || self.state != PriceState::Idle {
                self.generation += 1;
            }
            self.inputs = None;
            self.state = PriceState::Idle;
            return None;
        };

        let inputs = (chain_id, symbol);
        if self.inputs.as_ref() == Some(&inputs) {
            return None;
        }

        self.generation += 1;
        self.state = PriceState::Loading;
        let (chain_id, symbol) = inputs.clone();
        self.inputs = Some(inputs);

        Some(FetchTicket {
            generation: self.generation,
            chain_id,
            symbol,
        })
    }

    /// Apply a fetch result. Returns `false` when the ticket is stale and the result was dropped.
    pub fn complete(&mut self, ticket: &FetchTicket, result: AppResult<TokenPriceOut>) -> bool {
        if ticket.generation != self.generation {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale price response"
            );
            return false;
        }

        self.state = match result {
            Ok(data) => PriceState::Loaded(data),
            Err(err) => {
                warn!(symbol = %ticket.symbol, chain = %ticket.chain_id, "price fetch failed: {err}");
                PriceState::Failed(FETCH_FAILED.to_string())
            }
        };
        true
    }
}
