use std::future::Future;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::{
    error::{AppError, AppResult},
    layers::service::ServiceLayer,
    types::{ErrorBody, ListTokensParams, TokenPriceParams},
};

pub const TOKEN_PRICE_FAILURE: &str = "Failed to fetch token price";
pub const TOKENS_FAILURE: &str = "Failed to fetch tokens";

/// JSON-over-HTTP front of the service layer.
pub struct HttpServer {
    service: ServiceLayer,
}

impl HttpServer {
    pub fn new(service: ServiceLayer) -> Self {
        Self { service }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/token-price", post(token_price))
            .route("/tokens", get(list_tokens))
            .with_state(self.service.clone())
            .layer(CorsLayer::permissive())
    }

    /// Serve until `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> AppResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr = listener.local_addr()?;
        info!("HTTP API listening on {local_addr}");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("HTTP API stopped");
        Ok(())
    }
}

async fn token_price(State(service): State<ServiceLayer>, body: Bytes) -> Response {
    // Only a body that parses but lacks fields is a client error.
    let result = match serde_json::from_slice::<TokenPriceParams>(&body) {
        Ok(params) => service.get_token_price(params).await,
        Err(err) => Err(AppError::from(err)),
    };

    respond(result, TOKEN_PRICE_FAILURE)
}

async fn list_tokens(
    State(service): State<ServiceLayer>,
    Query(params): Query<ListTokensParams>,
) -> Response {
    respond(service.list_tokens(params).await, TOKENS_FAILURE)
}

fn respond<T: Serialize>(result: AppResult<T>, failure_message: &str) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => error_response(&err, failure_message),
    }
}

/// Validation errors keep their message; anything else is logged and replaced by a generic one.
fn error_response(err: &AppError, failure_message: &str) -> Response {
    let status = err.status_code();
    let message = match err {
        AppError::InvalidInput(msg) => {
            warn!("rejected request: {msg}");
            msg.clone()
        }
        other => {
            error!("request failed: {other}");
            failure_message.to_string()
        }
    };
    (status, Json(ErrorBody::new(message))).into_response()
}
