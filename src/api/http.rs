use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::{ErrorKind, ServiceError, SystemError};
use crate::models::Transaction;
use crate::parser::ChainRegistry;

/// Response structure for the current block endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentBlockResponse {
    pub block_number: i64,
}

/// Response structure for an individual transaction
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct TransactionResponse {
    pub hash: String,
    pub from: String,
    pub to: String,
    pub value: String,
    #[serde(rename = "blockNumber")]
    pub block_number: String,
}

impl From<Transaction> for TransactionResponse {
    fn from(tx: Transaction) -> Self {
        Self {
            hash: tx.hash,
            from: tx.from.to_string(),
            to: tx.to.to_string(),
            value: tx.value,
            block_number: tx.block_number,
        }
    }
}

/// Response structure for the status endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub watched_addresses: usize,
    pub stored_transactions: usize,
    pub last_parsed_block: String,
}

/// Query parameters carrying the address
#[derive(Debug, Deserialize)]
pub struct AddressQuery {
    #[serde(default)]
    pub address: String,
}

/// Error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: ServiceError) -> (StatusCode, Json<ErrorResponse>) {
    let kind = err.kind();
    (
        status_for(kind),
        Json(ErrorResponse {
            error: kind.as_str().to_string(),
            message: err.to_string(),
        }),
    )
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ChainRegistry>,
}

/// HTTP API server
pub struct ApiServer {
    state: AppState,
    pub bind_address: String,
}

impl ApiServer {
    pub fn new(registry: Arc<ChainRegistry>, bind_address: String) -> Self {
        Self {
            state: AppState { registry },
            bind_address,
        }
    }

    /// Serve until `shutdown` resolves
    pub async fn start<F>(&self, shutdown: F) -> Result<(), SystemError>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let app = router(self.state.clone());

        let listener = TcpListener::bind(&self.bind_address)
            .await
            .map_err(|e| SystemError::Server(format!("Failed to bind to {}: {}", self.bind_address, e)))?;

        log::info!("Server listening on: {}", self.bind_address);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| SystemError::Server(format!("Server error: {}", e)))?;

        Ok(())
    }
}

/// Routes over the parser service
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/blocks/current", get(get_current_block))
        .route("/subscribe", post(subscribe_address))
        .route("/transactions", get(get_transactions))
        .route("/status", get(get_status))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// GET /blocks/current - Last parsed block number
pub async fn get_current_block(State(state): State<AppState>) -> ApiResult<CurrentBlockResponse> {
    let block_number = state
        .registry
        .ethereum()
        .and_then(|parser| parser.current_height())
        .map_err(|e| {
            log::error!("error retrieving current block: {}", e);
            error_response(e)
        })?;

    Ok(Json(CurrentBlockResponse { block_number }))
}

/// POST /subscribe?address=0x... - Add an address to the watch set
pub async fn subscribe_address(
    Query(params): Query<AddressQuery>,
    State(state): State<AppState>,
) -> ApiResult<serde_json::Value> {
    state
        .registry
        .ethereum()
        .and_then(|parser| parser.subscribe(&params.address))
        .map_err(|e| {
            log::warn!("error subscribing address: {}: {}", params.address, e);
            error_response(e)
        })?;

    Ok(Json(serde_json::json!({})))
}

/// GET /transactions?address=0x... - Recorded transactions for a subscribed address
pub async fn get_transactions(
    Query(params): Query<AddressQuery>,
    State(state): State<AppState>,
) -> ApiResult<Vec<TransactionResponse>> {
    let transactions = state
        .registry
        .ethereum()
        .and_then(|parser| parser.transactions_for(&params.address))
        .map_err(|e| {
            log::warn!("error retrieving transactions for address: {}: {}", params.address, e);
            error_response(e)
        })?;

    Ok(Json(transactions.into_iter().map(TransactionResponse::from).collect()))
}

/// GET /status - Index size and progress
pub async fn get_status(State(state): State<AppState>) -> ApiResult<StatusResponse> {
    let parser = state.registry.ethereum().map_err(error_response)?;
    let index = parser.index();

    Ok(Json(StatusResponse {
        status: "healthy".to_string(),
        watched_addresses: index.watched_count(),
        stored_transactions: index.transaction_count(),
        last_parsed_block: index.progress(),
    }))
}
