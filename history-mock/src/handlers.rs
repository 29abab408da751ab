/// Axum HTTP handlers for the Etherscan-compatible endpoints
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::store::MockHistory;
use crate::types::*;

/// Shared application state
pub type AppState = Arc<MockHistory>;

fn api_response(status: &str, message: &str, result: serde_json::Value) -> Response {
    Json(TokenTxResponse {
        status: status.to_string(),
        message: message.to_string(),
        result,
    })
    .into_response()
}

/// GET /api?module=account&action=tokentx&address=..[&startblock=..][&sort=asc|desc]
/// Returns ERC-20/BEP-20 transfers of an address
pub async fn token_tx(State(history): State<AppState>, Query(query): Query<TokenTxQuery>) -> Response {
    history.record_call();

    match history.failure() {
        Some(FailureMode::RateLimited) => {
            return api_response("0", "NOTOK", json!("Max rate limit reached"));
        }
        Some(FailureMode::HttpError { status }) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return (status, "injected failure").into_response();
        }
        Some(FailureMode::Malformed) => {
            return (StatusCode::OK, "<html>not json</html>").into_response();
        }
        Some(FailureMode::Delay { millis }) => {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
        None => {}
    }

    if query.module.as_deref() != Some("account") {
        return api_response("0", "NOTOK", json!("Error! Missing Or invalid Module name"));
    }
    if query.action.as_deref() != Some("tokentx") {
        return api_response("0", "NOTOK", json!("Error! Missing Or invalid Action name"));
    }
    let Some(address) = query.address else {
        return api_response("0", "NOTOK", json!("Error! Missing address"));
    };

    let descending = query.sort.as_deref() == Some("desc");
    let rows = history.query(&address, query.startblock, descending);
    log::debug!(
        "tokentx {} from {:?}: {} transfer(s)",
        address,
        query.startblock,
        rows.len()
    );

    if rows.is_empty() {
        return api_response("0", "No transactions found", json!([]));
    }

    match serde_json::to_value(rows) {
        Ok(result) => api_response("1", "OK", result),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// POST /transfers
/// Seed fixture transfers
pub async fn add_transfers(
    State(history): State<AppState>,
    Json(transfers): Json<Vec<SeedTransfer>>,
) -> Json<StatsResponse> {
    log::info!("Seeding {} transfer(s)", transfers.len());
    history.add_transfers(transfers);
    Json(stats_of(&history))
}

/// POST /control/failure
/// Make every following `tokentx` request fail in the given way
pub async fn set_failure(
    State(history): State<AppState>,
    Json(mode): Json<FailureMode>,
) -> StatusCode {
    log::info!("Injecting failure: {:?}", mode);
    history.set_failure(Some(mode));
    StatusCode::NO_CONTENT
}

/// DELETE /control/failure
pub async fn clear_failure(State(history): State<AppState>) -> StatusCode {
    history.set_failure(None);
    StatusCode::NO_CONTENT
}

/// GET /stats
pub async fn stats(State(history): State<AppState>) -> Json<StatsResponse> {
    Json(stats_of(&history))
}

fn stats_of(history: &MockHistory) -> StatsResponse {
    StatsResponse {
        calls: history.calls(),
        transfers: history.transfer_count(),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}
