//! # routes::market
//!
//! Read-only market endpoints.  `/prices` and `/positions` serve the poller's
//! snapshots; `/symbols` and `/history` ask the terminal directly.
//!
//! | Method | Path         | Description                              |
//! |--------|--------------|------------------------------------------|
//! | GET    | `/prices`    | Cached tick per tracked symbol           |
//! | GET    | `/positions` | Open positions as of the last poll       |
//! | GET    | `/symbols`   | Tradable instruments                     |
//! | GET    | `/history`   | OHLC bars                                |

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::{
    engine::trader,
    error::AppError,
    models::{trade::DEFAULT_SYMBOL, Timeframe},
    state::SharedState,
};

const DEFAULT_BAR_COUNT: u32 = 100;

/// GET /prices
pub async fn prices(State(state): State<SharedState>) -> Json<Value> {
    Json(json!(state.market().prices().await))
}

/// GET /positions
pub async fn positions(State(state): State<SharedState>) -> Json<Value> {
    Json(json!(state.positions_snapshot().await))
}

/// GET /symbols — empty list when the terminal can't be asked.
pub async fn symbols(State(state): State<SharedState>) -> Json<Value> {
    let symbols = trader::symbols(&state).await.unwrap_or_else(|e| {
        warn!(error = %e, "symbol listing failed");
        Vec::new()
    });
    Json(json!({ "symbols": symbols }))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub symbol: Option<String>,
    pub timeframe: Option<String>,
    pub start_pos: Option<u32>,
    pub count: Option<u32>,
}

/// GET /history?symbol=&timeframe=&start_pos=&count=
pub async fn history(
    State(state): State<SharedState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(query) = query.map_err(|e| AppError::InvalidRequest(e.body_text()))?;

    let symbol = query.symbol.unwrap_or_else(|| DEFAULT_SYMBOL.to_string());
    let timeframe = Timeframe::from_code(query.timeframe.as_deref().unwrap_or_default());
    let bars = trader::historical_data(
        &state,
        &symbol,
        timeframe,
        query.start_pos.unwrap_or(0),
        query.count.unwrap_or(DEFAULT_BAR_COUNT),
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "data":    bars,
    })))
}
