//! # routes::trade
//!
//! | Method | Path               | Description                         |
//! |--------|--------------------|-------------------------------------|
//! | POST   | `/trade`           | Open a market position              |
//! | POST   | `/close_positions` | Close all (or one symbol's) positions |
//! | GET    | `/trade_history`   | Orders opened by this process       |
//!
//! Bodies are parsed by hand rather than through `Json<T>` so a missing
//! `Content-Type` or an empty body is not a transport-level rejection.

use axum::{body::Bytes, extract::State, Json};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};

use crate::{
    engine::trader,
    error::AppError,
    models::TradeRequest,
    state::SharedState,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeBody {
    pub direction: Option<String>,
    pub symbol: Option<String>,
    pub lot_size: Option<f64>,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CloseBody {
    pub symbol: Option<String>,
}

/// Empty body → `T::default()`.
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::InvalidRequest(format!("malformed JSON body: {e}")))
}

/// POST /trade
pub async fn trade(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let body: TradeBody = parse_body(&body)?;
    let request = TradeRequest::new(
        body.direction.as_deref(),
        body.symbol,
        body.lot_size,
        body.stop_loss,
        body.take_profit,
    )?;

    let fill = trader::execute_trade(&state, request).await?;

    Ok(Json(json!({
        "success":  true,
        "message":  "Order executed successfully",
        "order_id": fill.order_id,
        "volume":   fill.volume,
        "price":    fill.price,
        "symbol":   fill.symbol,
    })))
}

/// POST /close_positions
pub async fn close_positions(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let body: CloseBody = parse_body(&body)?;
    let symbol = body.symbol.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let report = trader::close_positions(&state, symbol).await?;

    let message = if report.closed.is_empty() && report.failed.is_empty() {
        "No positions to close".to_string()
    } else {
        format!("Closed {} positions", report.closed_count())
    };

    Ok(Json(json!({
        "success":      true,
        "message":      message,
        "closed_count": report.closed_count(),
        "closed":       report.closed,
        "failed":       report.failed,
    })))
}

/// GET /trade_history
pub async fn trade_history(State(state): State<SharedState>) -> Json<Value> {
    Json(json!({ "history": state.trade_history().await }))
}
