//! # error
//!
//! Centralised application error type.
//!
//! Every handler returns `Result<_, AppError>`.  Unlike a typical REST API the
//! browser front end only looks at the JSON body, so every variant renders as
//! HTTP 200 with `{ "success": false, "message": ... }`.  Unknown endpoints
//! render as `{ "error": "Unknown endpoint" }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::warn;

use crate::connector::ConnectorError;

#[derive(Debug, Error)]
pub enum AppError {
    /// The terminal session is down.  Never triggers an implicit reconnect.
    #[error("Not connected to MT5")]
    NotConnected,

    #[error("Symbol {0} not found")]
    SymbolNotFound(String),

    #[error("Trading is disabled for symbol {0}")]
    TradeDisabled(String),

    #[error("Invalid direction '{0}': expected 'buy' or 'sell'")]
    InvalidDirection(String),

    /// Well-formed JSON with a semantically invalid field, or a body/query
    /// that failed to parse.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The terminal answered with a retcode other than DONE.
    #[error("Order failed, return code: {retcode}")]
    OrderRejected { retcode: u32, comment: String },

    /// No tick or no history for the requested instrument.
    #[error("{0}")]
    Unavailable(String),

    #[error("MT5 connector error: {0}")]
    Connector(#[from] ConnectorError),

    #[error("Unknown endpoint")]
    UnknownEndpoint,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = match &self {
            AppError::UnknownEndpoint => json!({ "error": self.to_string() }),
            AppError::OrderRejected { retcode, comment } => {
                warn!(retcode, comment = %comment, "order rejected by terminal");
                json!({
                    "success": false,
                    "message": self.to_string(),
                    "retcode": retcode,
                })
            }
            other => {
                warn!(error = %other, "request failed");
                json!({
                    "success": false,
                    "message": other.to_string(),
                })
            }
        };

        (StatusCode::OK, Json(body)).into_response()
    }
}
