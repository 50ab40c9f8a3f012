//! # models::trade
//!
//! Validated trade instructions and the result objects the Trade Service
//! hands back to the HTTP layer.

use serde::Serialize;

use crate::error::AppError;
use crate::models::{Position, Side};

pub const DEFAULT_SYMBOL: &str = "EURUSD";
pub const DEFAULT_LOT_SIZE: f64 = 0.01;

// ─── TradeRequest ─────────────────────────────────────────────────────────────

/// An order to open, already checked for shape.  Whether the symbol exists is
/// the connector's call and is checked at submission.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRequest {
    pub side: Side,
    pub symbol: String,
    pub lot_size: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
}

impl TradeRequest {
    /// Builds a request from loosely-typed client input, applying the
    /// EURUSD / 0.01 lot defaults.
    pub fn new(
        direction: Option<&str>,
        symbol: Option<String>,
        lot_size: Option<f64>,
        stop_loss: Option<f64>,
        take_profit: Option<f64>,
    ) -> Result<Self, AppError> {
        let direction = direction.unwrap_or_default();
        let side = Side::parse(direction)
            .ok_or_else(|| AppError::InvalidDirection(direction.to_string()))?;

        let symbol = symbol
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SYMBOL.to_string());

        let lot_size = lot_size.unwrap_or(DEFAULT_LOT_SIZE);
        if !lot_size.is_finite() || lot_size <= 0.0 {
            return Err(AppError::InvalidRequest(format!(
                "lotSize must be a positive number, got {lot_size}"
            )));
        }

        Ok(Self { side, symbol, lot_size, stop_loss, take_profit })
    }
}

// ─── Results ──────────────────────────────────────────────────────────────────

/// Successful open, as published by `/trade`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeFill {
    pub order_id: u64,
    pub volume: f64,
    pub price: f64,
    pub symbol: String,
}

/// A position the close sweep could not close, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedClose {
    pub ticket: u64,
    pub symbol: String,
    pub reason: String,
}

/// Outcome of a close sweep.  Partial failure is still a successful sweep.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CloseReport {
    pub closed: Vec<Position>,
    pub failed: Vec<FailedClose>,
}

impl CloseReport {
    #[inline]
    pub fn closed_count(&self) -> usize {
        self.closed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let request = TradeRequest::new(Some("buy"), None, None, None, None).unwrap();
        assert_eq!(request.symbol, "EURUSD");
        assert_eq!(request.lot_size, 0.01);
        assert_eq!(request.side, Side::Buy);
        assert!(request.stop_loss.is_none());
    }

    #[test]
    fn test_unknown_direction_rejected() {
        let err = TradeRequest::new(Some("hold"), None, None, None, None).unwrap_err();
        assert!(matches!(err, AppError::InvalidDirection(d) if d == "hold"));

        let err = TradeRequest::new(None, None, None, None, None).unwrap_err();
        assert!(matches!(err, AppError::InvalidDirection(_)));
    }

    #[test]
    fn test_non_positive_lot_rejected() {
        for lot in [0.0, -0.1, f64::NAN] {
            let err = TradeRequest::new(Some("sell"), None, Some(lot), None, None).unwrap_err();
            assert!(matches!(err, AppError::InvalidRequest(_)));
        }
    }

    #[test]
    fn test_blank_symbol_uses_default() {
        let request = TradeRequest::new(Some("sell"), Some("  ".into()), Some(0.5), Some(1.2), None).unwrap();
        assert_eq!(request.symbol, "EURUSD");
        assert_eq!(request.stop_loss, Some(1.2));
    }
}
