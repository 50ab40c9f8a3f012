//! # models::position
//!
//! Live positions as reported by the terminal, and the in-memory log of
//! trades this bridge has opened.
//!
//! `Position`    = what is open in MT5 right now (never stored by us)
//! `TradeRecord` = one entry per order we opened successfully

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Side ─────────────────────────────────────────────────────────────────────

/// Market side of an order or position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Parses a client-supplied direction.  Only `buy` and `sell` are
    /// accepted (case-insensitive); anything else is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "buy" => Some(Side::Buy),
            "sell" => Some(Side::Sell),
            _ => None,
        }
    }

    /// Side of the deal that closes a position opened on `self`.
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Position ─────────────────────────────────────────────────────────────────

/// An open position in the terminal, identified by its ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub ticket: u64,
    pub symbol: String,
    #[serde(rename = "type")]
    pub side: Side,
    pub volume: f64,
    pub open_price: f64,
    pub current_price: f64,
    pub profit: f64,
    /// 0.0 when no stop-loss is set (terminal convention).
    pub sl: f64,
    /// 0.0 when no take-profit is set.
    pub tp: f64,
}

// ─── TradeRecord ──────────────────────────────────────────────────────────────

/// History entry for an order the terminal executed.  Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub trade_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub direction: Side,
    pub volume: f64,
    pub price: f64,
    pub order_id: u64,
    /// Requested levels; `None` means the order carried none.
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
}
