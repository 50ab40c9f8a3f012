//! # connector
//!
//! The seam between the bridge and the MetaTrader 5 terminal.
//!
//! [`Connector`] is the raw capability set the terminal's native API offers:
//! session init/shutdown, symbol and tick lookup, order submission, position
//! enumeration and bar history.  It knows nothing about connection state;
//! [`crate::engine::session::Session`] owns that.
//!
//! Two implementations:
//! * [`bridge::HttpBridge`]    — JSON over HTTP to a terminal-side process.
//! * [`paper::PaperTerminal`]  — in-memory terminal for `MT5_BASE_URL=mock`
//!   and for tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Bar, Position, Side, SymbolInfo, Tick, Timeframe};

pub mod bridge;
pub mod paper;

pub use bridge::HttpBridge;
pub use paper::PaperTerminal;

// ─── Return Codes ─────────────────────────────────────────────────────────────

/// MQL5 trade server return codes the bridge cares about.
pub mod retcode {
    pub const REJECT: u32 = 10006;
    /// `TRADE_RETCODE_DONE` — the only code treated as success.
    pub const DONE: u32 = 10009;
    pub const INVALID_VOLUME: u32 = 10014;
    pub const POSITION_CLOSED: u32 = 10036;
}

/// Max slippage in points for every market deal we send.
pub const DEVIATION_POINTS: u32 = 10;
/// Magic number tagging orders placed through the bridge.
pub const MAGIC: u64 = 123456;
pub const OPEN_COMMENT: &str = "MT5 Trade Trigger";
pub const CLOSE_COMMENT: &str = "MT5 Trade Trigger - Close";

// ─── Order Request / Result ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeAction {
    /// Market execution.
    Deal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderTime {
    /// Good till cancelled.
    Gtc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderFilling {
    /// Immediate or cancel.
    Ioc,
}

/// Same field set as an MQL5 `MqlTradeRequest` for a market deal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub action: TradeAction,
    pub symbol: String,
    pub volume: f64,
    #[serde(rename = "type")]
    pub side: Side,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sl: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tp: Option<f64>,
    /// Ticket of the position this deal closes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u64>,
    pub deviation: u32,
    pub magic: u64,
    pub comment: String,
    pub type_time: OrderTime,
    pub type_filling: OrderFilling,
}

impl OrderRequest {
    /// Market deal opening a new position.
    pub fn open(
        symbol: &str,
        side: Side,
        volume: f64,
        price: f64,
        sl: Option<f64>,
        tp: Option<f64>,
    ) -> Self {
        Self {
            action:       TradeAction::Deal,
            symbol:       symbol.to_string(),
            volume,
            side,
            price,
            sl,
            tp,
            position:     None,
            deviation:    DEVIATION_POINTS,
            magic:        MAGIC,
            comment:      OPEN_COMMENT.to_string(),
            type_time:    OrderTime::Gtc,
            type_filling: OrderFilling::Ioc,
        }
    }

    /// Opposite-side market deal closing `position` at `price`.
    pub fn close(position: &Position, price: f64) -> Self {
        Self {
            action:       TradeAction::Deal,
            symbol:       position.symbol.clone(),
            volume:       position.volume,
            side:         position.side.opposite(),
            price,
            sl:           None,
            tp:           None,
            position:     Some(position.ticket),
            deviation:    DEVIATION_POINTS,
            magic:        MAGIC,
            comment:      CLOSE_COMMENT.to_string(),
            type_time:    OrderTime::Gtc,
            type_filling: OrderFilling::Ioc,
        }
    }
}

/// Mirrors MQL5 `MqlTradeResult`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResult {
    pub retcode: u32,
    #[serde(default)]
    pub order: u64,
    #[serde(default)]
    pub deal: u64,
    #[serde(default)]
    pub volume: f64,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub comment: String,
}

impl OrderResult {
    #[inline]
    pub fn is_done(&self) -> bool {
        self.retcode == retcode::DONE
    }
}

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Error)]
pub enum ConnectorError {
    /// The terminal reported a failure with its own error code
    /// (`last_error()` in MQL5 terms).
    #[error("terminal error {code}: {message}")]
    Native { code: i32, message: String },

    /// The terminal could not be reached.
    #[error("transport error: {0}")]
    Transport(String),

    /// The terminal answered with something we could not decode.
    #[error("bad response: {0}")]
    BadResponse(String),
}

// ─── Connector ────────────────────────────────────────────────────────────────

/// Raw terminal capabilities.  Lookups return `Ok(None)` when the terminal has
/// nothing for the key; `Err` is reserved for the call itself failing.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens (or re-opens) the terminal session.
    async fn initialize(&self) -> Result<(), ConnectorError>;

    async fn shutdown(&self) -> Result<(), ConnectorError>;

    async fn symbol_info(&self, symbol: &str) -> Result<Option<SymbolInfo>, ConnectorError>;

    /// Adds `symbol` to (or removes it from) Market Watch.  Returns whether the
    /// terminal accepted the change.
    async fn symbol_select(&self, symbol: &str, enable: bool) -> Result<bool, ConnectorError>;

    async fn symbols(&self) -> Result<Vec<SymbolInfo>, ConnectorError>;

    async fn symbol_tick(&self, symbol: &str) -> Result<Option<Tick>, ConnectorError>;

    /// Open positions, optionally restricted to one symbol.
    async fn positions(&self, symbol: Option<&str>) -> Result<Vec<Position>, ConnectorError>;

    async fn order_send(&self, request: &OrderRequest) -> Result<OrderResult, ConnectorError>;

    /// `count` bars ending `start_pos` bars back from the current one, oldest
    /// first.  `None` when the terminal has no history.
    async fn rates_from_pos(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start_pos: u32,
        count: u32,
    ) -> Result<Option<Vec<Bar>>, ConnectorError>;
}
