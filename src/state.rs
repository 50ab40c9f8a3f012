//! # state
//!
//! The bridge's **shared application state** — one service object holding the
//! terminal session, the price cache, the position snapshot and the trade log.
//!
//! ## Design Decisions
//!
//! * `Arc<AppState>` is cloned cheaply into every Axum handler and into the
//!   poller task.
//! * Fields are private; collections are replaced or appended under a
//!   `tokio::sync::RwLock` write guard, so a reader sees either the old or the
//!   new value, never a torn one.
//! * Reads clone out of the lock and release it before any I/O.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::connector::Connector;
use crate::engine::{market_data::MarketData, session::Session};
use crate::models::{Position, TradeRecord};

// ─── AppState ─────────────────────────────────────────────────────────────────

pub struct AppState {
    session: Session,
    market: MarketData,
    /// Open positions as of the last poll.
    positions: RwLock<Vec<Position>>,
    /// Every order this process opened successfully.  Never trimmed.
    trade_history: RwLock<Vec<TradeRecord>>,
}

impl AppState {
    pub fn new(connector: Arc<dyn Connector>, tracked_symbols: Vec<String>) -> Self {
        Self {
            session:       Session::new(connector),
            market:        MarketData::new(tracked_symbols),
            positions:     RwLock::new(Vec::new()),
            trade_history: RwLock::new(Vec::new()),
        }
    }

    #[inline]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[inline]
    pub fn market(&self) -> &MarketData {
        &self.market
    }

    // ── Position Snapshot ─────────────────────────────────────────────────────

    pub async fn positions_snapshot(&self) -> Vec<Position> {
        self.positions.read().await.clone()
    }

    pub(crate) async fn replace_positions(&self, positions: Vec<Position>) {
        *self.positions.write().await = positions;
    }

    // ── Trade History ─────────────────────────────────────────────────────────

    pub(crate) async fn push_trade_record(&self, record: TradeRecord) {
        self.trade_history.write().await.push(record);
    }

    pub async fn trade_history(&self) -> Vec<TradeRecord> {
        self.trade_history.read().await.clone()
    }
}

/// Convenience type alias
pub type SharedState = Arc<AppState>;

pub fn build_state(connector: Arc<dyn Connector>, tracked_symbols: Vec<String>) -> SharedState {
    Arc::new(AppState::new(connector, tracked_symbols))
}
