//! # engine::market_data
//!
//! The price cache behind `/prices` and the set of symbols the poller keeps
//! fresh.  Only the poller writes; handlers read snapshots.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::debug;

use crate::engine::session::Session;
use crate::models::Tick;

pub struct MarketData {
    quotes: RwLock<HashMap<String, Tick>>,
    /// Insertion ordered, never shrinks.
    tracked: RwLock<Vec<String>>,
}

impl MarketData {
    pub fn new(tracked: Vec<String>) -> Self {
        let mut initial: Vec<String> = Vec::with_capacity(tracked.len());
        for symbol in tracked {
            if !initial.contains(&symbol) {
                initial.push(symbol);
            }
        }

        Self {
            quotes:  RwLock::new(HashMap::new()),
            tracked: RwLock::new(initial),
        }
    }

    /// Copy of the whole cache (clone out to release the lock).
    pub async fn prices(&self) -> HashMap<String, Tick> {
        self.quotes.read().await.clone()
    }

    pub(crate) async fn store_all(&self, ticks: Vec<(String, Tick)>) {
        if ticks.is_empty() {
            return;
        }
        let mut quotes = self.quotes.write().await;
        quotes.extend(ticks);
    }

    pub async fn tracked_symbols(&self) -> Vec<String> {
        self.tracked.read().await.clone()
    }

    /// Adds any unseen symbols to the tracked set and returns the newly added
    /// ones.
    pub(crate) async fn track<'a, I>(&self, symbols: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut tracked = self.tracked.write().await;
        let mut added = Vec::new();
        for symbol in symbols {
            if !tracked.iter().any(|s| s == symbol) {
                tracked.push(symbol.to_string());
                added.push(symbol.to_string());
            }
        }
        added
    }
}

/// Current tick for `symbol` straight from the terminal.
///
/// `None` when the terminal has no quote (unknown symbol, market closed) or the
/// session is down.  Never waits for a fresher value.
pub async fn get_price(session: &Session, symbol: &str) -> Option<Tick> {
    let terminal = session.terminal().ok()?;

    match terminal.symbol_tick(symbol).await {
        Ok(tick) => {
            if tick.is_none() {
                debug!(symbol, "no tick available");
            }
            tick
        }
        Err(e) => {
            debug!(symbol, error = %e, "tick lookup failed");
            None
        }
    }
}
