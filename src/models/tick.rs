//! # models::tick
//!
//! Defines [`Tick`], the best bid/ask quote the terminal reports for one
//! instrument.  The symbol is not part of the payload: the cache keys ticks by
//! symbol and the connector is always asked for a specific one.

use serde::{Deserialize, Serialize};

use crate::models::Side;

/// A single best bid/ask quote.  Mirrors the subset of MQL5 `MqlTick` that
/// the front end consumes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    /// Price at which we can buy.
    pub ask: f64,

    /// Price at which we can sell.
    pub bid: f64,

    /// Terminal time of the quote, seconds since the Unix epoch.
    pub time: i64,
}

impl Tick {
    /// Price a market order on `side` fills against: ask for buys, bid for
    /// sells.
    #[inline]
    pub fn price_for(&self, side: Side) -> f64 {
        match side {
            Side::Buy => self.ask,
            Side::Sell => self.bid,
        }
    }

    #[inline]
    pub fn mid(&self) -> f64 {
        (self.bid + self.ask) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_for_side() {
        let tick = Tick { ask: 1.1002, bid: 1.1000, time: 0 };
        assert_eq!(tick.price_for(Side::Buy), 1.1002);
        assert_eq!(tick.price_for(Side::Sell), 1.1000);
    }

    #[test]
    fn test_serializes_as_price_entry() {
        let tick = Tick { ask: 1.5, bid: 1.4, time: 1_700_000_000 };
        let value = serde_json::to_value(tick).unwrap();
        assert_eq!(value, serde_json::json!({ "ask": 1.5, "bid": 1.4, "time": 1_700_000_000 }));
    }
}
