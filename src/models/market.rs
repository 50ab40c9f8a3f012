//! # models::market
//!
//! Instrument metadata, bar history and timeframe codes.

use serde::{Deserialize, Serialize};

// ─── TradeMode ────────────────────────────────────────────────────────────────

/// Mirrors MQL5 `ENUM_SYMBOL_TRADE_MODE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeMode {
    Disabled,
    LongOnly,
    ShortOnly,
    CloseOnly,
    Full,
}

// ─── SymbolInfo ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub currency_base: String,
    pub currency_profit: String,
    /// Shown in Market Watch.  Ticks only flow for visible symbols.
    pub visible: bool,
    pub trade_mode: TradeMode,
}

impl SymbolInfo {
    #[inline]
    pub fn is_tradable(&self) -> bool {
        self.trade_mode != TradeMode::Disabled
    }
}

/// What `/symbols` publishes per instrument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolSummary {
    pub name: String,
    pub currency_base: String,
    pub currency_profit: String,
    pub description: String,
}

impl From<&SymbolInfo> for SymbolSummary {
    fn from(info: &SymbolInfo) -> Self {
        Self {
            name:            info.name.clone(),
            currency_base:   info.currency_base.clone(),
            currency_profit: info.currency_profit.clone(),
            description:     info.description.clone(),
        }
    }
}

// ─── Bar ──────────────────────────────────────────────────────────────────────

/// One OHLC bar, same layout as MQL5 `MqlRates`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Bar open time, seconds since the Unix epoch.
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(rename = "volume")]
    pub tick_volume: u64,
    pub spread: i32,
    pub real_volume: u64,
}

// ─── Timeframe ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Timeframe {
    M1,
    M5,
    M15,
    M30,
    #[default]
    H1,
    H4,
    D1,
    W1,
    #[serde(rename = "MN1")]
    Mn1,
}

impl Timeframe {
    /// Maps a client code to a timeframe.  Unknown codes fall back to H1.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "M1" => Timeframe::M1,
            "M5" => Timeframe::M5,
            "M15" => Timeframe::M15,
            "M30" => Timeframe::M30,
            "H1" => Timeframe::H1,
            "H4" => Timeframe::H4,
            "D1" => Timeframe::D1,
            "W1" => Timeframe::W1,
            "MN1" => Timeframe::Mn1,
            _ => Timeframe::default(),
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Timeframe::M1 => "M1",
            Timeframe::M5 => "M5",
            Timeframe::M15 => "M15",
            Timeframe::M30 => "M30",
            Timeframe::H1 => "H1",
            Timeframe::H4 => "H4",
            Timeframe::D1 => "D1",
            Timeframe::W1 => "W1",
            Timeframe::Mn1 => "MN1",
        }
    }

    /// Nominal bar length.  MN1 is approximated as 30 days.
    pub fn seconds(self) -> i64 {
        match self {
            Timeframe::M1 => 60,
            Timeframe::M5 => 5 * 60,
            Timeframe::M15 => 15 * 60,
            Timeframe::M30 => 30 * 60,
            Timeframe::H1 => 60 * 60,
            Timeframe::H4 => 4 * 60 * 60,
            Timeframe::D1 => 24 * 60 * 60,
            Timeframe::W1 => 7 * 24 * 60 * 60,
            Timeframe::Mn1 => 30 * 24 * 60 * 60,
        }
    }
}
