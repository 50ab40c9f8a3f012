//! Domain models shared across the bridge.

pub mod market;
pub mod position;
pub mod tick;
pub mod trade;

pub use market::{Bar, SymbolInfo, SymbolSummary, Timeframe, TradeMode};
pub use position::{Position, Side, TradeRecord};
pub use tick::Tick;
pub use trade::{CloseReport, FailedClose, TradeFill, TradeRequest};
