//! # connector::paper
//!
//! [`PaperTerminal`] — an in-memory MT5 stand-in.
//!
//! Selected with `MT5_BASE_URL=mock` so the front end can be developed without
//! a terminal, and used as the mocked connector throughout the test suite.
//!
//! Behaviour:
//! * opens fill at the live tick (ask for buys, bid for sells) and create a
//!   position with a fresh ticket
//! * closes remove the referenced position; closing a ticket that is already
//!   gone answers `POSITION_CLOSED`
//! * a scripted fill or retcode overrides the simulation for every order

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use crate::connector::{retcode, Connector, ConnectorError, OrderRequest, OrderResult};
use crate::models::{Bar, Position, SymbolInfo, Tick, Timeframe, TradeMode};

/// Majors the mock terminal starts with, with a plausible bid and spread.
const SEED_QUOTES: &[(&str, f64, f64)] = &[
    ("EURUSD", 1.08500, 0.00010),
    ("GBPUSD", 1.27000, 0.00012),
    ("USDJPY", 151.200, 0.010),
    ("AUDUSD", 0.65500, 0.00010),
    ("USDCAD", 1.36000, 0.00015),
    ("NZDUSD", 0.60500, 0.00015),
];

// ─── Book ─────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct PaperBook {
    initialized: bool,
    init_failure: Option<(i32, String)>,
    symbols: HashMap<String, SymbolInfo>,
    ticks: HashMap<String, Tick>,
    rates: HashMap<String, Vec<Bar>>,
    positions: Vec<Position>,
    next_ticket: u64,
    scripted: Option<OrderResult>,
    sent: Vec<OrderRequest>,
}

impl PaperBook {
    fn issue_ticket(&mut self) -> u64 {
        self.next_ticket += 1;
        self.next_ticket
    }

    fn fill(&mut self, request: &OrderRequest) -> OrderResult {
        let Some(tick) = self.ticks.get(&request.symbol).copied() else {
            return rejected(retcode::REJECT, "no quotes");
        };
        if request.volume <= 0.0 {
            return rejected(retcode::INVALID_VOLUME, "invalid volume");
        }
        let price = tick.price_for(request.side);

        match request.position {
            Some(ticket) => {
                let Some(index) = self.positions.iter().position(|p| p.ticket == ticket) else {
                    return rejected(retcode::POSITION_CLOSED, "position already closed");
                };
                self.positions.remove(index);
                let deal = self.issue_ticket();
                OrderResult {
                    retcode: retcode::DONE,
                    order:   deal,
                    deal,
                    volume:  request.volume,
                    price,
                    comment: "Request executed".into(),
                }
            }
            None => {
                let ticket = self.issue_ticket();
                self.positions.push(Position {
                    ticket,
                    symbol:        request.symbol.clone(),
                    side:          request.side,
                    volume:        request.volume,
                    open_price:    price,
                    current_price: tick.price_for(request.side.opposite()),
                    profit:        0.0,
                    sl:            request.sl.unwrap_or(0.0),
                    tp:            request.tp.unwrap_or(0.0),
                });
                OrderResult {
                    retcode: retcode::DONE,
                    order:   ticket,
                    deal:    ticket,
                    volume:  request.volume,
                    price,
                    comment: "Request executed".into(),
                }
            }
        }
    }

    /// Flat bars around the current mid, newest last.
    fn synthesize_rates(&self, symbol: &str, timeframe: Timeframe, start_pos: u32, count: u32) -> Option<Vec<Bar>> {
        let tick = self.ticks.get(symbol)?;
        let step = timeframe.seconds();
        let current = Utc::now().timestamp() / step * step;
        let mid = tick.mid();
        let spread = ((tick.ask - tick.bid) * 100_000.0).round() as i32;

        let bars = (0..count)
            .rev()
            .map(|i| Bar {
                time:        current - (i64::from(start_pos) + i64::from(i)) * step,
                open:        mid,
                high:        mid,
                low:         mid,
                close:       mid,
                tick_volume: 0,
                spread,
                real_volume: 0,
            })
            .collect();
        Some(bars)
    }
}

fn rejected(code: u32, comment: &str) -> OrderResult {
    OrderResult {
        retcode: code,
        order:   0,
        deal:    0,
        volume:  0.0,
        price:   0.0,
        comment: comment.to_string(),
    }
}

fn forex_symbol(name: &str) -> SymbolInfo {
    SymbolInfo {
        name:            name.to_string(),
        description:     format!("{} vs {}", &name[..3], &name[3..]),
        currency_base:   name[..3].to_string(),
        currency_profit: name[3..].to_string(),
        visible:         true,
        trade_mode:      TradeMode::Full,
    }
}

// ─── PaperTerminal ────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct PaperTerminal {
    book: Mutex<PaperBook>,
}

impl PaperTerminal {
    /// Empty terminal: no symbols, no quotes, no positions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Terminal seeded with the six majors, all visible and fully tradable.
    pub fn with_majors() -> Self {
        let terminal = Self::new();
        let now = Utc::now().timestamp();
        for &(name, bid, spread) in SEED_QUOTES {
            terminal.add_symbol(forex_symbol(name));
            terminal.set_tick(name, Tick { bid, ask: bid + spread, time: now });
        }
        terminal
    }

    fn book(&self) -> MutexGuard<'_, PaperBook> {
        // A panic while holding the lock only happens in a failing test;
        // the book itself stays usable.
        self.book.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ── Scripting ─────────────────────────────────────────────────────────────

    pub fn add_symbol(&self, info: SymbolInfo) {
        self.book().symbols.insert(info.name.clone(), info);
    }

    pub fn set_tick(&self, symbol: &str, tick: Tick) {
        self.book().ticks.insert(symbol.to_string(), tick);
    }
}

/// Scripting and inspection hooks for tests.
#[cfg(test)]
impl PaperTerminal {
    pub fn remove_tick(&self, symbol: &str) {
        self.book().ticks.remove(symbol);
    }

    pub fn set_rates(&self, symbol: &str, bars: Vec<Bar>) {
        self.book().rates.insert(symbol.to_string(), bars);
    }

    /// Places a position directly, as if opened from the terminal UI.
    pub fn open_position(&self, position: Position) {
        let mut book = self.book();
        book.next_ticket = book.next_ticket.max(position.ticket);
        book.positions.push(position);
    }

    /// Every subsequent `order_send` answers with `result`.
    pub fn script_result(&self, result: OrderResult) {
        self.book().scripted = Some(result);
    }

    /// Every subsequent `order_send` is rejected with `code`.
    pub fn reject_orders(&self, code: u32) {
        self.script_result(rejected(code, "scripted rejection"));
    }

    /// Every subsequent `initialize` fails with the given native error.
    pub fn fail_initialize(&self, code: i32, message: &str) {
        self.book().init_failure = Some((code, message.to_string()));
    }

    // ── Inspection ────────────────────────────────────────────────────────────

    pub fn is_initialized(&self) -> bool {
        self.book().initialized
    }

    pub fn sent_orders(&self) -> Vec<OrderRequest> {
        self.book().sent.clone()
    }

    pub fn open_positions(&self) -> Vec<Position> {
        self.book().positions.clone()
    }
}

#[async_trait]
impl Connector for PaperTerminal {
    async fn initialize(&self) -> Result<(), ConnectorError> {
        let mut book = self.book();
        if let Some((code, message)) = book.init_failure.clone() {
            book.initialized = false;
            return Err(ConnectorError::Native { code, message });
        }
        book.initialized = true;
        info!("🎭 paper terminal initialized");
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), ConnectorError> {
        self.book().initialized = false;
        Ok(())
    }

    async fn symbol_info(&self, symbol: &str) -> Result<Option<SymbolInfo>, ConnectorError> {
        Ok(self.book().symbols.get(symbol).cloned())
    }

    async fn symbol_select(&self, symbol: &str, enable: bool) -> Result<bool, ConnectorError> {
        let mut book = self.book();
        match book.symbols.get_mut(symbol) {
            Some(info) => {
                info.visible = enable;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn symbols(&self) -> Result<Vec<SymbolInfo>, ConnectorError> {
        let book = self.book();
        let mut symbols: Vec<SymbolInfo> = book.symbols.values().cloned().collect();
        symbols.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(symbols)
    }

    async fn symbol_tick(&self, symbol: &str) -> Result<Option<Tick>, ConnectorError> {
        Ok(self.book().ticks.get(symbol).copied())
    }

    async fn positions(&self, symbol: Option<&str>) -> Result<Vec<Position>, ConnectorError> {
        let book = self.book();
        Ok(book
            .positions
            .iter()
            .filter(|p| symbol.map_or(true, |s| p.symbol == s))
            .cloned()
            .collect())
    }

    async fn order_send(&self, request: &OrderRequest) -> Result<OrderResult, ConnectorError> {
        let mut book = self.book();
        book.sent.push(request.clone());
        if let Some(scripted) = book.scripted.clone() {
            return Ok(scripted);
        }
        Ok(book.fill(request))
    }

    async fn rates_from_pos(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start_pos: u32,
        count: u32,
    ) -> Result<Option<Vec<Bar>>, ConnectorError> {
        let book = self.book();
        if let Some(bars) = book.rates.get(symbol) {
            // Seeded bars are oldest first; start_pos counts back from the newest.
            let end = bars.len().saturating_sub(start_pos as usize);
            let begin = end.saturating_sub(count as usize);
            let slice = bars[begin..end].to_vec();
            return Ok(if slice.is_empty() { None } else { Some(slice) });
        }
        if count == 0 {
            return Ok(None);
        }
        Ok(book.synthesize_rates(symbol, timeframe, start_pos, count))
    }
}
