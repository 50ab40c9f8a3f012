//! # engine::trader
//!
//! **Trade Service** — opens and closes positions, and serves the symbol
//! catalogue and bar history.
//!
//! ## Open sequence
//! ```text
//! 1. Session up?                 → NotConnected
//! 2. Symbol known?               → SymbolNotFound
//! 3. Trade mode not disabled?    → TradeDisabled
//!    Not visible → symbol_select (best-effort)
//! 4. Live tick (ask/bid by side) → Unavailable
//! 5. order_send (deviation 10, GTC, IOC, magic)
//! 6. retcode == DONE?            → OrderRejected
//! 7. Append TradeRecord
//! ```

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::connector::{Connector, OrderRequest};
use crate::error::AppError;
use crate::models::{
    Bar, CloseReport, FailedClose, Position, SymbolSummary, Timeframe, TradeFill, TradeRecord,
    TradeRequest,
};
use crate::state::AppState;

// ─── Open ─────────────────────────────────────────────────────────────────────

pub async fn execute_trade(state: &AppState, request: TradeRequest) -> Result<TradeFill, AppError> {
    let terminal = state.session().terminal()?;
    let symbol = request.symbol.as_str();

    let info = terminal
        .symbol_info(symbol)
        .await?
        .ok_or_else(|| AppError::SymbolNotFound(symbol.to_string()))?;

    if !info.is_tradable() {
        return Err(AppError::TradeDisabled(symbol.to_string()));
    }

    if !info.visible {
        match terminal.symbol_select(symbol, true).await {
            Ok(true) => info!(symbol, "symbol added to Market Watch"),
            Ok(false) => warn!(symbol, "terminal refused to select symbol, trying anyway"),
            Err(e) => warn!(symbol, error = %e, "symbol_select failed, trying anyway"),
        }
    }

    // Always the live quote, never the poller's cache.
    let tick = terminal
        .symbol_tick(symbol)
        .await?
        .ok_or_else(|| AppError::Unavailable(format!("No price available for {symbol}")))?;
    let price = tick.price_for(request.side);

    let order = OrderRequest::open(
        symbol,
        request.side,
        request.lot_size,
        price,
        request.stop_loss,
        request.take_profit,
    );

    let result = terminal.order_send(&order).await?;
    if !result.is_done() {
        return Err(AppError::OrderRejected {
            retcode: result.retcode,
            comment: result.comment,
        });
    }

    state
        .push_trade_record(TradeRecord {
            trade_id:    Uuid::new_v4(),
            timestamp:   Utc::now(),
            symbol:      symbol.to_string(),
            direction:   request.side,
            volume:      result.volume,
            price:       result.price,
            order_id:    result.order,
            stop_loss:   request.stop_loss,
            take_profit: request.take_profit,
        })
        .await;

    info!(
        order_id = result.order,
        symbol,
        side     = %request.side,
        volume   = result.volume,
        price    = result.price,
        "✅ order executed"
    );

    Ok(TradeFill {
        order_id: result.order,
        volume:   result.volume,
        price:    result.price,
        symbol:   symbol.to_string(),
    })
}

// ─── Close ────────────────────────────────────────────────────────────────────

/// Closes every open position (or every position on `symbol`).  Individual
/// failures land in [`CloseReport::failed`] and never abort the sweep.
pub async fn close_positions(state: &AppState, symbol: Option<&str>) -> Result<CloseReport, AppError> {
    let terminal = state.session().terminal()?;
    let positions = terminal.positions(symbol).await?;

    let mut report = CloseReport::default();
    for position in positions {
        match close_one(terminal, &position).await {
            Ok(()) => report.closed.push(position),
            Err(reason) => {
                warn!(ticket = position.ticket, symbol = %position.symbol, reason = %reason, "close failed");
                report.failed.push(FailedClose {
                    ticket: position.ticket,
                    symbol: position.symbol,
                    reason,
                });
            }
        }
    }

    info!(
        closed = report.closed_count(),
        failed = report.failed.len(),
        "close sweep finished"
    );
    Ok(report)
}

async fn close_one(terminal: &dyn Connector, position: &Position) -> Result<(), String> {
    let tick = terminal
        .symbol_tick(&position.symbol)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("No price available for {}", position.symbol))?;

    // Closing a buy sells at bid; closing a sell buys at ask.
    let price = tick.price_for(position.side.opposite());
    let order = OrderRequest::close(position, price);

    let result = terminal.order_send(&order).await.map_err(|e| e.to_string())?;
    if result.is_done() {
        Ok(())
    } else {
        Err(format!("Order failed, return code: {}", result.retcode))
    }
}

// ─── Catalogue / History ──────────────────────────────────────────────────────

/// Instruments whose trade mode is not disabled.
pub async fn symbols(state: &AppState) -> Result<Vec<SymbolSummary>, AppError> {
    let terminal = state.session().terminal()?;
    let all = terminal.symbols().await?;
    Ok(all
        .iter()
        .filter(|info| info.is_tradable())
        .map(SymbolSummary::from)
        .collect())
}

pub async fn historical_data(
    state: &AppState,
    symbol: &str,
    timeframe: Timeframe,
    start_pos: u32,
    count: u32,
) -> Result<Vec<Bar>, AppError> {
    let terminal = state.session().terminal()?;
    terminal
        .rates_from_pos(symbol, timeframe, start_pos, count)
        .await?
        .filter(|bars| !bars.is_empty())
        .ok_or_else(|| AppError::Unavailable(format!("No historical data available for {symbol}")))
}
