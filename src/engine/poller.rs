//! # engine::poller
//!
//! **Background Poller** — one iteration per interval for the life of the
//! service:
//!
//! ```text
//! 1. Skip if the session is down (cached values go stale)
//! 2. Fetch open positions
//! 3. Union their symbols into the tracked set
//! 4. Fetch a tick for every tracked symbol (concurrently; misses skipped)
//! 5. Swap in the new position snapshot
//! ```

use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::engine::market_data::get_price;
use crate::state::{AppState, SharedState};

// ─── Handle ───────────────────────────────────────────────────────────────────

/// Owns the poller task.  Dropping the handle without calling [`stop`] leaves
/// the task running until the runtime shuts down.
///
/// [`stop`]: PollerHandle::stop
pub struct PollerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Signals the loop to exit and waits for the in-flight iteration.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "poller task ended abnormally");
        }
        info!("poller stopped");
    }
}

pub fn spawn(state: SharedState, interval: Duration) -> PollerHandle {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval = ?interval, "📡 poller started");

        loop {
            tokio::select! {
                _ = ticker.tick() => poll_once(&state).await,
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }
    });

    PollerHandle { shutdown_tx, task }
}

// ─── Iteration ────────────────────────────────────────────────────────────────

pub async fn poll_once(state: &AppState) {
    let Ok(terminal) = state.session().terminal() else {
        return;
    };

    let positions = match terminal.positions(None).await {
        Ok(positions) => Some(positions),
        Err(e) => {
            warn!(error = %e, "position refresh failed, keeping previous snapshot");
            None
        }
    };

    if let Some(positions) = &positions {
        let added = state
            .market()
            .track(positions.iter().map(|p| p.symbol.as_str()))
            .await;
        if !added.is_empty() {
            info!(symbols = ?added, "tracking symbols from open positions");
        }
    }

    let symbols = state.market().tracked_symbols().await;
    let lookups = symbols.into_iter().map(|symbol| async move {
        let tick = get_price(state.session(), &symbol).await;
        (symbol, tick)
    });
    let ticks: Vec<_> = join_all(lookups)
        .await
        .into_iter()
        .filter_map(|(symbol, tick)| tick.map(|t| (symbol, t)))
        .collect();

    debug!(refreshed = ticks.len(), "prices refreshed");
    state.market().store_all(ticks).await;

    if let Some(positions) = positions {
        state.replace_positions(positions).await;
    }
}
