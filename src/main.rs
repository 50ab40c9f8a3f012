//! # mt5-bridge — Local HTTP API for a MetaTrader 5 Terminal
//!
//! ## Architecture Overview
//!
//! ```text
//!  ┌──────────────┐  GET  /status /prices /positions   ┌────────────────────┐
//!  │  Browser     │  GET  /symbols /history ...        │ AppState           │
//!  │  front end   │ ─────────────────────────────────▶ │ ├─ session         │──▶ Connector ──▶ MT5
//!  └──────────────┘  POST /trade /close_positions      │ ├─ price cache     │      ▲
//!                                                      │ ├─ positions       │      │
//!                    ┌──────────────┐  every 1s        │ └─ trade history   │      │
//!                    │  Poller      │ ───────────────▶ └────────────────────┘ ─────┘
//!                    └──────────────┘
//! ```
//!
//! ## Environment Variables
//!
//! | Variable           | Default                  | Description                          |
//! |--------------------|--------------------------|--------------------------------------|
//! | `BIND_ADDR`        | `127.0.0.1:5555`         | Address Axum listens on (loopback)   |
//! | `MT5_BASE_URL`     | `http://127.0.0.1:8081`  | Terminal bridge, or `mock`           |
//! | `MT5_TIMEOUT_SECS` | `5`                      | Per-request bridge timeout           |
//! | `POLL_INTERVAL_MS` | `1000`                   | Price/position refresh interval      |
//! | `TRACKED_SYMBOLS`  | six majors               | Comma-separated initial symbols      |
//! | `AUTO_CONNECT`     | `true`                   | Connect to the terminal at startup   |
//! | `RUST_LOG`         | `mt5_bridge=debug`       | Tracing filter                       |

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod connector;
mod engine;
mod error;
mod models;
mod routes;
mod state;

use config::Config;
use connector::{Connector, HttpBridge, PaperTerminal};
use state::build_state;

// ─── Entry Point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Load .env ──────────────────────────────────────────────────────────
    dotenvy::dotenv().ok();

    // ── 2. Structured logging ─────────────────────────────────────────────────
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("mt5_bridge=debug".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    info!(r#"

  ╔═══════════════════════════════════════════════╗
  ║        MT5 BRIDGE — Local Trading API         ║
  ║   Status · Prices · Positions · Trade · Close ║
  ╚═══════════════════════════════════════════════╝"#);

    let config = Config::from_env().context("Failed to load config")?;

    // ── 3. Terminal connector ─────────────────────────────────────────────────
    let connector: Arc<dyn Connector> = if config.uses_mock_terminal() {
        info!("🎭 MT5_BASE_URL=mock — using the in-memory paper terminal");
        Arc::new(PaperTerminal::with_majors())
    } else {
        info!(bridge = %config.mt5_base_url, "using MT5 HTTP bridge");
        Arc::new(
            HttpBridge::new(&config.mt5_base_url, config.mt5_timeout)
                .context("Failed to build MT5 bridge client")?,
        )
    };

    // ── 4. Shared state + startup connect ─────────────────────────────────────
    let state = build_state(connector, config.tracked_symbols.clone());

    if config.auto_connect && !state.session().connect().await {
        warn!("starting without a terminal session — GET /connect to retry");
    }

    // ── 5. Background poller ──────────────────────────────────────────────────
    let poller = engine::poller::spawn(state.clone(), config.poll_interval);

    // ── 6. Bind & Serve ───────────────────────────────────────────────────────
    let app = routes::router(state.clone());
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "🚀 MT5 bridge listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // ── 7. Teardown ───────────────────────────────────────────────────────────
    poller.stop().await;
    state.session().disconnect().await;
    info!("server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
