//! Terminal-facing services: session, price cache, poller, trading.

pub mod market_data;
pub mod poller;
pub mod session;
pub mod trader;
