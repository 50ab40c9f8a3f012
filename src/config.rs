//! # config
//!
//! Runtime settings, read from the environment (after `.env` is loaded).

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Context};

pub const DEFAULT_TRACKED_SYMBOLS: &[&str] = &["EURUSD", "GBPUSD", "USDJPY", "AUDUSD", "USDCAD", "NZDUSD"];

/// `MT5_BASE_URL` value that selects the in-memory paper terminal.
pub const MOCK_TERMINAL: &str = "mock";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// Terminal bridge base URL, or [`MOCK_TERMINAL`].
    pub mt5_base_url: String,
    pub mt5_timeout: Duration,
    pub poll_interval: Duration,
    pub tracked_symbols: Vec<String>,
    pub auto_connect: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let bind_addr: SocketAddr = lookup("BIND_ADDR")
            .unwrap_or_else(|| "127.0.0.1:5555".to_string())
            .parse()
            .context("BIND_ADDR must be host:port")?;

        let timeout_secs: u64 = lookup("MT5_TIMEOUT_SECS")
            .unwrap_or_else(|| "5".to_string())
            .parse()
            .context("MT5_TIMEOUT_SECS must be a number")?;

        let poll_ms: u64 = lookup("POLL_INTERVAL_MS")
            .unwrap_or_else(|| "1000".to_string())
            .parse()
            .context("POLL_INTERVAL_MS must be a number")?;
        if poll_ms == 0 {
            bail!("POLL_INTERVAL_MS must be greater than zero");
        }

        let tracked_symbols = match lookup("TRACKED_SYMBOLS") {
            Some(list) => list
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect(),
            None => DEFAULT_TRACKED_SYMBOLS.iter().map(|s| s.to_string()).collect(),
        };

        let auto_connect = match lookup("AUTO_CONNECT").as_deref().map(str::trim) {
            None | Some("") => true,
            Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => true,
            Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => false,
            Some(other) => bail!("AUTO_CONNECT must be true or false, got '{other}'"),
        };

        Ok(Self {
            bind_addr,
            mt5_base_url: lookup("MT5_BASE_URL").unwrap_or_else(|| "http://127.0.0.1:8081".to_string()),
            mt5_timeout: Duration::from_secs(timeout_secs),
            poll_interval: Duration::from_millis(poll_ms),
            tracked_symbols,
            auto_connect,
        })
    }

    pub fn uses_mock_terminal(&self) -> bool {
        self.mt5_base_url.eq_ignore_ascii_case(MOCK_TERMINAL)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:5555".parse::<SocketAddr>().unwrap());
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.tracked_symbols.len(), 6);
        assert!(config.auto_connect);
        assert!(!config.uses_mock_terminal());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("MT5_BASE_URL", "mock"),
            ("TRACKED_SYMBOLS", " xauusd, EURUSD ,,"),
            ("AUTO_CONNECT", "false"),
            ("POLL_INTERVAL_MS", "250"),
        ])
        .unwrap();
        assert!(config.uses_mock_terminal());
        assert_eq!(config.tracked_symbols, vec!["XAUUSD", "EURUSD"]);
        assert!(!config.auto_connect);
        assert_eq!(config.poll_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(load(&[("POLL_INTERVAL_MS", "soon")]).is_err());
        assert!(load(&[("POLL_INTERVAL_MS", "0")]).is_err());
        assert!(load(&[("BIND_ADDR", "localhost")]).is_err());
        assert!(load(&[("AUTO_CONNECT", "maybe")]).is_err());
    }
}
