//! # engine::session
//!
//! Connection state for the terminal.  Every terminal call except
//! connect/disconnect goes through [`Session::terminal`], which fails fast with
//! [`AppError::NotConnected`] instead of reconnecting.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::connector::{Connector, ConnectorError};
use crate::error::AppError;

pub struct Session {
    connector: Arc<dyn Connector>,
    connected: AtomicBool,
    /// Serialises connect/disconnect against each other.
    lifecycle: Mutex<()>,
}

impl Session {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            connected: AtomicBool::new(false),
            lifecycle: Mutex::new(()),
        }
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Initializes (or re-initializes) the terminal session.
    pub async fn connect(&self) -> bool {
        let _guard = self.lifecycle.lock().await;

        match self.connector.initialize().await {
            Ok(()) => {
                self.connected.store(true, Ordering::Release);
                info!("✅ Connected to MetaTrader 5");
                true
            }
            Err(ConnectorError::Native { code, message }) => {
                self.connected.store(false, Ordering::Release);
                error!(code, message = %message, "MT5 initialization failed");
                false
            }
            Err(e) => {
                self.connected.store(false, Ordering::Release);
                error!(error = %e, "MT5 initialization failed");
                false
            }
        }
    }

    /// Shuts the session down if it is up.  Always leaves the session
    /// disconnected.
    pub async fn disconnect(&self) {
        let _guard = self.lifecycle.lock().await;

        if self.connected.swap(false, Ordering::AcqRel) {
            if let Err(e) = self.connector.shutdown().await {
                warn!(error = %e, "MT5 shutdown reported an error");
            }
            info!("🔌 Disconnected from MetaTrader 5");
        }
    }

    /// The connector, if the session is up.
    pub fn terminal(&self) -> Result<&dyn Connector, AppError> {
        if self.is_connected() {
            Ok(self.connector.as_ref())
        } else {
            Err(AppError::NotConnected)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::PaperTerminal;

    #[tokio::test]
    async fn test_starts_disconnected_and_fails_fast() {
        let session = Session::new(Arc::new(PaperTerminal::with_majors()));
        assert!(!session.is_connected());
        assert!(matches!(session.terminal(), Err(AppError::NotConnected)));
    }

    #[tokio::test]
    async fn test_connect_is_idempotent() {
        let terminal = Arc::new(PaperTerminal::with_majors());
        let session = Session::new(terminal.clone());
        assert!(session.connect().await);
        assert!(session.connect().await);
        assert!(session.is_connected());
        assert!(terminal.is_initialized());
    }

    #[tokio::test]
    async fn test_failed_connect_leaves_disconnected() {
        let terminal = Arc::new(PaperTerminal::with_majors());
        let session = Session::new(terminal.clone());
        assert!(session.connect().await);

        terminal.fail_initialize(-6, "Terminal: Authorization failed");
        assert!(!session.connect().await);
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn test_disconnect_is_safe_when_not_connected() {
        let terminal = Arc::new(PaperTerminal::with_majors());
        let session = Session::new(terminal.clone());
        session.disconnect().await;
        assert!(!session.is_connected());

        session.connect().await;
        session.disconnect().await;
        assert!(!session.is_connected());
        assert!(!terminal.is_initialized());
    }
}
