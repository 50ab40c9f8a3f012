//! # connector::bridge
//!
//! [`HttpBridge`] — talks to a terminal-side process (an EA or a small script
//! next to the MT5 terminal) over JSON/HTTP.
//!
//! ## Bridge API Contract
//! ```text
//! POST /initialize                 → { "ok": bool, "code": i32, "message": str }
//! POST /shutdown
//! GET  /symbols                    → [SymbolInfo]
//! GET  /symbols/{name}             → SymbolInfo | null | 404
//! POST /symbols/{name}/select      { "enable": bool } → { "ok": bool }
//! GET  /ticks/{name}               → Tick | null | 404
//! GET  /positions?symbol=          → [Position]
//! POST /order/send                 OrderRequest → OrderResult
//! GET  /rates/{name}?timeframe=&start_pos=&count= → [Bar] | null
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use tracing::{debug, error, info};

use crate::connector::{Connector, ConnectorError, OrderRequest, OrderResult};
use crate::models::{Bar, Position, SymbolInfo, Tick, Timeframe};

// ─── Bridge Responses ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct InitializeResponse {
    ok: bool,
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct SelectResponse {
    ok: bool,
}

// ─── HttpBridge ───────────────────────────────────────────────────────────────

pub struct HttpBridge {
    base_url: String,
    client: Client,
}

impl HttpBridge {
    /// Fails only if the HTTP client cannot be built (TLS backend init).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConnectorError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| ConnectorError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Sends the request and decodes a 2xx JSON body.
    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ConnectorError> {
        let response = request.send().await.map_err(|e| {
            error!(error = %e, "MT5 bridge unreachable");
            ConnectorError::Transport(format!("MT5 bridge unreachable: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(http_status = %status, body = %body, "MT5 bridge returned HTTP error");
            return Err(ConnectorError::Transport(format!("MT5 bridge HTTP {status}: {body}")));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ConnectorError::BadResponse(e.to_string()))
    }

    /// Like [`Self::call`], but a 404 or a JSON `null` means "nothing there".
    async fn lookup<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, ConnectorError> {
        let response = request
            .send()
            .await
            .map_err(|e| ConnectorError::Transport(format!("MT5 bridge unreachable: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConnectorError::Transport(format!("MT5 bridge HTTP {status}: {body}")));
        }

        response
            .json::<Option<T>>()
            .await
            .map_err(|e| ConnectorError::BadResponse(e.to_string()))
    }
}

#[async_trait]
impl Connector for HttpBridge {
    async fn initialize(&self) -> Result<(), ConnectorError> {
        let resp: InitializeResponse = self.call(self.client.post(self.url("/initialize"))).await?;
        if resp.ok {
            info!(bridge = %self.base_url, "MT5 terminal initialized");
            Ok(())
        } else {
            Err(ConnectorError::Native { code: resp.code, message: resp.message })
        }
    }

    async fn shutdown(&self) -> Result<(), ConnectorError> {
        let response = self
            .client
            .post(self.url("/shutdown"))
            .send()
            .await
            .map_err(|e| ConnectorError::Transport(e.to_string()))?;
        debug!(status = %response.status(), "MT5 terminal shutdown requested");
        Ok(())
    }

    async fn symbol_info(&self, symbol: &str) -> Result<Option<SymbolInfo>, ConnectorError> {
        self.lookup(self.client.get(self.url(&format!("/symbols/{symbol}")))).await
    }

    async fn symbol_select(&self, symbol: &str, enable: bool) -> Result<bool, ConnectorError> {
        let resp: SelectResponse = self
            .call(
                self.client
                    .post(self.url(&format!("/symbols/{symbol}/select")))
                    .json(&json!({ "enable": enable })),
            )
            .await?;
        Ok(resp.ok)
    }

    async fn symbols(&self) -> Result<Vec<SymbolInfo>, ConnectorError> {
        self.call(self.client.get(self.url("/symbols"))).await
    }

    async fn symbol_tick(&self, symbol: &str) -> Result<Option<Tick>, ConnectorError> {
        self.lookup(self.client.get(self.url(&format!("/ticks/{symbol}")))).await
    }

    async fn positions(&self, symbol: Option<&str>) -> Result<Vec<Position>, ConnectorError> {
        let mut request = self.client.get(self.url("/positions"));
        if let Some(symbol) = symbol {
            request = request.query(&[("symbol", symbol)]);
        }
        self.call(request).await
    }

    async fn order_send(&self, request: &OrderRequest) -> Result<OrderResult, ConnectorError> {
        info!(
            symbol   = %request.symbol,
            side     = %request.side,
            volume   = request.volume,
            price    = request.price,
            position = ?request.position,
            "sending order to MT5 bridge"
        );
        self.call(self.client.post(self.url("/order/send")).json(request)).await
    }

    async fn rates_from_pos(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start_pos: u32,
        count: u32,
    ) -> Result<Option<Vec<Bar>>, ConnectorError> {
        let start_pos = start_pos.to_string();
        let count = count.to_string();
        let request = self
            .client
            .get(self.url(&format!("/rates/{symbol}")))
            .query(&[
                ("timeframe", timeframe.code()),
                ("start_pos", start_pos.as_str()),
                ("count", count.as_str()),
            ]);
        self.lookup(request).await
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        extract::Path,
        http::StatusCode as AxumStatus,
        response::{IntoResponse, Response},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::Value;

    use super::*;
    use crate::connector::retcode;
    use crate::models::Side;

    /// Serves `app` on an ephemeral loopback port and returns its base URL.
    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn bridge(base_url: &str) -> HttpBridge {
        HttpBridge::new(base_url, Duration::from_secs(2)).unwrap()
    }

    async fn symbol(Path(name): Path<String>) -> Response {
        if name != "EURUSD" {
            return AxumStatus::NOT_FOUND.into_response();
        }
        Json(json!({
            "name":            "EURUSD",
            "description":     "Euro vs US Dollar",
            "currency_base":   "EUR",
            "currency_profit": "USD",
            "visible":         true,
            "trade_mode":      "FULL",
        }))
        .into_response()
    }

    /// A terminal-side process that knows EURUSD only, has no quotes and no
    /// history, refuses to log in and fails position listing.
    fn terminal_stub() -> Router {
        Router::new()
            .route(
                "/initialize",
                post(|| async { Json(json!({ "ok": false, "code": -6, "message": "Authorization failed" })) }),
            )
            .route("/symbols/:name", get(symbol))
            .route("/ticks/:name", get(|| async { Json(Value::Null) }))
            .route("/rates/:name", get(|| async { Json(Value::Null) }))
            .route(
                "/positions",
                get(|| async { (AxumStatus::INTERNAL_SERVER_ERROR, "terminal busy") }),
            )
            .route(
                "/order/send",
                post(|Json(request): Json<OrderRequest>| async move {
                    Json(json!({
                        "retcode": retcode::DONE,
                        "order":   42,
                        "volume":  request.volume,
                        "price":   request.price,
                    }))
                }),
            )
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let bridge = bridge("http://127.0.0.1:8081/");
        assert_eq!(bridge.url("/order/send"), "http://127.0.0.1:8081/order/send");
    }

    #[tokio::test]
    async fn test_missing_lookups_are_none() {
        let bridge = bridge(&serve(terminal_stub()).await);

        let info = bridge.symbol_info("EURUSD").await.unwrap().unwrap();
        assert_eq!(info.currency_base, "EUR");
        assert!(bridge.symbol_info("NOPE").await.unwrap().is_none(), "404 is a miss");
        assert!(bridge.symbol_tick("EURUSD").await.unwrap().is_none(), "null is a miss");
        assert!(bridge
            .rates_from_pos("EURUSD", Timeframe::H1, 0, 10)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_http_error_is_transport_error() {
        let bridge = bridge(&serve(terminal_stub()).await);
        let err = bridge.positions(None).await.unwrap_err();
        assert!(matches!(err, ConnectorError::Transport(ref msg) if msg.contains("500")));
    }

    #[tokio::test]
    async fn test_refused_initialize_is_native_error() {
        let bridge = bridge(&serve(terminal_stub()).await);
        let err = bridge.initialize().await.unwrap_err();
        assert!(matches!(err, ConnectorError::Native { code: -6, ref message } if message == "Authorization failed"));
    }

    #[tokio::test]
    async fn test_order_send_decodes_result() {
        let bridge = bridge(&serve(terminal_stub()).await);
        let request = OrderRequest::open("EURUSD", Side::Buy, 0.2, 1.1, None, None);
        let result = bridge.order_send(&request).await.unwrap();
        assert!(result.is_done());
        assert_eq!(result.order, 42);
        assert_eq!(result.volume, 0.2);
    }

    #[tokio::test]
    async fn test_unreachable_bridge_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let bridge = HttpBridge::new(&format!("http://{addr}"), Duration::from_millis(500)).unwrap();
        let err = bridge.symbol_tick("EURUSD").await.unwrap_err();
        assert!(matches!(err, ConnectorError::Transport(_)));
    }
}
