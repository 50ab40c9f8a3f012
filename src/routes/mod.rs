//! # routes
//!
//! The HTTP façade.  Every response is HTTP 200 JSON with permissive CORS
//! headers; OPTIONS gets the headers and an empty body.  Unknown paths and
//! wrong methods on known paths answer `{ "error": "Unknown endpoint" }`.

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::{error::AppError, state::SharedState};

pub mod market;
pub mod terminal;
pub mod trade;

const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type";

pub fn router(state: SharedState) -> Router {
    // CorsLayer answers every OPTIONS itself and stamps the origin; the
    // methods/headers pair only goes on preflights there, so it is added to
    // the remaining responses below.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        // ── Session ───────────────────────────────────────────────────────────
        .route("/status",          get(terminal::status).fallback(unknown_endpoint))
        .route("/connect",         get(terminal::connect).fallback(unknown_endpoint))
        .route("/disconnect",      get(terminal::disconnect).fallback(unknown_endpoint))
        // ── Market Data ───────────────────────────────────────────────────────
        .route("/prices",          get(market::prices).fallback(unknown_endpoint))
        .route("/positions",       get(market::positions).fallback(unknown_endpoint))
        .route("/symbols",         get(market::symbols).fallback(unknown_endpoint))
        .route("/history",         get(market::history).fallback(unknown_endpoint))
        // ── Trading ───────────────────────────────────────────────────────────
        .route("/trade",           post(trade::trade).fallback(unknown_endpoint))
        .route("/close_positions", post(trade::close_positions).fallback(unknown_endpoint))
        .route("/trade_history",   get(trade::trade_history).fallback(unknown_endpoint))
        .fallback(unknown_endpoint)
        // ── Middleware ────────────────────────────────────────────────────────
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        ))
        .with_state(state)
}

async fn unknown_endpoint() -> AppError {
    AppError::UnknownEndpoint
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{HeaderMap, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::connector::{retcode, OrderResult, PaperTerminal};
    use crate::engine::poller::poll_once;
    use crate::models::Bar;
    use crate::state::build_state;

    async fn send(state: &SharedState, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, body)
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn assert_cors(headers: &HeaderMap) {
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert!(headers.contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
        assert!(headers.contains_key(header::ACCESS_CONTROL_ALLOW_HEADERS));
    }

    async fn connected_state() -> (SharedState, Arc<PaperTerminal>) {
        let terminal = Arc::new(PaperTerminal::with_majors());
        let state = build_state(terminal.clone(), vec!["EURUSD".into(), "GBPUSD".into()]);
        assert!(state.session().connect().await);
        (state, terminal)
    }

    #[tokio::test]
    async fn test_status_while_disconnected() {
        let state = build_state(Arc::new(PaperTerminal::with_majors()), Vec::new());
        let (status, headers, body) = send(&state, get_req("/status")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "connected": false }));
        assert_cors(&headers);
    }

    #[tokio::test]
    async fn test_connect_and_disconnect() {
        let state = build_state(Arc::new(PaperTerminal::with_majors()), Vec::new());

        let (_, _, body) = send(&state, get_req("/connect")).await;
        assert_eq!(body, json!({ "success": true, "connected": true }));

        let (_, _, body) = send(&state, get_req("/disconnect")).await;
        assert_eq!(body, json!({ "success": true, "connected": false }));

        let (_, _, body) = send(&state, get_req("/disconnect")).await;
        assert_eq!(body, json!({ "success": true, "connected": false }));
    }

    #[tokio::test]
    async fn test_connect_failure_reported() {
        let terminal = Arc::new(PaperTerminal::with_majors());
        terminal.fail_initialize(-10005, "IPC timeout");
        let state = build_state(terminal, Vec::new());

        let (_, _, body) = send(&state, get_req("/connect")).await;
        assert_eq!(body, json!({ "success": false, "connected": false }));
    }

    #[tokio::test]
    async fn test_preflight_has_headers_and_no_body() {
        let state = build_state(Arc::new(PaperTerminal::with_majors()), Vec::new());
        let request = Request::options("/trade")
            .header(header::ORIGIN, "chrome-extension://abc")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();

        let (status, headers, body) = send(&state, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Null);
        assert_cors(&headers);
    }

    #[tokio::test]
    async fn test_unknown_endpoint_is_200() {
        let state = build_state(Arc::new(PaperTerminal::with_majors()), Vec::new());

        let (status, headers, body) = send(&state, get_req("/nope")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "error": "Unknown endpoint" }));
        assert_cors(&headers);

        let (status, _, body) = send(&state, post_json("/status", json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "error": "Unknown endpoint" }));

        let (_, _, body) = send(&state, get_req("/trade")).await;
        assert_eq!(body, json!({ "error": "Unknown endpoint" }));
    }

    #[tokio::test]
    async fn test_trade_end_to_end_with_scripted_fill() {
        let (state, terminal) = connected_state().await;
        terminal.script_result(OrderResult {
            retcode: retcode::DONE,
            order:   555,
            deal:    1,
            volume:  0.01,
            price:   1.2345,
            comment: String::new(),
        });

        let (status, headers, body) = send(
            &state,
            post_json("/trade", json!({ "direction": "buy", "symbol": "EURUSD", "lotSize": 0.01 })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_cors(&headers);
        assert_eq!(body["success"], true);
        assert_eq!(body["order_id"], 555);
        assert_eq!(body["volume"], 0.01);
        assert_eq!(body["price"], 1.2345);
        assert_eq!(body["symbol"], "EURUSD");

        let (_, _, body) = send(&state, get_req("/trade_history")).await;
        let history = body["history"].as_array().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0]["order_id"], 555);
        assert_eq!(history[0]["direction"], "buy");
    }

    #[tokio::test]
    async fn test_trade_failures_are_200_with_message() {
        let state = build_state(Arc::new(PaperTerminal::with_majors()), Vec::new());
        let (status, _, body) = send(&state, post_json("/trade", json!({ "direction": "buy" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": false, "message": "Not connected to MT5" }));

        let (state, _) = connected_state().await;
        let (_, _, body) = send(&state, post_json("/trade", json!({ "direction": "long" }))).await;
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().contains("long"));

        let (status, _, body) = send(
            &state,
            Request::post("/trade").body(Body::from("{not json")).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);

        assert!(state.trade_history().await.is_empty());
    }

    #[tokio::test]
    async fn test_trade_rejection_includes_retcode() {
        let (state, terminal) = connected_state().await;
        // TRADE_RETCODE_REQUOTE
        terminal.reject_orders(10004);

        let (_, _, body) = send(&state, post_json("/trade", json!({ "direction": "sell" }))).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Order failed, return code: 10004");
        assert_eq!(body["retcode"], 10004);
    }

    #[tokio::test]
    async fn test_close_positions_empty_and_without_body() {
        let (state, _) = connected_state().await;
        let (_, _, body) = send(&state, Request::post("/close_positions").body(Body::empty()).unwrap()).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["closed_count"], 0);
        assert_eq!(body["closed"], json!([]));
        assert_eq!(body["message"], "No positions to close");
    }

    #[tokio::test]
    async fn test_concurrent_close_positions_never_double_count() {
        let (state, _) = connected_state().await;
        let (_, _, opened) = send(&state, post_json("/trade", json!({ "direction": "buy" }))).await;
        assert_eq!(opened["success"], true);

        let first = tokio::spawn({
            let state = state.clone();
            async move { send(&state, post_json("/close_positions", json!({}))).await }
        });
        let second = tokio::spawn({
            let state = state.clone();
            async move { send(&state, post_json("/close_positions", json!({ "symbol": null }))).await }
        });

        let (_, _, a) = first.await.unwrap();
        let (_, _, b) = second.await.unwrap();
        let counts = [a["closed_count"].as_u64().unwrap(), b["closed_count"].as_u64().unwrap()];
        assert_eq!(counts.iter().sum::<u64>(), 1);
    }

    #[tokio::test]
    async fn test_prices_and_positions_follow_poller() {
        let (state, _) = connected_state().await;
        let (_, _, body) = send(&state, get_req("/prices")).await;
        assert_eq!(body, json!({}));

        send(&state, post_json("/trade", json!({ "direction": "sell", "symbol": "AUDUSD" }))).await;
        poll_once(&state).await;

        let (_, _, prices) = send(&state, get_req("/prices")).await;
        assert!(prices["EURUSD"]["ask"].is_number());
        assert!(prices["AUDUSD"]["bid"].is_number(), "position symbols are tracked");

        let (_, _, positions) = send(&state, get_req("/positions")).await;
        assert_eq!(positions[0]["symbol"], "AUDUSD");
        assert_eq!(positions[0]["type"], "sell");
    }

    #[tokio::test]
    async fn test_symbols_listing() {
        let (state, _) = connected_state().await;
        let (_, _, body) = send(&state, get_req("/symbols")).await;
        let symbols = body["symbols"].as_array().unwrap();
        assert_eq!(symbols.len(), 6);
        assert_eq!(symbols[0]["currency_base"], "AUD");

        let state = build_state(Arc::new(PaperTerminal::with_majors()), Vec::new());
        let (_, _, body) = send(&state, get_req("/symbols")).await;
        assert_eq!(body, json!({ "symbols": [] }));
    }

    #[tokio::test]
    async fn test_history_unknown_timeframe_matches_h1() {
        let (state, terminal) = connected_state().await;
        let bars: Vec<Bar> = (0..3)
            .map(|i| Bar {
                time: 3600 * i, open: 1.0, high: 1.1, low: 0.9, close: 1.05,
                tick_volume: 12, spread: 1, real_volume: 0,
            })
            .collect();
        terminal.set_rates("EURUSD", bars);

        let (_, _, h1) = send(&state, get_req("/history?symbol=EURUSD&timeframe=H1&start_pos=0&count=3")).await;
        let (_, _, bogus) = send(&state, get_req("/history?symbol=EURUSD&timeframe=X9&start_pos=0&count=3")).await;
        assert_eq!(h1["success"], true);
        assert_eq!(h1, bogus);
        assert_eq!(h1["data"][2]["volume"], 12);
        assert!(h1["data"][0].get("real_volume").is_some());
    }

    #[tokio::test]
    async fn test_history_failures() {
        let (state, _) = connected_state().await;
        let (_, _, body) = send(&state, get_req("/history?symbol=NOPE")).await;
        assert_eq!(body["success"], false);
        assert!(body["message"].is_string());

        let (status, _, body) = send(&state, get_req("/history?count=abc")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
    }
}
