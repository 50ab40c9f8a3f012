//! # routes::terminal
//!
//! Session endpoints.
//!
//! | Method | Path          | Description                         |
//! |--------|---------------|-------------------------------------|
//! | GET    | `/status`     | Is the terminal session up?         |
//! | GET    | `/connect`    | (Re-)initialize the terminal        |
//! | GET    | `/disconnect` | Shut the terminal session down      |

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::SharedState;

/// GET /status
pub async fn status(State(state): State<SharedState>) -> Json<Value> {
    Json(json!({ "connected": state.session().is_connected() }))
}

/// GET /connect
pub async fn connect(State(state): State<SharedState>) -> Json<Value> {
    let success = state.session().connect().await;
    Json(json!({
        "success":   success,
        "connected": state.session().is_connected(),
    }))
}

/// GET /disconnect
pub async fn disconnect(State(state): State<SharedState>) -> Json<Value> {
    state.session().disconnect().await;
    Json(json!({
        "success":   true,
        "connected": false,
    }))
}
