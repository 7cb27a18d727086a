//! JSON-RPC request handlers.
//!
//! The HTTP surface exposes exactly the methods the registry answers over
//! IPC, so tooling can inspect a running directory with plain HTTP.

use crate::server::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use labrad_core::ipc::IpcDispatch;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// JSON-RPC 2.0 request structure.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 error structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(id: Option<Value>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(JsonRpcError { code, message }),
            id,
        }
    }
}

pub async fn handle_health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// Main JSON-RPC handler.
pub async fn handle_rpc(
    State(state): State<Arc<AppState>>,
    Json(request): Json<JsonRpcRequest>,
) -> impl IntoResponse {
    (StatusCode::OK, Json(dispatch_rpc(&state, request).await))
}

async fn dispatch_rpc(state: &AppState, request: JsonRpcRequest) -> JsonRpcResponse {
    let params = request.params.unwrap_or(Value::Object(Default::default()));
    let id = request.id;

    debug!("RPC call: {}({:?})", request.method, params);

    match state.registry.dispatch(&request.method, params).await {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => {
            warn!("RPC error for {}: {}", request.method, e);
            JsonRpcResponse::error(id, e.to_rpc_error_code(), e.to_string())
        }
    }
}
