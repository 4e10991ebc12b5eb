//! HTTP handlers for the key-value routes

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

use super::duration::parse_duration;
use crate::store::{KvStore, StoreError};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<KvStore>,

    /// TTL used when a set request has no valid `ttl`
    pub default_ttl: Duration,
}

impl AppState {
    pub fn new(store: Arc<KvStore>, default_ttl: Duration) -> Self {
        AppState { store, default_ttl }
    }
}

/// Query string of `GET /get`
#[derive(Debug, Deserialize)]
pub struct GetParams {
    pub key: Option<String>,
}

/// Query string of `DELETE /delete`
#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    #[serde(rename = "Key")]
    pub key: Option<String>,
}

/// Body of `POST /set` and `PATCH|PUT /update`
#[derive(Debug, Default, Deserialize)]
pub struct KeyValueRequest {
    #[serde(rename = "Key", default)]
    pub key: String,

    #[serde(default)]
    pub value: String,

    /// Duration string such as `30s` or `1h30m`; ignored by update
    #[serde(default)]
    pub ttl: String,
}

/// Response of `GET /get`
#[derive(Debug, Serialize)]
pub struct DataResponse {
    pub data: String,
}

/// Status/message body used by every other response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub message: String,
}

impl StatusResponse {
    fn success(message: impl Into<String>) -> Json<Self> {
        Json(StatusResponse {
            status: "Success",
            message: message.into(),
        })
    }

    fn failure(message: impl Into<String>) -> Json<Self> {
        Json(StatusResponse {
            status: "Failure",
            message: message.into(),
        })
    }
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, StatusResponse::failure(message)).into_response()
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = match self {
            StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            StoreError::AlreadyExists { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if self.is_persistence() {
            error!("Persistence error reached a request: {}", self);
        }
        (status, StatusResponse::failure(self.to_string())).into_response()
    }
}

/// Decode a JSON request body
///
/// The content type is not checked; any body that parses is accepted.
fn decode_body(body: &Bytes) -> Result<KeyValueRequest, Response> {
    serde_json::from_slice(body).map_err(|e| {
        debug!("Rejected request body: {}", e);
        bad_request("Error decoding request")
    })
}

/// `GET /get?key=K`
pub async fn get_key(State(state): State<AppState>, Query(params): Query<GetParams>) -> Response {
    let key = match params.key.filter(|k| !k.is_empty()) {
        Some(key) => key,
        None => return bad_request("Please provide a key"),
    };

    match state.store.get(&key) {
        Ok(data) => (StatusCode::OK, Json(DataResponse { data })).into_response(),
        Err(e) => e.into_response(),
    }
}

/// `POST /set` with `{"Key", "value", "ttl"}`
pub async fn set_key(State(state): State<AppState>, body: Bytes) -> Response {
    let req = match decode_body(&body) {
        Ok(req) => req,
        Err(rejection) => return rejection,
    };
    if req.key.is_empty() {
        return bad_request("Key cannot be empty");
    }

    let ttl = parse_duration(&req.ttl).unwrap_or_else(|| {
        debug!(ttl = %req.ttl, "Unparseable TTL, using default {:?}", state.default_ttl);
        state.default_ttl
    });

    match state.store.set(req.key, req.value, ttl) {
        Ok(()) => (
            StatusCode::CREATED,
            StatusResponse::success("Key-value pair set successfully"),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// `PATCH|PUT /update` with `{"Key", "value"}`
pub async fn update_key(State(state): State<AppState>, body: Bytes) -> Response {
    let req = match decode_body(&body) {
        Ok(req) => req,
        Err(rejection) => return rejection,
    };
    if req.key.is_empty() {
        return bad_request("Key cannot be empty");
    }

    match state.store.update(&req.key, req.value) {
        Ok(()) => (
            StatusCode::OK,
            StatusResponse::success("Key updated successfully"),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// `DELETE /delete?Key=K`
pub async fn delete_key(
    State(state): State<AppState>,
    Query(params): Query<DeleteParams>,
) -> Response {
    let key = match params.key.filter(|k| !k.is_empty()) {
        Some(key) => key,
        None => return bad_request("Please provide key"),
    };

    match state.store.delete(&key) {
        Ok(()) => (
            StatusCode::OK,
            StatusResponse::success("Key-value deleted successfully"),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
