//! Request handlers for the key-value endpoints

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde_json::json;
use tracing::{info, instrument};

use super::{AppState, KeyQuery, ListQuery, SetRequest};
use crate::errors::{GatewayError, Result};
use crate::metrics as prom;

/// Health check endpoint
#[instrument]
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Prometheus metrics endpoint
#[instrument]
pub async fn metrics() -> Result<Response> {
    let body = prom::render().map_err(|e| GatewayError::Internal(e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response())
}

/// Whether the client asked for the raw value instead of JSON
fn wants_plain_text(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.contains("text/plain"))
}

/// GET /get?key=..&user=..
#[instrument(skip_all)]
pub async fn get_value(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: std::result::Result<Query<KeyQuery>, QueryRejection>,
) -> Result<Response> {
    let query = KeyQuery::accept(query)?;
    let key = query.key()?;
    let name = state.namespace(query.user.as_deref()).object_name(key);
    info!(name = %name, "Get request");

    let Some(data) = state.storage.read(&name).await? else {
        return Err(GatewayError::NotFound { name });
    };
    let value = String::from_utf8_lossy(&data).into_owned();

    if wants_plain_text(&headers) {
        return Ok((
            [(header::CONTENT_TYPE, mime::TEXT_PLAIN_UTF_8.as_ref())],
            value,
        )
            .into_response());
    }
    Ok(Json(json!({ "value": value })).into_response())
}

/// POST /set with body `{key, value, user?}`
#[instrument(skip(state, body), fields(size = body.len()))]
pub async fn set_value(State(state): State<AppState>, body: Bytes) -> Result<Response> {
    let request = SetRequest::parse(&body)?;
    let name = state
        .namespace(request.user.as_deref())
        .object_name(&request.key);
    info!(name = %name, size = request.value.len(), "Set request");

    state
        .storage
        .write(&name, Bytes::from(request.value))
        .await?;

    Ok(Json(json!({ "ok": true })).into_response())
}

/// DELETE /delete?key=..&user=..
#[instrument(skip_all)]
pub async fn delete_value(
    State(state): State<AppState>,
    query: std::result::Result<Query<KeyQuery>, QueryRejection>,
) -> Result<Response> {
    let query = KeyQuery::accept(query)?;
    let key = query.key()?;
    let name = state.namespace(query.user.as_deref()).object_name(key);
    info!(name = %name, "Delete request");

    state.storage.remove(&name).await?;

    Ok(Json(json!({ "ok": true })).into_response())
}

/// GET /list?prefix=..&user=..
#[instrument(skip(state))]
pub async fn list_keys(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response> {
    let query = ListQuery::from_pairs(pairs);
    let namespace = state.namespace(query.user.as_deref());
    let prefix = namespace.object_name(&query.prefix);
    info!(namespace = %namespace.as_str(), prefix = %query.prefix, "List request");

    let names = state.storage.list(&prefix).await?;
    let keys: Vec<&str> = names
        .iter()
        .filter_map(|name| namespace.strip(name))
        .collect();

    Ok(Json(json!({ "keys": keys })).into_response())
}
