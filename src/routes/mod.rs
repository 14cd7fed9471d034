//! HTTP routes for the key-value API
//!
//! - GET /healthz - liveness probe, never authenticated
//! - GET /get?key=..&user=.. - read a value
//! - POST /set - write a value from a JSON body
//! - DELETE /delete?key=..&user=.. - remove a value
//! - GET /list?prefix=..&user=.. - list keys in a namespace
//! - GET /metrics - Prometheus metrics

mod handlers;

use axum::{
    extract::{rejection::QueryRejection, DefaultBodyLimit, Query},
    middleware,
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::auth;
use crate::config::Config;
use crate::errors::{GatewayError, Result};
use crate::metrics;
use crate::namespace::Namespace;
use crate::storage::StorageBackend;

const KEY_REQUIRED: &str = "key required";
const SET_FIELDS_REQUIRED: &str = "key and string value required";

/// Immutable state shared by every request
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn StorageBackend>,
    pub key_prefix: Arc<str>,
    pub auth_token: Option<Arc<str>>,
}

impl AppState {
    pub fn new(config: &Config, storage: Arc<dyn StorageBackend>) -> Self {
        Self {
            storage,
            key_prefix: config.key_prefix.as_str().into(),
            auth_token: config.auth_token.as_deref().map(Arc::from),
        }
    }

    fn namespace(&self, user: Option<&str>) -> Namespace {
        Namespace::new(&self.key_prefix, user)
    }
}

/// Query parameters for get and delete
#[derive(Debug, Deserialize)]
pub struct KeyQuery {
    #[serde(default)]
    pub key: String,
    pub user: Option<String>,
}

impl KeyQuery {
    /// A query string that does not deserialize (repeated `key`, say)
    /// counts as a missing key.
    fn accept(query: std::result::Result<Query<KeyQuery>, QueryRejection>) -> Result<Self> {
        query
            .map(|Query(query)| query)
            .map_err(|_| GatewayError::InvalidRequest(KEY_REQUIRED))
    }

    fn key(&self) -> Result<&str> {
        if self.key.is_empty() {
            return Err(GatewayError::InvalidRequest(KEY_REQUIRED));
        }
        Ok(&self.key)
    }
}

/// Query parameters for list
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub prefix: String,
    pub user: Option<String>,
}

impl ListQuery {
    /// Build from raw pairs so repeated parameters never fail the
    /// request; the first occurrence wins.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut prefix = None;
        let mut user = None;
        for (name, value) in pairs {
            match name.as_str() {
                "prefix" if prefix.is_none() => prefix = Some(value),
                "user" if user.is_none() => user = Some(value),
                _ => {}
            }
        }
        Self {
            prefix: prefix.unwrap_or_default(),
            user,
        }
    }
}

/// JSON body of a set request, as sent
#[derive(Debug, Deserialize)]
pub struct SetRequest {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub user: Option<String>,
}

/// A set request that passed validation
#[derive(Debug, PartialEq, Eq)]
pub struct ValidatedSet {
    pub key: String,
    pub value: String,
    pub user: Option<String>,
}

impl SetRequest {
    /// Parse a raw body; any shape mismatch is a bad request.
    pub fn parse(body: &[u8]) -> Result<ValidatedSet> {
        let request: SetRequest = serde_json::from_slice(body)
            .map_err(|_| GatewayError::InvalidRequest(SET_FIELDS_REQUIRED))?;
        request.validate()
    }

    fn validate(self) -> Result<ValidatedSet> {
        match (self.key, self.value) {
            (Some(key), Some(serde_json::Value::String(value))) if !key.is_empty() => {
                Ok(ValidatedSet {
                    key,
                    value,
                    user: self.user,
                })
            }
            _ => Err(GatewayError::InvalidRequest(SET_FIELDS_REQUIRED)),
        }
    }
}

/// Create the key-value API router
pub fn create_router(state: AppState, max_body_size: usize) -> Router {
    let protected = Router::new()
        .route("/get", get(handlers::get_value))
        .route("/set", post(handlers::set_value))
        .route("/delete", delete(handlers::delete_value))
        .route("/list", get(handlers::list_keys))
        .route("/metrics", get(handlers::metrics))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ));

    Router::new()
        .route("/healthz", get(handlers::health))
        .merge(protected)
        .layer(middleware::from_fn(metrics::track_requests))
        .layer(DefaultBodyLimit::max(max_body_size))
        .with_state(state)
}
