//! Fake matching backend for integration tests
//!
//! An axum router on an ephemeral port that serves candidate listings,
//! records every swipe it receives and answers with configured match or
//! failure results.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use cq_common::config::ClientConfig;

/// What the fake backend serves and what it has seen
#[derive(Default)]
pub struct BackendState {
    pub users: Vec<Value>,
    pub projects: Vec<Value>,
    /// Status to answer listings with instead of the records
    pub listing_failure: Option<u16>,
    /// Target ids whose swipe completes a match
    pub matches: HashSet<String>,
    /// Target ids whose swipe fails with 500
    pub failures: HashSet<String>,
    /// Target ids answered with an empty JSON object
    pub bare: HashSet<String>,
    /// Token every request must carry
    pub expected_token: Option<String>,
    pub swipes: Mutex<Vec<Value>>,
    pub listing_queries: Mutex<Vec<HashMap<String, String>>>,
    pub authorizations: Mutex<Vec<Option<String>>>,
}

impl BackendState {
    pub fn swipes(&self) -> Vec<Value> {
        self.swipes.lock().unwrap().clone()
    }

    pub fn listing_queries(&self) -> Vec<HashMap<String, String>> {
        self.listing_queries.lock().unwrap().clone()
    }

    pub fn authorizations(&self) -> Vec<Option<String>> {
        self.authorizations.lock().unwrap().clone()
    }

    fn authorize(&self, headers: &HeaderMap) -> bool {
        let header = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.authorizations.lock().unwrap().push(header.clone());

        match &self.expected_token {
            Some(token) => header.as_deref() == Some(format!("Bearer {}", token).as_str()),
            None => true,
        }
    }
}

/// Running fake backend
pub struct FakeBackend {
    pub addr: SocketAddr,
    pub state: Arc<BackendState>,
    handle: JoinHandle<()>,
}

impl FakeBackend {
    pub async fn start(state: BackendState) -> Self {
        let state = Arc::new(state);
        let router = Router::new()
            .route("/matches/users", get(list_users))
            .route("/matches/projects", get(list_projects))
            .route("/matches/swipe", post(record_swipe))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backend");
        let addr = listener.local_addr().expect("No local address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Fake backend failed");
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Client configuration pointing at this backend
    pub fn client_config(&self, token: Option<&str>) -> ClientConfig {
        ClientConfig {
            api_url: self.url(),
            token: token.map(str::to_string),
            ..ClientConfig::default()
        }
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Base URL nothing is listening on
pub async fn unreachable_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("No local address");
    drop(listener);
    format!("http://{}", addr)
}

async fn list_users(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.listing_queries.lock().unwrap().push(query);
    listing(&state, &headers, &state.users)
}

async fn list_projects(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.listing_queries.lock().unwrap().push(query);
    listing(&state, &headers, &state.projects)
}

fn listing(state: &BackendState, headers: &HeaderMap, records: &[Value]) -> Response {
    if !state.authorize(headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if let Some(status) = state.listing_failure {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, "listing unavailable").into_response();
    }
    Json(records.to_vec()).into_response()
}

async fn record_swipe(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !state.authorize(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let target_id = body["target_id"].as_str().unwrap_or_default().to_string();
    let liked = body["direction"] == "right";
    state.swipes.lock().unwrap().push(body);

    if state.failures.contains(&target_id) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "swipe not stored").into_response();
    }
    if state.bare.contains(&target_id) {
        return Json(json!({})).into_response();
    }

    let is_match = liked && state.matches.contains(&target_id);
    Json(json!({
        "status": if liked { "liked" } else { "passed" },
        "is_match": is_match,
    }))
    .into_response()
}
