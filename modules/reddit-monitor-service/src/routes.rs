//! Axum route handlers for the reddit monitor RPC API.

use crate::db::Db;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use reddit_monitor_types::*;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

pub struct AppState {
    pub db: Arc<Db>,
    pub start_time: Instant,
    pub last_tick_at: Arc<Mutex<Option<String>>>,
    pub poll_interval_secs: u64,
}

// =====================================================
// Entity Endpoints
// =====================================================

// POST /rpc/entities/add
pub async fn entities_add(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddEntityRequest>,
) -> (StatusCode, Json<RpcResponse<TrackedEntity>>) {
    let name = req.name.trim();
    if name.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(RpcResponse::err("Entity name is required")),
        );
    }

    match state.db.add_entity(
        name,
        req.altname.as_deref(),
        req.abbreviation.as_deref(),
        req.ticker.as_deref(),
        req.altticker.as_deref(),
    ) {
        Ok(entry) => (StatusCode::OK, Json(RpcResponse::ok(entry))),
        Err(e) => {
            let msg = if e.to_string().contains("UNIQUE constraint") {
                format!("'{}' is already tracked", name)
            } else {
                format!("Failed to add entity: {}", e)
            };
            (StatusCode::BAD_REQUEST, Json(RpcResponse::err(msg)))
        }
    }
}

// POST /rpc/entities/remove
pub async fn entities_remove(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RemoveEntityRequest>,
) -> (StatusCode, Json<RpcResponse<bool>>) {
    match state.db.remove_entity(req.id) {
        Ok(true) => (StatusCode::OK, Json(RpcResponse::ok(true))),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(RpcResponse::err(format!("Entity #{} not found", req.id))),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(RpcResponse::err(format!("Failed to remove: {}", e))),
        ),
    }
}

// GET /rpc/entities/list
pub async fn entities_list(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<RpcResponse<Vec<TrackedEntity>>>) {
    match state.db.list_entities() {
        Ok(entries) => (StatusCode::OK, Json(RpcResponse::ok(entries))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(RpcResponse::err(format!("Failed to list: {}", e))),
        ),
    }
}

// =====================================================
// Query Endpoints
// =====================================================

// POST /rpc/comments/query
pub async fn comments_query(
    State(state): State<Arc<AppState>>,
    Json(filter): Json<CommentFilter>,
) -> (StatusCode, Json<RpcResponse<Vec<Comment>>>) {
    match state.db.query_comments(&filter) {
        Ok(entries) => (StatusCode::OK, Json(RpcResponse::ok(entries))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(RpcResponse::err(format!("Query failed: {}", e))),
        ),
    }
}

// POST /rpc/sentiment/query
pub async fn sentiment_query(
    State(state): State<Arc<AppState>>,
    Json(filter): Json<SentimentFilter>,
) -> (StatusCode, Json<RpcResponse<Vec<SentimentRecord>>>) {
    match state.db.query_sentiment(&filter) {
        Ok(entries) => (StatusCode::OK, Json(RpcResponse::ok(entries))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(RpcResponse::err(format!("Query failed: {}", e))),
        ),
    }
}

// POST /rpc/summaries/query
pub async fn summaries_query(
    State(state): State<Arc<AppState>>,
    Json(filter): Json<SummaryFilter>,
) -> (StatusCode, Json<RpcResponse<Vec<TopicSummary>>>) {
    match state.db.query_summaries(&filter) {
        Ok(entries) => (StatusCode::OK, Json(RpcResponse::ok(entries))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(RpcResponse::err(format!("Query failed: {}", e))),
        ),
    }
}

// =====================================================
// Service Endpoints
// =====================================================

// GET /rpc/stats
pub async fn stats(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<RpcResponse<MonitorStats>>) {
    match state.db.get_stats() {
        Ok(stats) => (StatusCode::OK, Json(RpcResponse::ok(stats))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(RpcResponse::err(format!("Stats query failed: {}", e))),
        ),
    }
}

// GET /rpc/status
pub async fn status(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<RpcResponse<ServiceStatus>>) {
    let stats = state.db.get_stats().ok();
    let last_tick = state.last_tick_at.lock().await.clone();
    let last_run_time = state.db.last_run_time().ok().flatten();

    let status = ServiceStatus {
        running: true,
        uptime_secs: state.start_time.elapsed().as_secs(),
        tracked_entities: stats.as_ref().map(|s| s.tracked_entities).unwrap_or(0),
        total_comments: stats.as_ref().map(|s| s.total_comments).unwrap_or(0),
        last_tick_at: last_tick,
        last_run_time,
        poll_interval_secs: state.poll_interval_secs,
    };

    (StatusCode::OK, Json(RpcResponse::ok(status)))
}
