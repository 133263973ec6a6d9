//! Shared fixtures for integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::runtime::Handle;
use url::Url;

use incident_copilot::channel::{
    Connector, EventSink, Subscription, Transport, TransportEvent, UpdateChannel, UpdateMessage,
};

// ── Mock transport ──────────────────────────────────────────────────────────

/// One recorded call to `Connector::open`
pub struct Attempt {
    pub address: Url,
    pub sink: EventSink,
    closed: Arc<AtomicBool>,
}

/// Connector that records attempts and lets the test drive their events
#[derive(Clone, Default)]
pub struct MockConnector {
    attempts: Arc<Mutex<Vec<Attempt>>>,
}

struct MockTransport {
    closed: Arc<AtomicBool>,
}

impl Transport for MockTransport {
    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

impl Connector for MockConnector {
    fn open(&self, address: &Url, sink: EventSink) -> Box<dyn Transport> {
        let closed = Arc::new(AtomicBool::new(false));
        self.attempts.lock().push(Attempt {
            address: address.clone(),
            sink,
            closed: Arc::clone(&closed),
        });
        Box::new(MockTransport { closed })
    }
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().len()
    }

    pub fn address(&self, index: usize) -> Url {
        self.attempts.lock()[index].address.clone()
    }

    /// Transports opened and not yet closed by the channel
    pub fn live_transports(&self) -> usize {
        self.attempts
            .lock()
            .iter()
            .filter(|a| !a.closed.load(Ordering::SeqCst))
            .count()
    }

    pub fn is_closed(&self, index: usize) -> bool {
        self.attempts.lock()[index].closed.load(Ordering::SeqCst)
    }

    /// Fire an event for attempt `index`
    pub fn emit(&self, index: usize, event: TransportEvent) {
        // Release the lock first: the channel may open a new attempt in response
        let sink = self.attempts.lock()[index].sink.clone();
        sink.emit(event);
    }

    /// Fire an event for the most recent attempt
    pub fn emit_latest(&self, event: TransportEvent) {
        let index = self.attempt_count() - 1;
        self.emit(index, event);
    }

    pub fn message(&self, index: usize, text: &str) {
        self.emit(index, TransportEvent::Message(text.to_string()));
    }
}

pub const RECONNECT: Duration = Duration::from_millis(5000);

pub fn mock_channel(connector: &MockConnector) -> UpdateChannel {
    UpdateChannel::with_options(connector.clone(), RECONNECT, Handle::current())
}

pub fn address(s: &str) -> Url {
    Url::parse(s).unwrap()
}

/// Subscribe a handler that stores every message it sees
pub fn collect(channel: &UpdateChannel) -> (Subscription, Arc<Mutex<Vec<UpdateMessage>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let subscription = channel.subscribe(move |msg: &UpdateMessage| sink.lock().push(msg.clone()));
    (subscription, seen)
}

// ── Mock REST API ───────────────────────────────────────────────────────────

/// Server-side state of the mock API
#[derive(Default)]
pub struct ApiState {
    pub incidents: Mutex<Vec<Value>>,
    pub last_query: Mutex<HashMap<String, String>>,
    pub status_updates: Mutex<Vec<(i64, Value)>>,
    /// `status` query parameter of each status update
    pub status_queries: Mutex<Vec<Option<String>>>,
    pub fail_stats: AtomicBool,
    pub stats_calls: AtomicUsize,
}

pub fn incident_json(id: i64, severity: &str, status: &str, service: &str) -> Value {
    json!({
        "id": id,
        "title": format!("Incident {}", id),
        "description": "Error rate above threshold",
        "severity": severity,
        "status": status,
        "service_name": service,
        "error_type": "HTTP_500",
        "root_cause": null,
        "resolution_steps": ["Restart service"],
        "detected_at": "2024-03-01T10:00:00",
        "resolved_at": if status == "resolved" { json!("2024-03-01T10:30:00") } else { Value::Null },
    })
}

fn seed_incidents() -> Vec<Value> {
    let mut quiet = incident_json(44, "low", "detected", "payments");
    // The backend sends null for a missing description
    quiet["description"] = Value::Null;

    vec![
        incident_json(42, "critical", "analyzing", "payments"),
        incident_json(43, "high", "resolved", "checkout"),
        quiet,
    ]
}

async fn list_incidents(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    *state.last_query.lock() = params.clone();

    let field_matches = |incident: &Value, key: &str, field: &str| match params.get(key) {
        Some(wanted) => incident[field].as_str() == Some(wanted.as_str()),
        None => true,
    };

    let limit: usize = params.get("limit").and_then(|v| v.parse().ok()).unwrap_or(50);
    let offset: usize = params.get("offset").and_then(|v| v.parse().ok()).unwrap_or(0);

    let incidents: Vec<Value> = state
        .incidents
        .lock()
        .iter()
        .filter(|i| field_matches(i, "status", "status"))
        .filter(|i| field_matches(i, "severity", "severity"))
        .filter(|i| field_matches(i, "service", "service_name"))
        .skip(offset)
        .take(limit)
        .cloned()
        .collect();

    Json(incidents)
}

fn find_incident(state: &ApiState, id: i64) -> Option<Value> {
    state
        .incidents
        .lock()
        .iter()
        .find(|i| i["id"].as_i64() == Some(id))
        .cloned()
}

fn not_found() -> axum::response::Response {
    (StatusCode::NOT_FOUND, Json(json!({"detail": "Incident not found"}))).into_response()
}

async fn get_incident(State(state): State<Arc<ApiState>>, Path(id): Path<i64>) -> impl IntoResponse {
    match find_incident(&state, id) {
        Some(incident) => Json(incident).into_response(),
        None => not_found(),
    }
}

async fn get_actions(State(state): State<Arc<ApiState>>, Path(id): Path<i64>) -> impl IntoResponse {
    if find_incident(&state, id).is_none() {
        return not_found();
    }
    Json(json!([
        {
            "id": 1,
            "action_type": "ai_analysis",
            "description": "Root cause analysis",
            "result": {"confidence": 0.82},
            "success": 1,
            "created_at": "2024-03-01T10:01:00"
        },
        {
            "id": 2,
            "action_type": "restart_service",
            "description": "Restart pods",
            "result": {},
            "success": -1,
            "created_at": "2024-03-01T10:03:00"
        },
        {
            "id": 3,
            "action_type": "rollback",
            "description": null,
            "result": null,
            "success": 0,
            "created_at": "2024-03-01T10:04:00"
        }
    ]))
    .into_response()
}

async fn update_status(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if find_incident(&state, id).is_none() {
        return not_found();
    }
    state.status_queries.lock().push(params.get("status").cloned());
    state.status_updates.lock().push((id, body));
    Json(json!({"status": "updated", "incident_id": id})).into_response()
}

async fn dashboard(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    state.stats_calls.fetch_add(1, Ordering::SeqCst);
    if state.fail_stats.load(Ordering::SeqCst) {
        return (StatusCode::SERVICE_UNAVAILABLE, "database unavailable").into_response();
    }

    let total = state.incidents.lock().len();
    Json(json!({
        "total_incidents": total,
        "active_incidents": 2,
        "resolved_today": 1,
        "avg_resolution_time_minutes": 30.0,
        "severity_distribution": {"critical": 1, "high": 1, "low": 1},
        "top_services": [{"service": "payments", "count": 2}, {"service": "checkout", "count": 1}],
        "daily_trend": [{"date": "2024-03-01", "count": 3}]
    }))
    .into_response()
}

async fn mttr(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    let days: u32 = params.get("days").and_then(|d| d.parse().ok()).unwrap_or(30);
    Json(json!({"mttr_minutes": 12.5, "sample_size": 4, "period_days": days}))
}

pub fn api_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/api/v1/incidents", get(list_incidents))
        .route("/api/v1/incidents/:id", get(get_incident))
        .route("/api/v1/incidents/:id/actions", get(get_actions))
        .route("/api/v1/incidents/:id/status", put(update_status))
        .route("/api/v1/analytics/dashboard", get(dashboard))
        .route("/api/v1/analytics/mttr", get(mttr))
        .with_state(state)
}

/// Start the mock API on an ephemeral port; returns its base URL
pub async fn spawn_api() -> (Url, Arc<ApiState>) {
    let state = Arc::new(ApiState::default());
    *state.incidents.lock() = seed_incidents();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    let app = api_router(Arc::clone(&state));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let base = Url::parse(&format!("http://{}/api/v1", addr)).unwrap();
    (base, state)
}
