//! Sketchboard Project Store Server
//!
//! Keeps each project's canvas as an ordered list of opaque shape records
//! and serves it to the drawing surface.
//!
//! ## API
//!
//! ```text
//! GET    /api/projects               -> ["id", ...]   (sorted)
//! DELETE /api/projects/{id}          -> 204, or 404 if unknown
//! GET    /api/projects/{id}/canvas   -> [{ "value": <shape> }, ...]
//! POST   /api/projects/{id}/canvas   <- [{ "value": <shape> }, ...]   (full replace)
//! GET    /health                     -> "ok"
//! ```
//!
//! Shapes are not interpreted: any JSON object under `value` is stored as is.
//! Projects live in memory only.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get},
};
use dashmap::DashMap;
use serde_json::{Value, json};
use std::{
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
    sync::Arc,
};
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

/// Server configuration
const DEFAULT_ADDR: SocketAddr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 3030));
/// Canvases carry base64 image data, so allow well over axum's default.
const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Shared application state
#[derive(Default)]
struct AppState {
    /// Stored records per project id
    projects: DashMap<String, Vec<Value>>,
}

impl AppState {
    fn new() -> Self {
        Self::default()
    }
}

/// Errors returned to clients as `{ "error": message }`.
#[derive(Debug)]
enum ApiError {
    NotFound(String),
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(id) => (StatusCode::NOT_FOUND, format!("project {id} not found")),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sketchboard_server=info,tower_http=info".into()),
        )
        .init();

    let addr = listen_addr(std::env::var("SKETCHBOARD_ADDR").ok());
    let app = router(Arc::new(AppState::new()));

    info!("Sketchboard project store listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

/// Parse the listen address, falling back to the default on bad input.
fn listen_addr(configured: Option<String>) -> SocketAddr {
    match configured {
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid SKETCHBOARD_ADDR {:?} ({}), using {}", raw, e, DEFAULT_ADDR);
            DEFAULT_ADDR
        }),
        None => DEFAULT_ADDR,
    }
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/projects", get(list_projects))
        .route("/api/projects/{project_id}", delete(delete_project))
        .route(
            "/api/projects/{project_id}/canvas",
            get(get_canvas).post(save_canvas),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Index page
async fn index() -> &'static str {
    "Sketchboard Project Store - projects at /api/projects, canvases at /api/projects/{id}/canvas"
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

/// List stored project ids, sorted.
async fn list_projects(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    let mut ids: Vec<String> = state.projects.iter().map(|entry| entry.key().clone()).collect();
    ids.sort();
    Json(ids)
}

/// Remove a project and its records.
async fn delete_project(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    match state.projects.remove(&project_id) {
        Some(_) => {
            info!("Deleted project {}", project_id);
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(ApiError::NotFound(project_id)),
    }
}

/// Return a project's records in the order they were saved.
async fn get_canvas(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<Value>>, ApiError> {
    match state.projects.get(&project_id) {
        Some(records) => {
            debug!("Serving {} records for {}", records.len(), project_id);
            Ok(Json(records.clone()))
        }
        None => Err(ApiError::NotFound(project_id)),
    }
}

/// Replace a project's records.
async fn save_canvas(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<StatusCode, ApiError> {
    let records = validate_records(body).map_err(|message| {
        warn!("Rejected save for {}: {}", project_id, message);
        ApiError::BadRequest(message)
    })?;

    info!("Saved {} records for {}", records.len(), project_id);
    state.projects.insert(project_id, records);
    Ok(StatusCode::NO_CONTENT)
}

/// Check that a body is a list of `{ "value": { ... } }` records.
fn validate_records(body: Value) -> Result<Vec<Value>, String> {
    let Value::Array(records) = body else {
        return Err("expected an array of records".to_string());
    };
    for (index, record) in records.iter().enumerate() {
        match record.get("value") {
            Some(Value::Object(_)) => {}
            Some(_) => return Err(format!("record {index}: value must be an object")),
            None => return Err(format!("record {index}: missing value")),
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_record() -> Value {
        json!({ "value": { "type": "rect", "x": 1, "y": 2, "width": 3, "height": 4, "color": "#000000" } })
    }

    #[tokio::test]
    async fn save_then_get_preserves_order() {
        let state = Arc::new(AppState::new());
        let records = vec![
            rect_record(),
            json!({ "value": { "type": "text", "x": 0, "y": 0, "content": "hi", "color": "#ff0000" } }),
        ];

        let status = save_canvas(
            State(state.clone()),
            Path("p1".to_string()),
            Json(Value::Array(records.clone())),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let Json(loaded) = get_canvas(State(state), Path("p1".to_string())).await.unwrap();
        assert_eq!(loaded, records);
    }

    #[tokio::test]
    async fn save_replaces_previous_records() {
        let state = Arc::new(AppState::new());
        for count in [3, 1] {
            let body = Value::Array(vec![rect_record(); count]);
            save_canvas(State(state.clone()), Path("p".to_string()), Json(body))
                .await
                .unwrap();
        }
        let Json(loaded) = get_canvas(State(state), Path("p".to_string())).await.unwrap();
        assert_eq!(loaded.len(), 1);
    }

    #[tokio::test]
    async fn unknown_project_is_not_found() {
        let state = Arc::new(AppState::new());
        let err = get_canvas(State(state), Path("missing".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(ref id) if id == "missing"));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_save_is_rejected() {
        let state = Arc::new(AppState::new());
        let err = save_canvas(
            State(state.clone()),
            Path("p".to_string()),
            Json(json!([{ "shape": {} }])),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
        assert!(state.projects.get("p").is_none());
    }

    #[tokio::test]
    async fn list_returns_sorted_ids() {
        let state = Arc::new(AppState::new());
        let Json(empty) = list_projects(State(state.clone())).await;
        assert!(empty.is_empty());

        for id in ["beta", "alpha"] {
            save_canvas(State(state.clone()), Path(id.to_string()), Json(json!([])))
                .await
                .unwrap();
        }
        let Json(ids) = list_projects(State(state)).await;
        assert_eq!(ids, vec!["alpha", "beta"]);
    }

    #[tokio::test]
    async fn delete_removes_project() {
        let state = Arc::new(AppState::new());
        save_canvas(
            State(state.clone()),
            Path("p".to_string()),
            Json(Value::Array(vec![rect_record()])),
        )
        .await
        .unwrap();

        let status = delete_project(State(state.clone()), Path("p".to_string()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(get_canvas(State(state.clone()), Path("p".to_string())).await.is_err());

        let err = delete_project(State(state), Path("p".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn validate_records_messages() {
        assert!(validate_records(json!({})).is_err());
        assert_eq!(
            validate_records(json!([{ "value": 5 }])).unwrap_err(),
            "record 0: value must be an object"
        );
        assert_eq!(validate_records(json!([])).unwrap(), Vec::<Value>::new());
    }

    #[test]
    fn listen_addr_fallback() {
        assert_eq!(listen_addr(None), DEFAULT_ADDR);
        assert_eq!(DEFAULT_ADDR, "0.0.0.0:3030".parse::<SocketAddr>().unwrap());
        assert_eq!(
            listen_addr(Some("127.0.0.1:8080".to_string())),
            "127.0.0.1:8080".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(listen_addr(Some("nonsense".to_string())), DEFAULT_ADDR);
    }
}
