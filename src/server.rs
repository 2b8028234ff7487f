//! HTTP server for the task API.
//!
//! axum-based JSON surface. Every response is wrapped in the
//! `{success, data, error}` envelope; errors are recovered here and never
//! propagate past a handler. Unsupported methods get axum's 405 with an
//! `Allow` header from the method routers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::breakdown;
use crate::db::Database;
use crate::error::{ApiError, ApiResult};
use crate::generator::TextGenerator;
use crate::hierarchy;
use crate::types::{
    ApiResponse, BreakdownRequest, CreateTaskRequest, DeleteResponse, NewTask, ParentFilter,
    Priority, Status, Task, TaskChanges, TaskFilters, UpdateTaskRequest,
};
use crate::validate;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    db: Database,
    generator: Arc<dyn TextGenerator>,
}

impl AppState {
    pub fn new(db: Database, generator: Arc<dyn TextGenerator>) -> Self {
        Self { db, generator }
    }
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/breakdown", post(breakdown_task))
        .route(
            "/tasks/{id}",
            get(get_task).patch(update_task).delete(delete_task),
        )
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "taskdeck listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Health check response.
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    }))
}

/// Query parameters for GET /tasks. Raw strings: unrecognized values are
/// silently ignored rather than rejected.
#[derive(Debug, Deserialize)]
struct ListParams {
    status: Option<String>,
    priority: Option<String>,
    parent_id: Option<String>,
}

impl ListParams {
    fn into_filters(self) -> TaskFilters {
        TaskFilters {
            status: self.status.as_deref().and_then(Status::parse),
            priority: self.priority.as_deref().and_then(Priority::parse),
            parent: self.parent_id.as_deref().and_then(parse_parent_filter),
        }
    }
}

/// `parent_id=null` is a sentinel for top-level tasks; integers filter on a
/// specific parent; anything else applies no filter.
fn parse_parent_filter(raw: &str) -> Option<ParentFilter> {
    if raw == "null" {
        Some(ParentFilter::TopLevel)
    } else {
        raw.parse::<i64>().ok().map(ParentFilter::Child)
    }
}

/// Parse a path id; non-numeric ids are a 400, not a 404.
fn parse_id(raw: &str) -> ApiResult<i64> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::invalid_value(format!("Invalid task id: {}", raw)))
}

async fn list_tasks(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<ApiResponse<Vec<Task>>>> {
    let filters = params.into_filters();
    let tasks = state.db.list_tasks(&filters).map_err(ApiError::database)?;
    Ok(Json(ApiResponse::ok(tasks)))
}

async fn create_task(
    State(state): State<AppState>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Task>>)> {
    let errors = validate::validate_create(&req);
    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }

    // Validation guarantees title presence and enum membership.
    let fields = NewTask {
        title: req.title.unwrap_or_default().trim().to_string(),
        description: validate::normalize_description(req.description),
        status: req.status.as_deref().and_then(Status::parse).unwrap_or_default(),
        priority: req
            .priority
            .as_deref()
            .and_then(Priority::parse)
            .unwrap_or_default(),
        parent_id: req.parent_id,
    };

    if let Some(parent_id) = fields.parent_id {
        state
            .db
            .with_conn(|conn| Ok(hierarchy::check_create_parent(conn, parent_id)))
            .map_err(ApiError::database)??;
    }

    let task = state.db.create_task(fields).map_err(ApiError::database)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(task))))
}

async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Task>>> {
    let id = parse_id(&id)?;
    let task = state
        .db
        .get_task_with_subtasks(id)
        .map_err(ApiError::database)?
        .ok_or_else(|| ApiError::task_not_found(id))?;
    Ok(Json(ApiResponse::ok(task)))
}

async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<ApiResponse<Task>>> {
    let id = parse_id(&id)?;

    if req.is_empty() {
        return Err(ApiError::empty_update());
    }

    let errors = validate::validate_update(&req);
    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }

    if let Some(Some(parent_id)) = req.parent_id {
        state
            .db
            .with_conn(|conn| Ok(hierarchy::check_reparent(conn, id, parent_id)))
            .map_err(ApiError::database)??;
    }

    let changes = TaskChanges {
        title: req.title.map(|t| t.trim().to_string()),
        description: req
            .description
            .map(validate::normalize_description),
        status: req.status.as_deref().and_then(Status::parse),
        priority: req.priority.as_deref().and_then(Priority::parse),
        parent_id: req.parent_id,
    };

    let task = state
        .db
        .update_task(id, changes)
        .map_err(ApiError::database)?
        .ok_or_else(|| ApiError::task_not_found(id))?;
    Ok(Json(ApiResponse::ok(task)))
}

async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<DeleteResponse>>> {
    let id = parse_id(&id)?;
    let deleted = state
        .db
        .delete_task(id)
        .map_err(ApiError::database)?
        .ok_or_else(|| ApiError::task_not_found(id))?;
    Ok(Json(ApiResponse::ok(DeleteResponse {
        message: format!("Task {} deleted", id),
        deleted,
    })))
}

async fn breakdown_task(
    State(state): State<AppState>,
    Json(req): Json<BreakdownRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Vec<Task>>>)> {
    let created = breakdown::run_breakdown(&state.db, state.generator.as_ref(), req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(created))))
}
