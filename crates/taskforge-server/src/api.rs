//! REST API for the taskforge persistence service.
//!
//! All data routes are owner-scoped through the bearer session token;
//! a handler never sees another user's entities. Entity responses are
//! always the stored representation, so clients can treat them as
//! authoritative.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use taskforge_shared::constants::{DEFAULT_LIST_ICON, DEFAULT_LIST_NAME};
use taskforge_shared::model::{List, Task, User};
use taskforge_shared::protocol::{
    ListPatch, LoginRequest, LoginResponse, NewList, NewTask, ProfilePatch, TaskPatch,
};
use taskforge_shared::types::{ListId, TaskId, UserId};
use taskforge_store::Database;

use crate::auth::{authenticate, decode_credential};
use crate::error::ServerError;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    fn db(&self) -> Result<MutexGuard<'_, Database>, ServerError> {
        self.db
            .lock()
            .map_err(|e| ServerError::Internal(format!("database lock poisoned: {e}")))
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/:provider", post(login))
        .route("/api/auth/me", get(get_me).patch(patch_me))
        .route("/api/lists", get(get_lists).post(create_list))
        .route("/api/lists/:id", patch(update_list).delete(delete_list))
        .route("/api/tasks", get(get_tasks).post(create_task))
        .route(
            "/api/tasks/:id",
            get(get_tasks_for_list).patch(update_task).delete(delete_task),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the listener fails.
pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "HTTP API listening");
    axum::serve(listener, router).await?;
    Ok(())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

async fn login(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ServerError> {
    let claims = decode_credential(&req.credential)?;
    let db = state.db()?;

    let user = match db.get_user_by_provider_id(&claims.sub)? {
        Some(user) => user,
        None => {
            // First-ever login: create the user and their default list.
            let user = User {
                id: UserId::new(),
                provider_id: claims.sub.clone(),
                email: claims.email,
                name: claims.name,
                picture: claims.picture,
                xp: 0,
                level: 1,
                daily_streak: 0,
                badges: Vec::new(),
                created_at: Utc::now(),
            };
            db.insert_user(&user)?;
            db.create_list(
                user.id,
                &NewList {
                    name: DEFAULT_LIST_NAME.to_string(),
                    icon: Some(DEFAULT_LIST_ICON.to_string()),
                    ..NewList::default()
                },
            )?;
            info!(user = %user.id, provider = %provider, "first login, created default list");
            user
        }
    };

    let token = db.create_session(user.id)?;
    Ok(Json(LoginResponse { token, user }))
}

async fn get_me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<User>, ServerError> {
    let db = state.db()?;
    let user_id = authenticate(&db, &headers)?;
    Ok(Json(db.get_user(user_id)?))
}

async fn patch_me(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ProfilePatch>,
) -> Result<Json<User>, ServerError> {
    let db = state.db()?;
    let user_id = authenticate(&db, &headers)?;
    let user = db.update_user(user_id, &body)?;
    Ok(Json(user))
}

// ---------------------------------------------------------------------------
// Lists
// ---------------------------------------------------------------------------

async fn get_lists(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<List>>, ServerError> {
    let db = state.db()?;
    let user_id = authenticate(&db, &headers)?;
    Ok(Json(db.get_lists(user_id)?))
}

async fn create_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<NewList>,
) -> Result<(axum::http::StatusCode, Json<List>), ServerError> {
    if body.name.trim().is_empty() {
        return Err(ServerError::BadRequest("list name cannot be empty".into()));
    }
    let db = state.db()?;
    let user_id = authenticate(&db, &headers)?;
    let list = db.create_list(user_id, &body)?;
    Ok((axum::http::StatusCode::CREATED, Json(list)))
}

async fn update_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<ListId>,
    Json(body): Json<ListPatch>,
) -> Result<Json<List>, ServerError> {
    if matches!(body.name.as_deref(), Some(name) if name.trim().is_empty()) {
        return Err(ServerError::BadRequest("list name cannot be empty".into()));
    }
    let db = state.db()?;
    let user_id = authenticate(&db, &headers)?;
    Ok(Json(db.update_list(user_id, id, &body)?))
}

async fn delete_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<ListId>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let mut db = state.db()?;
    let user_id = authenticate(&db, &headers)?;
    db.delete_list(user_id, id)?;
    Ok(Json(
        serde_json::json!({ "message": "list and associated tasks deleted" }),
    ))
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

async fn get_tasks(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Task>>, ServerError> {
    let db = state.db()?;
    let user_id = authenticate(&db, &headers)?;
    Ok(Json(db.get_tasks(user_id)?))
}

async fn get_tasks_for_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(list_id): Path<ListId>,
) -> Result<Json<Vec<Task>>, ServerError> {
    let db = state.db()?;
    let user_id = authenticate(&db, &headers)?;
    Ok(Json(db.get_tasks_for_list(user_id, list_id)?))
}

async fn create_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<NewTask>,
) -> Result<(axum::http::StatusCode, Json<Task>), ServerError> {
    if body.title.trim().is_empty() {
        return Err(ServerError::BadRequest("task title cannot be empty".into()));
    }
    let db = state.db()?;
    let user_id = authenticate(&db, &headers)?;
    let task = db.create_task(user_id, &body)?;
    Ok((axum::http::StatusCode::CREATED, Json(task)))
}

async fn update_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<TaskId>,
    Json(body): Json<TaskPatch>,
) -> Result<Json<Task>, ServerError> {
    if matches!(body.title.as_deref(), Some(title) if title.trim().is_empty()) {
        return Err(ServerError::BadRequest("task title cannot be empty".into()));
    }
    if matches!(&body.blocked_by, Some(ids) if ids.contains(&id)) {
        return Err(ServerError::BadRequest(
            "a task cannot block itself".into(),
        ));
    }
    let db = state.db()?;
    let user_id = authenticate(&db, &headers)?;
    Ok(Json(db.update_task(user_id, id, &body)?))
}

async fn delete_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<TaskId>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let db = state.db()?;
    let user_id = authenticate(&db, &headers)?;
    if !db.delete_task(user_id, id)? {
        return Err(ServerError::NotFound);
    }
    Ok(Json(serde_json::json!({ "message": "task deleted" })))
}
