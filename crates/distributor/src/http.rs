// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Codewell Contributors

//! HTTP handlers for the distributor's issuance, user, and admin surface.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use codewell_core::{CoreError, Role, Status};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::issuance::{GameDraw, Outcome};
use crate::state::AppState;
use crate::users::{NewUser, UserFlag};

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/issue", post(issue))
        .route("/v1/users/upsert", post(upsert_user))
        .route("/v1/users/{id}/language", post(set_language))
        .route("/v1/admin/fleet", get(admin_fleet))
        .route("/v1/admin/users/{id}", get(admin_get_user))
        .route("/v1/admin/users/{id}/flag", post(admin_set_flag))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "running" }))
}

// -- /v1/issue -----------------------------------------------------------

#[derive(Debug, Deserialize)]
struct IssueRequest {
    user_id: i64,
    game_list: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
enum IssueResponse {
    Granted { draws: Vec<GameDrawResponse> },
    Wait { remaining_seconds: i64 },
    LimitReached,
    Banned,
}

#[derive(Debug, Serialize)]
struct GameDrawResponse {
    game: String,
    codes: Vec<String>,
}

impl From<GameDraw> for GameDrawResponse {
    fn from(draw: GameDraw) -> Self {
        Self { game: draw.game, codes: draw.codes }
    }
}

async fn issue(State(state): State<Arc<AppState>>, Json(req): Json<IssueRequest>) -> impl IntoResponse {
    if req.game_list.is_empty() {
        return ApiError::BadRequest.to_http_response("game_list must not be empty").into_response();
    }
    for game in &req.game_list {
        if state.catalog.get(game).is_none() {
            return ApiError::BadRequest.to_http_response(CoreError::UnknownGame.to_string()).into_response();
        }
    }

    match state.issuance.issue(req.user_id, &req.game_list).await {
        Ok(Outcome::Granted(draws)) => {
            let draws = draws.into_iter().map(GameDrawResponse::from).collect();
            Json(IssueResponse::Granted { draws }).into_response()
        }
        Ok(Outcome::Wait { remaining }) => {
            Json(IssueResponse::Wait { remaining_seconds: remaining.num_seconds().max(0) }).into_response()
        }
        Ok(Outcome::LimitReached) => Json(IssueResponse::LimitReached).into_response(),
        Ok(Outcome::Banned) => Json(IssueResponse::Banned).into_response(),
        Err(crate::issuance::IssuanceError::UnknownUser) => {
            ApiError::UserNotFound.to_http_response("no such user").into_response()
        }
        Err(e) => {
            tracing::error!(user_id = req.user_id, err = %e, "issuance failed");
            ApiError::Internal.to_http_response(e.to_string()).into_response()
        }
    }
}

// -- /v1/users -------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct UpsertUserRequest {
    user_id: i64,
    chat_id: i64,
    language: String,
    first_name: Option<String>,
    last_name: Option<String>,
    username: Option<String>,
}

async fn upsert_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpsertUserRequest>,
) -> impl IntoResponse {
    let identity = NewUser {
        user_id: req.user_id,
        chat_id: req.chat_id,
        first_name: req.first_name,
        last_name: req.last_name,
        username: req.username,
    };
    match state.users.upsert_user(identity, &req.language).await {
        Ok(record) => Json(record).into_response(),
        Err(e) => ApiError::Internal.to_http_response(e.to_string()).into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct SetLanguageRequest {
    language: String,
}

async fn set_language(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<SetLanguageRequest>,
) -> impl IntoResponse {
    match state.users.set_language(id, &req.language).await {
        Ok(()) => Json(serde_json::json!({ "updated": true })).into_response(),
        Err(e) => ApiError::Internal.to_http_response(e.to_string()).into_response(),
    }
}

// -- /v1/admin -------------------------------------------------------------

#[derive(Debug, Serialize)]
struct FleetGame {
    game: String,
    inventory_count: u64,
}

// Harvester and distributor processes coordinate only through Postgres/Redis
// (no RPC channel between them), so inventory count is the only liveness
// signal available here: a stalled count implies a stalled fleet.
async fn admin_fleet(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut games = Vec::with_capacity(state.catalog.games().len());
    for spec in state.catalog.games() {
        let count = state.inventory.count(&spec.name).await.unwrap_or(0);
        games.push(FleetGame { game: spec.name.clone(), inventory_count: count });
    }
    Json(games)
}

async fn admin_get_user(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> impl IntoResponse {
    match state.users.get_user(id).await {
        Ok(Some(record)) => Json(record).into_response(),
        Ok(None) => ApiError::UserNotFound.to_http_response("no such user").into_response(),
        Err(e) => ApiError::Internal.to_http_response(e.to_string()).into_response(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "field", rename_all = "snake_case")]
enum FlagRequest {
    Banned { value: bool },
    Role { value: RoleWire },
    Status { value: StatusWire },
    Notes { value: Option<String> },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RoleWire {
    User,
    Admin,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum StatusWire {
    Free,
    Friend,
    Premium,
}

async fn admin_set_flag(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<FlagRequest>,
) -> impl IntoResponse {
    let flag = match req {
        FlagRequest::Banned { value } => UserFlag::Banned(value),
        FlagRequest::Role { value } => UserFlag::Role(match value {
            RoleWire::User => Role::User,
            RoleWire::Admin => Role::Admin,
        }),
        FlagRequest::Status { value } => UserFlag::Status(match value {
            StatusWire::Free => Status::Free,
            StatusWire::Friend => Status::Friend,
            StatusWire::Premium => Status::Premium,
        }),
        FlagRequest::Notes { value } => UserFlag::Notes(value),
    };

    match state.users.set_flag(id, flag).await {
        Ok(()) => Json(serde_json::json!({ "updated": true })).into_response(),
        Err(e) => ApiError::Internal.to_http_response(e.to_string()).into_response(),
    }
}
