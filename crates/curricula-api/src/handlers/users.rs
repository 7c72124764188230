//! Admin-only user management.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use curricula_core::{hash_password, RegisterRequest, Role, UpdateUserRequest, UserRepository};
use curricula_db::UserFilter;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    username: Option<String>,
    role: Option<Role>,
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.username.trim().is_empty() {
        return Err(ApiError::BadRequest("username must not be empty".into()));
    }
    if req.password.is_empty() {
        return Err(ApiError::BadRequest("password must not be empty".into()));
    }
    if state.db.users.find_by_username(&req.username).await?.is_some() {
        return Err(ApiError::BadRequest(format!(
            "username {} is taken",
            req.username
        )));
    }

    let password_hash = hash_password(&req.password)?;
    let user = state
        .db
        .users
        .create(&req.username, &password_hash, req.role)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let users = state
        .db
        .users
        .list(UserFilter {
            username: query.username,
            role: query.role,
        })
        .await?;
    Ok(Json(users))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .users
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {} not found", id)))?;
    Ok(Json(user))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .users
        .update(id, req.username.as_deref(), req.role)
        .await?;
    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.users.delete(id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
