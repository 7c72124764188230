//! Comment routes. A new comment notifies the material's owner.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use curricula_core::{Comment, CreateCommentRequest, UpdateCommentRequest};
use curricula_db::CommentFilter;

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListCommentsQuery {
    user_id: Option<i64>,
    material_id: Option<i64>,
    created_before: Option<DateTime<Utc>>,
    created_after: Option<DateTime<Utc>>,
}

async fn owned_comment(
    state: &AppState,
    id: i64,
    current: &CurrentUser,
) -> Result<Comment, ApiError> {
    let comment = state
        .db
        .comments
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("comment {} not found", id)))?;
    if comment.user_id != current.0.user_id {
        return Err(ApiError::Forbidden("not the comment author".to_string()));
    }
    Ok(comment)
}

pub async fn create_comment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let material = state
        .db
        .materials
        .get(req.material_id)
        .await?
        .ok_or_else(|| {
            ApiError::BadRequest(format!("material {} does not exist", req.material_id))
        })?;

    let comment = state
        .db
        .comments
        .create(req.text.as_deref(), current.0.user_id, req.material_id)
        .await?;

    state.notifications.enqueue(
        material.user_id,
        format!("new comment on material {}", material.material_id),
    );

    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn list_comments(
    State(state): State<AppState>,
    Query(query): Query<ListCommentsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let comments = state
        .db
        .comments
        .list(CommentFilter {
            user_id: query.user_id,
            material_id: query.material_id,
            created_before: query.created_before,
            created_after: query.created_after,
        })
        .await?;
    Ok(Json(comments))
}

pub async fn get_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = state
        .db
        .comments
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("comment {} not found", id)))?;
    Ok(Json(comment))
}

pub async fn update_comment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    owned_comment(&state, id, &current).await?;
    let comment = state.db.comments.set_text(id, req.text.as_deref()).await?;
    Ok(Json(comment))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    owned_comment(&state, id, &current).await?;
    state.db.comments.delete(id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
