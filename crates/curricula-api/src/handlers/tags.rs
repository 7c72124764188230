//! Tag routes. Mutations are gated on ownership.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use curricula_core::{CreateTagRequest, Tag, UpdateTagRequest};
use curricula_db::TagFilter;

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListTagsQuery {
    user_id: Option<i64>,
    name: Option<String>,
    created_before: Option<DateTime<Utc>>,
    created_after: Option<DateTime<Utc>>,
}

async fn owned_tag(state: &AppState, id: i64, current: &CurrentUser) -> Result<Tag, ApiError> {
    let tag = state
        .db
        .tags
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("tag {} not found", id)))?;
    if tag.user_id != current.0.user_id {
        return Err(ApiError::Forbidden("not the tag owner".to_string()));
    }
    Ok(tag)
}

pub async fn create_tag(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateTagRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tag = state.db.tags.create(&req.name, current.0.user_id).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn list_tags(
    State(state): State<AppState>,
    Query(query): Query<ListTagsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let tags = state
        .db
        .tags
        .list(TagFilter {
            user_id: query.user_id,
            name: query.name,
            created_before: query.created_before,
            created_after: query.created_after,
        })
        .await?;
    Ok(Json(tags))
}

pub async fn get_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let tag = state
        .db
        .tags
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("tag {} not found", id)))?;
    Ok(Json(tag))
}

pub async fn update_tag(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTagRequest>,
) -> Result<impl IntoResponse, ApiError> {
    owned_tag(&state, id, &current).await?;

    let name = req
        .name
        .ok_or_else(|| ApiError::BadRequest("tag name must not be empty".to_string()))?;
    let tag = state.db.tags.rename(id, &name).await?;
    Ok(Json(tag))
}

pub async fn delete_tag(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    owned_tag(&state, id, &current).await?;
    state.db.tags.delete(id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
