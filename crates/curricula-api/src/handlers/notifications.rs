//! Notification routes. Admin-managed except for reading one by id.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use curricula_core::{CreateNotificationRequest, UpdateNotificationRequest};
use curricula_db::NotificationFilter;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    message: Option<String>,
    user_id: Option<i64>,
    created_before: Option<DateTime<Utc>>,
    created_after: Option<DateTime<Utc>>,
}

pub async fn create_notification(
    State(state): State<AppState>,
    Json(req): Json<CreateNotificationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let notification = state
        .db
        .notifications
        .create(&req.message, req.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(notification)))
}

pub async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<ListNotificationsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let notifications = state
        .db
        .notifications
        .list(NotificationFilter {
            message: query.message,
            user_id: query.user_id,
            created_before: query.created_before,
            created_after: query.created_after,
        })
        .await?;
    Ok(Json(notifications))
}

pub async fn get_notification(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let notification = state
        .db
        .notifications
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("notification {} not found", id)))?;
    Ok(Json(notification))
}

pub async fn update_notification(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateNotificationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let notification = state
        .db
        .notifications
        .update(id, req.message.as_deref(), req.user_id)
        .await?;
    Ok(Json(notification))
}

pub async fn delete_notification(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.notifications.delete(id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
