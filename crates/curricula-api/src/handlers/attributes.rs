//! Graduate attribute CRUD.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use curricula_core::{CreateAttributeRequest, UpdateAttributeRequest};
use curricula_db::AttributeFilter;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListAttributesQuery {
    program_id: Option<i64>,
    name: Option<String>,
}

pub async fn create_attribute(
    State(state): State<AppState>,
    Json(req): Json<CreateAttributeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let attribute = state.db.attributes.create(&req).await?;
    Ok((StatusCode::CREATED, Json(attribute)))
}

pub async fn list_attributes(
    State(state): State<AppState>,
    Query(query): Query<ListAttributesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let attributes = state
        .db
        .attributes
        .list(AttributeFilter {
            program_id: query.program_id,
            name: query.name,
        })
        .await?;
    Ok(Json(attributes))
}

pub async fn get_attribute(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let attribute = state
        .db
        .attributes
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("attribute {} not found", id)))?;
    Ok(Json(attribute))
}

pub async fn update_attribute(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateAttributeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let attribute = state.db.attributes.update(id, &req).await?;
    Ok(Json(attribute))
}

pub async fn delete_attribute(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.attributes.delete(id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
