//! Learning objective CRUD.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use curricula_core::{CreateObjectiveRequest, UpdateObjectiveRequest};
use curricula_db::ObjectiveFilter;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListObjectivesQuery {
    program_id: Option<i64>,
    name: Option<String>,
}

pub async fn create_objective(
    State(state): State<AppState>,
    Json(req): Json<CreateObjectiveRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let objective = state.db.objectives.create(&req).await?;
    Ok((StatusCode::CREATED, Json(objective)))
}

pub async fn list_objectives(
    State(state): State<AppState>,
    Query(query): Query<ListObjectivesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let objectives = state
        .db
        .objectives
        .list(ObjectiveFilter {
            program_id: query.program_id,
            name: query.name,
        })
        .await?;
    Ok(Json(objectives))
}

pub async fn get_objective(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let objective = state
        .db
        .objectives
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("objective {} not found", id)))?;
    Ok(Json(objective))
}

pub async fn update_objective(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateObjectiveRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let objective = state.db.objectives.update(id, &req).await?;
    Ok(Json(objective))
}

pub async fn delete_objective(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.objectives.delete(id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
