//! Program CRUD.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use curricula_core::{CreateProgramRequest, UpdateProgramRequest};
use curricula_db::ProgramFilter;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListProgramsQuery {
    name: Option<String>,
    version: Option<String>,
}

pub async fn create_program(
    State(state): State<AppState>,
    Json(req): Json<CreateProgramRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let program = state.db.programs.create(&req).await?;
    Ok((StatusCode::CREATED, Json(program)))
}

pub async fn list_programs(
    State(state): State<AppState>,
    Query(query): Query<ListProgramsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let programs = state
        .db
        .programs
        .list(ProgramFilter {
            name: query.name,
            version: query.version,
        })
        .await?;
    Ok(Json(programs))
}

pub async fn get_program(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let program = state
        .db
        .programs
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("program {} not found", id)))?;
    Ok(Json(program))
}

pub async fn update_program(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateProgramRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let program = state.db.programs.update(id, &req).await?;
    Ok(Json(program))
}

pub async fn delete_program(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.programs.delete(id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
