//! Curriculum module CRUD.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use curricula_core::{CreateModuleRequest, UpdateModuleRequest};
use curricula_db::ModuleFilter;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListModulesQuery {
    name: Option<String>,
    offered_by: Option<String>,
    program_id: Option<i64>,
}

pub async fn create_module(
    State(state): State<AppState>,
    Json(req): Json<CreateModuleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let module = state.db.modules.create(&req).await?;
    Ok((StatusCode::CREATED, Json(module)))
}

pub async fn list_modules(
    State(state): State<AppState>,
    Query(query): Query<ListModulesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let modules = state
        .db
        .modules
        .list(ModuleFilter {
            name: query.name,
            offered_by: query.offered_by,
            program_id: query.program_id,
        })
        .await?;
    Ok(Json(modules))
}

pub async fn get_module(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let module = state
        .db
        .modules
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("module {} not found", id)))?;
    Ok(Json(module))
}

pub async fn update_module(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateModuleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let module = state.db.modules.update(id, &req).await?;
    Ok(Json(module))
}

pub async fn delete_module(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.modules.delete(id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
