//! Observable outcome CRUD.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use curricula_core::{CreateObservationRequest, UpdateObservationRequest};
use curricula_db::ObservationFilter;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListObservationsQuery {
    attribute_id: Option<i64>,
    name: Option<String>,
}

pub async fn create_observation(
    State(state): State<AppState>,
    Json(req): Json<CreateObservationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let observation = state.db.observations.create(&req).await?;
    Ok((StatusCode::CREATED, Json(observation)))
}

pub async fn list_observations(
    State(state): State<AppState>,
    Query(query): Query<ListObservationsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let observations = state
        .db
        .observations
        .list(ObservationFilter {
            attribute_id: query.attribute_id,
            name: query.name,
        })
        .await?;
    Ok(Json(observations))
}

pub async fn get_observation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let observation = state
        .db
        .observations
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("observation {} not found", id)))?;
    Ok(Json(observation))
}

pub async fn update_observation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateObservationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let observation = state.db.observations.update(id, &req).await?;
    Ok(Json(observation))
}

pub async fn delete_observation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.observations.delete(id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
