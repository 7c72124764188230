//! Module↔observation link routes.
//!
//! Mirrors the relation routes over the other edge table: `/links` for
//! single edges, `/modules/:id/supports` and
//! `/observations/:id/supported-by` for anchored support sets.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use curricula_core::{
    defaults::RELATION_WEIGHT, EdgeFilter, ModObsRel, RelationRepository, Side, SupportItem,
};

use crate::error::ApiError;
use crate::handlers::relations::required_items;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateLinkRequest {
    pub module_id: i64,
    pub observation_id: i64,
    pub weight: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ListLinksQuery {
    module_id: Option<i64>,
    observation_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ObservationSupport {
    pub observation_id: i64,
    pub weight: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ModuleSupport {
    pub module_id: i64,
    pub weight: Option<i32>,
}

/// Body of `POST /modules/:id/supports`.
#[derive(Debug, Deserialize)]
pub struct MergeModuleSupportsRequest {
    pub observations: Option<Vec<ObservationSupport>>,
}

/// Body of `POST /observations/:id/supported-by`.
#[derive(Debug, Deserialize)]
pub struct MergeObservationSupportersRequest {
    pub modules: Option<Vec<ModuleSupport>>,
}

pub async fn upsert_link(
    State(state): State<AppState>,
    Json(req): Json<CreateLinkRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .db
        .links
        .upsert(
            req.module_id,
            req.observation_id,
            req.weight.unwrap_or(RELATION_WEIGHT),
        )
        .await?;

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(ModObsRel::from(outcome.edge))))
}

pub async fn list_links(
    State(state): State<AppState>,
    Query(query): Query<ListLinksQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let edges = state
        .db
        .links
        .list(EdgeFilter {
            left_id: query.module_id,
            right_id: query.observation_id,
        })
        .await?;
    let rels: Vec<ModObsRel> = edges.into_iter().map(ModObsRel::from).collect();
    Ok(Json(rels))
}

pub async fn get_link(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let edge = state
        .db
        .links
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("link {} not found", id)))?;
    Ok(Json(ModObsRel::from(edge)))
}

pub async fn delete_link(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.links.delete(id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

pub async fn merge_module_supports(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<MergeModuleSupportsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let items: Vec<SupportItem> = required_items(req.observations, "observations")?
        .into_iter()
        .map(|s| SupportItem {
            other_id: s.observation_id,
            weight: s.weight,
        })
        .collect();

    let outcomes = state
        .db
        .links
        .merge_support_set(Side::Left, id, &items)
        .await?;
    let rels: Vec<ModObsRel> = outcomes
        .into_iter()
        .map(|o| ModObsRel::from(o.edge))
        .collect();
    Ok((StatusCode::CREATED, Json(rels)))
}

pub async fn list_module_supports(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let edges = state
        .db
        .links
        .list(EdgeFilter {
            left_id: Some(id),
            right_id: None,
        })
        .await?;
    let rels: Vec<ModObsRel> = edges.into_iter().map(ModObsRel::from).collect();
    Ok(Json(rels))
}

pub async fn clear_module_supports(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let removed = state.db.links.delete_all_for(Side::Left, id).await?;
    Ok(Json(serde_json::json!({ "removed": removed })))
}

pub async fn merge_observation_supporters(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<MergeObservationSupportersRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let items: Vec<SupportItem> = required_items(req.modules, "modules")?
        .into_iter()
        .map(|s| SupportItem {
            other_id: s.module_id,
            weight: s.weight,
        })
        .collect();

    let outcomes = state
        .db
        .links
        .merge_support_set(Side::Right, id, &items)
        .await?;
    let rels: Vec<ModObsRel> = outcomes
        .into_iter()
        .map(|o| ModObsRel::from(o.edge))
        .collect();
    Ok((StatusCode::CREATED, Json(rels)))
}

pub async fn list_observation_supporters(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let edges = state
        .db
        .links
        .list(EdgeFilter {
            left_id: None,
            right_id: Some(id),
        })
        .await?;
    let rels: Vec<ModObsRel> = edges.into_iter().map(ModObsRel::from).collect();
    Ok(Json(rels))
}

pub async fn clear_observation_supporters(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let removed = state.db.links.delete_all_for(Side::Right, id).await?;
    Ok(Json(serde_json::json!({ "removed": removed })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_bodies_are_keyed_objects() {
        let body = r#"{"observations":[{"observation_id":5}]}"#;
        let req: MergeModuleSupportsRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.observations.unwrap()[0].observation_id, 5);

        let body = r#"{"modules":[{"module_id":9,"weight":3}]}"#;
        let req: MergeObservationSupportersRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.modules.unwrap()[0].weight, Some(3));

        let bare = r#"[{"observation_id":5}]"#;
        assert!(serde_json::from_str::<MergeModuleSupportsRequest>(bare).is_err());
    }
}
