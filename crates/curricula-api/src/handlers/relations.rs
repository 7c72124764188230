//! Attribute↔objective relation routes.
//!
//! `/relations` works on single edges; the support-set routes under
//! `/graduate-attributes/:id/supports` and `/objectives/:id/supported-by`
//! operate on all edges anchored at one entity. A single-edge upsert
//! answers 201 when the edge is new and 200 when an existing edge's
//! weight was overwritten.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use curricula_core::{
    defaults::RELATION_WEIGHT, AttrObjRel, EdgeFilter, RelationRepository, Side, SupportItem,
};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateRelationRequest {
    pub attribute_id: i64,
    pub objective_id: i64,
    pub weight: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ListRelationsQuery {
    attribute_id: Option<i64>,
    objective_id: Option<i64>,
}

/// One entry of a support-set merge on the attribute side.
#[derive(Debug, Deserialize)]
pub struct ObjectiveSupport {
    pub objective_id: i64,
    pub weight: Option<i32>,
}

/// One entry of a support-set merge on the objective side.
#[derive(Debug, Deserialize)]
pub struct AttributeSupport {
    pub attribute_id: i64,
    pub weight: Option<i32>,
}

/// Body of `POST /graduate-attributes/:id/supports`.
#[derive(Debug, Deserialize)]
pub struct MergeAttributeSupportsRequest {
    pub objectives: Option<Vec<ObjectiveSupport>>,
}

/// Body of `POST /objectives/:id/supported-by`.
#[derive(Debug, Deserialize)]
pub struct MergeObjectiveSupportersRequest {
    pub attributes: Option<Vec<AttributeSupport>>,
}

/// Unwrap the keyed list of a bulk merge body. An absent or empty list
/// is a client error, not a no-op merge.
pub(crate) fn required_items<T>(items: Option<Vec<T>>, key: &str) -> Result<Vec<T>, ApiError> {
    match items {
        Some(items) if !items.is_empty() => Ok(items),
        _ => Err(ApiError::BadRequest(format!(
            "{} must be a non-empty list",
            key
        ))),
    }
}

pub async fn upsert_relation(
    State(state): State<AppState>,
    Json(req): Json<CreateRelationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .db
        .relations
        .upsert(
            req.attribute_id,
            req.objective_id,
            req.weight.unwrap_or(RELATION_WEIGHT),
        )
        .await?;

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(AttrObjRel::from(outcome.edge))))
}

pub async fn list_relations(
    State(state): State<AppState>,
    Query(query): Query<ListRelationsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let edges = state
        .db
        .relations
        .list(EdgeFilter {
            left_id: query.attribute_id,
            right_id: query.objective_id,
        })
        .await?;
    let rels: Vec<AttrObjRel> = edges.into_iter().map(AttrObjRel::from).collect();
    Ok(Json(rels))
}

pub async fn get_relation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let edge = state
        .db
        .relations
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("relation {} not found", id)))?;
    Ok(Json(AttrObjRel::from(edge)))
}

pub async fn delete_relation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.relations.delete(id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// Merge objectives into an attribute's support set. Additive: edges to
/// objectives not named in the payload stay in place.
pub async fn merge_attribute_supports(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<MergeAttributeSupportsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let items: Vec<SupportItem> = required_items(req.objectives, "objectives")?
        .into_iter()
        .map(|s| SupportItem {
            other_id: s.objective_id,
            weight: s.weight,
        })
        .collect();

    let outcomes = state
        .db
        .relations
        .merge_support_set(Side::Left, id, &items)
        .await?;
    let rels: Vec<AttrObjRel> = outcomes
        .into_iter()
        .map(|o| AttrObjRel::from(o.edge))
        .collect();
    Ok((StatusCode::CREATED, Json(rels)))
}

pub async fn list_attribute_supports(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let edges = state
        .db
        .relations
        .list(EdgeFilter {
            left_id: Some(id),
            right_id: None,
        })
        .await?;
    let rels: Vec<AttrObjRel> = edges.into_iter().map(AttrObjRel::from).collect();
    Ok(Json(rels))
}

pub async fn clear_attribute_supports(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let removed = state.db.relations.delete_all_for(Side::Left, id).await?;
    Ok(Json(serde_json::json!({ "removed": removed })))
}

/// Merge attributes into an objective's supported-by set.
pub async fn merge_objective_supporters(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<MergeObjectiveSupportersRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let items: Vec<SupportItem> = required_items(req.attributes, "attributes")?
        .into_iter()
        .map(|s| SupportItem {
            other_id: s.attribute_id,
            weight: s.weight,
        })
        .collect();

    let outcomes = state
        .db
        .relations
        .merge_support_set(Side::Right, id, &items)
        .await?;
    let rels: Vec<AttrObjRel> = outcomes
        .into_iter()
        .map(|o| AttrObjRel::from(o.edge))
        .collect();
    Ok((StatusCode::CREATED, Json(rels)))
}

pub async fn list_objective_supporters(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let edges = state
        .db
        .relations
        .list(EdgeFilter {
            left_id: None,
            right_id: Some(id),
        })
        .await?;
    let rels: Vec<AttrObjRel> = edges.into_iter().map(AttrObjRel::from).collect();
    Ok(Json(rels))
}

pub async fn clear_objective_supporters(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let removed = state.db.relations.delete_all_for(Side::Right, id).await?;
    Ok(Json(serde_json::json!({ "removed": removed })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_body_is_a_keyed_object() {
        let body = r#"{"objectives":[{"objective_id":3,"weight":2},{"objective_id":4}]}"#;
        let req: MergeAttributeSupportsRequest = serde_json::from_str(body).unwrap();
        let items = req.objectives.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].objective_id, 3);
        assert_eq!(items[0].weight, Some(2));
        assert_eq!(items[1].weight, None);

        // A bare array is not the documented shape.
        let bare = r#"[{"objective_id":3}]"#;
        assert!(serde_json::from_str::<MergeAttributeSupportsRequest>(bare).is_err());

        let supporters = r#"{"attributes":[{"attribute_id":7,"weight":1}]}"#;
        let req: MergeObjectiveSupportersRequest = serde_json::from_str(supporters).unwrap();
        assert_eq!(req.attributes.unwrap()[0].attribute_id, 7);
    }

    #[test]
    fn test_merge_rejects_absent_or_empty_list() {
        assert!(required_items::<ObjectiveSupport>(None, "objectives").is_err());
        assert!(required_items(Some(Vec::<ObjectiveSupport>::new()), "objectives").is_err());

        let one = vec![ObjectiveSupport {
            objective_id: 1,
            weight: None,
        }];
        assert_eq!(required_items(Some(one), "objectives").unwrap().len(), 1);
    }
}
