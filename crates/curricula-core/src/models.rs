//! Data models for curricula entities and their request types.
//!
//! Field names double as the wire format: handlers serialize these
//! structs directly, so the JSON keys match the public API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::Role;

// =============================================================================
// USERS
// =============================================================================

/// A user account. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
}

/// Registration / admin user-creation payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub role: Role,
}

/// Login payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Password change payload. `username` must match the authenticated user.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    pub username: String,
    pub password: String,
    pub new_password: String,
}

/// Admin update of a user record. Absent fields keep current values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub role: Option<Role>,
}

// =============================================================================
// CURRICULUM ENTITIES
// =============================================================================

/// An academic program, owner of attributes, objectives, and modules.
#[derive(Debug, Clone, Serialize)]
pub struct Program {
    pub program_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProgramRequest {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProgramRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
}

/// A graduate attribute, owned by one program.
#[derive(Debug, Clone, Serialize)]
pub struct Attribute {
    pub attribute_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub program_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAttributeRequest {
    pub name: String,
    pub description: Option<String>,
    pub program_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAttributeRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub program_id: Option<i64>,
}

/// A learning objective, owned by one program.
#[derive(Debug, Clone, Serialize)]
pub struct Objective {
    pub objective_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub program_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateObjectiveRequest {
    pub name: String,
    pub description: Option<String>,
    pub program_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateObjectiveRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub program_id: Option<i64>,
}

/// An observable outcome, owned by one attribute.
#[derive(Debug, Clone, Serialize)]
pub struct Observation {
    pub observation_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub attribute_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateObservationRequest {
    pub name: String,
    pub description: Option<String>,
    pub attribute_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateObservationRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub attribute_id: Option<i64>,
}

/// A curriculum module. Only `name` and `program_id` are validated; the
/// descriptive metadata is free-form.
#[derive(Debug, Clone, Serialize)]
pub struct Module {
    pub module_id: i64,
    pub name: String,
    pub name_en: Option<String>,
    pub nature: Option<String>,
    pub category: Option<String>,
    pub number: Option<String>,
    pub credit: Option<f64>,
    pub lec_hours: Option<i32>,
    pub lab_hours: Option<i32>,
    pub oncampus_prac: Option<i32>,
    pub offcampus_prac: Option<i32>,
    pub term: Option<String>,
    pub offered_by: Option<String>,
    pub description: Option<String>,
    pub program_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateModuleRequest {
    pub name: String,
    pub name_en: Option<String>,
    pub nature: Option<String>,
    pub category: Option<String>,
    pub number: Option<String>,
    pub credit: Option<f64>,
    pub lec_hours: Option<i32>,
    pub lab_hours: Option<i32>,
    pub oncampus_prac: Option<i32>,
    pub offcampus_prac: Option<i32>,
    pub term: Option<String>,
    pub offered_by: Option<String>,
    pub description: Option<String>,
    pub program_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateModuleRequest {
    pub name: Option<String>,
    pub name_en: Option<String>,
    pub nature: Option<String>,
    pub category: Option<String>,
    pub number: Option<String>,
    pub credit: Option<f64>,
    pub lec_hours: Option<i32>,
    pub lab_hours: Option<i32>,
    pub oncampus_prac: Option<i32>,
    pub offcampus_prac: Option<i32>,
    pub term: Option<String>,
    pub offered_by: Option<String>,
    pub description: Option<String>,
    pub program_id: Option<i64>,
}

// =============================================================================
// RELATION EDGES
// =============================================================================

/// A weighted edge between two entities, unique per (left, right) pair.
///
/// The relation engine is generic; `left`/`right` map to concrete column
/// names per edge table (attribute/objective, module/observation).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub id: i64,
    pub left_id: i64,
    pub right_id: i64,
    pub weight: i32,
}

/// Which side of an edge table an operation is anchored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Result of an edge upsert: the stored edge plus whether it was created
/// (as opposed to an existing edge whose weight was overwritten).
#[derive(Debug, Clone, Copy)]
pub struct UpsertOutcome {
    pub edge: Edge,
    pub created: bool,
}

/// AND-combined exact filters for listing edges.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeFilter {
    pub left_id: Option<i64>,
    pub right_id: Option<i64>,
}

/// One item of a bulk support-set merge: the id on the non-anchored side
/// and an optional weight. A missing weight defaults to 1 on create and
/// leaves the stored weight untouched on update.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SupportItem {
    pub other_id: i64,
    pub weight: Option<i32>,
}

/// Wire form of an attribute↔objective edge.
#[derive(Debug, Clone, Serialize)]
pub struct AttrObjRel {
    pub attr_obj_id: i64,
    pub attribute_id: i64,
    pub objective_id: i64,
    pub weight: i32,
}

impl From<Edge> for AttrObjRel {
    fn from(edge: Edge) -> Self {
        Self {
            attr_obj_id: edge.id,
            attribute_id: edge.left_id,
            objective_id: edge.right_id,
            weight: edge.weight,
        }
    }
}

/// Wire form of a module↔observation edge.
#[derive(Debug, Clone, Serialize)]
pub struct ModObsRel {
    pub mod_obs_id: i64,
    pub module_id: i64,
    pub observation_id: i64,
    pub weight: i32,
}

impl From<Edge> for ModObsRel {
    fn from(edge: Edge) -> Self {
        Self {
            mod_obs_id: edge.id,
            module_id: edge.left_id,
            observation_id: edge.right_id,
            weight: edge.weight,
        }
    }
}

// =============================================================================
// ANCILLARY ENTITIES
// =============================================================================

/// A user-owned label for materials.
#[derive(Debug, Clone, Serialize)]
pub struct Tag {
    pub tag_id: i64,
    pub name: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTagRequest {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTagRequest {
    pub name: Option<String>,
}

/// An uploaded teaching material; `file_path` is relative to the upload
/// base directory.
#[derive(Debug, Clone, Serialize)]
pub struct Material {
    pub material_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub file_path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: i64,
    pub module_id: i64,
    pub tag_id: i64,
}

/// A comment on a material.
#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    pub comment_id: i64,
    pub text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub user_id: i64,
    pub material_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCommentRequest {
    pub text: Option<String>,
    pub material_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCommentRequest {
    pub text: Option<String>,
}

/// A message targeted at one user.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub notification_id: i64,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub user_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateNotificationRequest {
    pub message: String,
    pub user_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateNotificationRequest {
    pub message: Option<String>,
    pub user_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_serialization_hides_password_hash() {
        let user = User {
            user_id: 1,
            username: "alice".into(),
            password_hash: "secret".into(),
            role: Role::Staff,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains(r#""role":"staff""#));
    }

    #[test]
    fn test_edge_maps_to_attr_obj_wire_form() {
        let edge = Edge {
            id: 3,
            left_id: 1,
            right_id: 2,
            weight: 5,
        };
        let rel = AttrObjRel::from(edge);
        assert_eq!(rel.attr_obj_id, 3);
        assert_eq!(rel.attribute_id, 1);
        assert_eq!(rel.objective_id, 2);
        assert_eq!(rel.weight, 5);
    }

    #[test]
    fn test_edge_maps_to_mod_obs_wire_form() {
        let edge = Edge {
            id: 9,
            left_id: 4,
            right_id: 8,
            weight: 2,
        };
        let rel = ModObsRel::from(edge);
        assert_eq!(rel.mod_obs_id, 9);
        assert_eq!(rel.module_id, 4);
        assert_eq!(rel.observation_id, 8);
    }

    #[test]
    fn test_support_item_deserializes_without_weight() {
        let item: SupportItem = serde_json::from_str(r#"{"other_id": 12}"#).unwrap();
        assert_eq!(item.other_id, 12);
        assert!(item.weight.is_none());
    }

    #[test]
    fn test_update_request_defaults_are_empty() {
        let update = UpdateProgramRequest::default();
        assert!(update.name.is_none());
        assert!(update.description.is_none());
        assert!(update.version.is_none());
    }
}
