//! Material routes: multipart upload, metadata CRUD, and download.
//!
//! Files land under `{module}/{tag}/{filename}` (each segment sanitized)
//! relative to the upload base directory; the material row stores that
//! relative path. Every successful mutation enqueues a notification to
//! the uploader.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use curricula_core::Material;
use curricula_db::{
    material_storage_path, validate_extension, FileStore, MaterialFilter, MaterialUpdate,
    NewMaterial,
};

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListMaterialsQuery {
    title: Option<String>,
    module_id: Option<i64>,
    tag_id: Option<i64>,
    user_id: Option<i64>,
    created_before: Option<DateTime<Utc>>,
    created_after: Option<DateTime<Utc>>,
}

/// Fields collected from a multipart material form. All optional here;
/// create and update enforce their own requirements.
#[derive(Debug, Default)]
struct MaterialForm {
    title: Option<String>,
    description: Option<String>,
    module_id: Option<i64>,
    tag_id: Option<i64>,
    file: Option<(String, Vec<u8>)>,
}

async fn parse_form(mut multipart: Multipart) -> Result<MaterialForm, ApiError> {
    let mut form = MaterialForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => {
                form.title = Some(field.text().await.map_err(bad_field)?);
            }
            "description" => {
                form.description = Some(field.text().await.map_err(bad_field)?);
            }
            "module_id" => {
                let text = field.text().await.map_err(bad_field)?;
                form.module_id = Some(
                    text.parse()
                        .map_err(|_| ApiError::BadRequest("invalid module_id".to_string()))?,
                );
            }
            "tag_id" => {
                let text = field.text().await.map_err(bad_field)?;
                form.tag_id = Some(
                    text.parse()
                        .map_err(|_| ApiError::BadRequest("invalid tag_id".to_string()))?,
                );
            }
            "file" => {
                let filename = field
                    .file_name()
                    .map(|f| f.to_string())
                    .ok_or_else(|| ApiError::BadRequest("file field needs a filename".into()))?;
                let bytes = field.bytes().await.map_err(bad_field)?;
                form.file = Some((filename, bytes.to_vec()));
            }
            _ => {}
        }
    }

    Ok(form)
}

fn bad_field(e: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::BadRequest(format!("invalid multipart field: {}", e))
}

/// Resolve the storage path for an upload from the owning module and tag.
async fn storage_path(
    state: &AppState,
    module_id: i64,
    tag_id: i64,
    filename: &str,
) -> Result<String, ApiError> {
    validate_extension(filename)?;

    let module = state
        .db
        .modules
        .get(module_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest(format!("module {} does not exist", module_id)))?;
    let tag = state
        .db
        .tags
        .get(tag_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest(format!("tag {} does not exist", tag_id)))?;

    Ok(material_storage_path(&module.name, &tag.name, filename))
}

pub async fn create_material(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = parse_form(multipart).await?;

    let title = form
        .title
        .ok_or_else(|| ApiError::BadRequest("title is required".to_string()))?;
    let module_id = form
        .module_id
        .ok_or_else(|| ApiError::BadRequest("module_id is required".to_string()))?;
    let tag_id = form
        .tag_id
        .ok_or_else(|| ApiError::BadRequest("tag_id is required".to_string()))?;
    let (filename, bytes) = form
        .file
        .ok_or_else(|| ApiError::BadRequest("file is required".to_string()))?;

    let file_path = storage_path(&state, module_id, tag_id, &filename).await?;
    state.files.save(&file_path, &bytes).await?;

    let material = state
        .db
        .materials
        .create(&NewMaterial {
            title,
            description: form.description,
            file_path,
            user_id: current.0.user_id,
            module_id,
            tag_id,
        })
        .await?;

    state.notifications.enqueue(
        current.0.user_id,
        format!("material {} uploaded", material.material_id),
    );

    info!(
        subsystem = "api",
        component = "materials",
        op = "upload",
        material_id = material.material_id,
        user_id = current.0.user_id,
        "Material uploaded"
    );
    Ok((StatusCode::CREATED, Json(material)))
}

pub async fn list_materials(
    State(state): State<AppState>,
    Query(query): Query<ListMaterialsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let materials = state
        .db
        .materials
        .list(MaterialFilter {
            title: query.title,
            module_id: query.module_id,
            tag_id: query.tag_id,
            user_id: query.user_id,
            created_before: query.created_before,
            created_after: query.created_after,
        })
        .await?;
    Ok(Json(materials))
}

pub async fn get_material(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let material = fetch_material(&state, id).await?;
    Ok(Json(material))
}

pub async fn update_material(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let existing = fetch_material(&state, id).await?;
    if existing.user_id != current.0.user_id {
        return Err(ApiError::Forbidden("not the material owner".to_string()));
    }

    let form = parse_form(multipart).await?;

    // A replacement file is stored under the effective module and tag,
    // which the same request may be changing.
    let module_id = form.module_id.unwrap_or(existing.module_id);
    let tag_id = form.tag_id.unwrap_or(existing.tag_id);

    let new_file_path = match &form.file {
        Some((filename, bytes)) => {
            let path = storage_path(&state, module_id, tag_id, filename).await?;
            state.files.save(&path, bytes).await?;
            Some(path)
        }
        None => None,
    };

    let material = state
        .db
        .materials
        .update(
            id,
            &MaterialUpdate {
                title: form.title,
                description: form.description,
                file_path: new_file_path.clone(),
                module_id: form.module_id,
                tag_id: form.tag_id,
            },
        )
        .await?;

    // Drop the replaced file only after the row points at the new one.
    if let Some(new_path) = new_file_path {
        if new_path != existing.file_path {
            if let Err(e) = state.files.remove(&existing.file_path).await {
                tracing::warn!(
                    subsystem = "api",
                    component = "materials",
                    material_id = id,
                    error_msg = %e,
                    "Failed to remove replaced file"
                );
            }
        }
    }

    state
        .notifications
        .enqueue(existing.user_id, format!("material {} updated", id));

    Ok(Json(material))
}

pub async fn delete_material(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let material = fetch_material(&state, id).await?;
    if material.user_id != current.0.user_id {
        return Err(ApiError::Forbidden("not the material owner".to_string()));
    }

    // File first; a row without a file is worse than a file without a row.
    state.files.remove(&material.file_path).await?;
    state.db.materials.delete(id).await?;

    state
        .notifications
        .enqueue(material.user_id, format!("material {} deleted", id));

    info!(
        subsystem = "api",
        component = "materials",
        op = "delete",
        material_id = id,
        "Material deleted"
    );
    Ok(Json(serde_json::json!({ "success": true })))
}

pub async fn download_material(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let material = fetch_material(&state, id).await?;
    let bytes = state.files.read(&material.file_path).await?;

    let filename = material
        .file_path
        .rsplit('/')
        .next()
        .unwrap_or("download")
        .to_string();

    let headers = [
        (
            header::CONTENT_TYPE,
            "application/octet-stream".to_string(),
        ),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
    ];
    Ok((headers, bytes))
}

async fn fetch_material(state: &AppState, id: i64) -> Result<Material, ApiError> {
    state
        .db
        .materials
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("material {} not found", id)))
}
