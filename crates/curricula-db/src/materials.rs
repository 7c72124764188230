//! Teaching material storage.
//!
//! The repository stores metadata only; file bytes live under the upload
//! base directory managed by [`crate::file_store`]. `file_path` is the
//! path relative to that base.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::info;

use curricula_core::{Error, Material, Result};

use crate::{ensure_exists, escape_like};

/// Field values for inserting a material row.
#[derive(Debug, Clone)]
pub struct NewMaterial {
    pub title: String,
    pub description: Option<String>,
    pub file_path: String,
    pub user_id: i64,
    pub module_id: i64,
    pub tag_id: i64,
}

/// Partial update of a material's metadata. A new `file_path` is set when
/// the upload was replaced.
#[derive(Debug, Clone, Default)]
pub struct MaterialUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub file_path: Option<String>,
    pub module_id: Option<i64>,
    pub tag_id: Option<i64>,
}

/// Optional filters for listing materials. Filters AND together.
#[derive(Debug, Clone, Default)]
pub struct MaterialFilter {
    /// Case-insensitive substring match on title.
    pub title: Option<String>,
    pub module_id: Option<i64>,
    pub tag_id: Option<i64>,
    pub user_id: Option<i64>,
    pub created_before: Option<DateTime<Utc>>,
    pub created_after: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct PgMaterialRepository {
    pool: PgPool,
}

const MATERIAL_COLUMNS: &str =
    "material_id, title, description, file_path, created_at, updated_at, user_id, module_id, tag_id";

impl PgMaterialRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn from_row(row: &sqlx::postgres::PgRow) -> Material {
        Material {
            material_id: row.get("material_id"),
            title: row.get("title"),
            description: row.get("description"),
            file_path: row.get("file_path"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            user_id: row.get("user_id"),
            module_id: row.get("module_id"),
            tag_id: row.get("tag_id"),
        }
    }

    pub async fn create(&self, new: &NewMaterial) -> Result<Material> {
        if new.title.trim().is_empty() {
            return Err(Error::Validation("material title must not be empty".into()));
        }
        ensure_exists(&self.pool, "module", new.module_id).await?;
        ensure_exists(&self.pool, "tag", new.tag_id).await?;

        let sql = format!(
            r#"
            INSERT INTO material (title, description, file_path, user_id, module_id, tag_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {MATERIAL_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(&new.title)
            .bind(&new.description)
            .bind(&new.file_path)
            .bind(new.user_id)
            .bind(new.module_id)
            .bind(new.tag_id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;

        let material = Self::from_row(&row);

        info!(
            subsystem = "db",
            component = "materials",
            op = "create",
            material_id = material.material_id,
            module_id = material.module_id,
            user_id = material.user_id,
            "Material created"
        );
        Ok(material)
    }

    pub async fn get(&self, material_id: i64) -> Result<Option<Material>> {
        let sql = format!("SELECT {MATERIAL_COLUMNS} FROM material WHERE material_id = $1");
        let row = sqlx::query(&sql)
            .bind(material_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.map(|r| Self::from_row(&r)))
    }

    pub async fn list(&self, filter: MaterialFilter) -> Result<Vec<Material>> {
        let sql = format!(
            r#"
            SELECT {MATERIAL_COLUMNS}
            FROM material
            WHERE ($1::TEXT IS NULL OR title ILIKE $1)
              AND ($2::BIGINT IS NULL OR module_id = $2)
              AND ($3::BIGINT IS NULL OR tag_id = $3)
              AND ($4::BIGINT IS NULL OR user_id = $4)
              AND ($5::TIMESTAMPTZ IS NULL OR created_at < $5)
              AND ($6::TIMESTAMPTZ IS NULL OR created_at > $6)
            ORDER BY material_id
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(
                filter
                    .title
                    .as_deref()
                    .map(|t| format!("%{}%", escape_like(t))),
            )
            .bind(filter.module_id)
            .bind(filter.tag_id)
            .bind(filter.user_id)
            .bind(filter.created_before)
            .bind(filter.created_after)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows.iter().map(Self::from_row).collect())
    }

    /// Partial metadata update. `updated_at` is bumped on every call.
    pub async fn update(&self, material_id: i64, update: &MaterialUpdate) -> Result<Material> {
        if let Some(title) = &update.title {
            if title.trim().is_empty() {
                return Err(Error::Validation("material title must not be empty".into()));
            }
        }
        if let Some(module_id) = update.module_id {
            ensure_exists(&self.pool, "module", module_id).await?;
        }
        if let Some(tag_id) = update.tag_id {
            ensure_exists(&self.pool, "tag", tag_id).await?;
        }

        let sql = format!(
            r#"
            UPDATE material
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                file_path = COALESCE($4, file_path),
                module_id = COALESCE($5, module_id),
                tag_id = COALESCE($6, tag_id),
                updated_at = now()
            WHERE material_id = $1
            RETURNING {MATERIAL_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(material_id)
            .bind(&update.title)
            .bind(&update.description)
            .bind(&update.file_path)
            .bind(update.module_id)
            .bind(update.tag_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        row.map(|r| Self::from_row(&r))
            .ok_or_else(|| Error::NotFound(format!("material {} not found", material_id)))
    }

    pub async fn delete(&self, material_id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM material WHERE material_id = $1")
            .bind(material_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!(
                "material {} not found",
                material_id
            )));
        }

        info!(
            subsystem = "db",
            component = "materials",
            op = "delete",
            material_id,
            "Material deleted"
        );
        Ok(())
    }
}
