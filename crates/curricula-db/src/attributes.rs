//! Graduate attribute storage.

use sqlx::{PgPool, Row};
use tracing::info;

use curricula_core::{
    Attribute, CreateAttributeRequest, Error, Result, UpdateAttributeRequest,
};

use crate::{ensure_exists, escape_like};

/// Optional filters for listing attributes. Filters AND together.
#[derive(Debug, Clone, Default)]
pub struct AttributeFilter {
    /// Exact match on owning program.
    pub program_id: Option<i64>,
    /// Case-insensitive substring match on name.
    pub name: Option<String>,
}

#[derive(Clone)]
pub struct PgAttributeRepository {
    pool: PgPool,
}

impl PgAttributeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn from_row(row: &sqlx::postgres::PgRow) -> Attribute {
        Attribute {
            attribute_id: row.get("attribute_id"),
            name: row.get("name"),
            description: row.get("description"),
            program_id: row.get("program_id"),
        }
    }

    pub async fn create(&self, req: &CreateAttributeRequest) -> Result<Attribute> {
        if req.name.trim().is_empty() {
            return Err(Error::Validation("attribute name must not be empty".into()));
        }
        ensure_exists(&self.pool, "program", req.program_id).await?;

        let row = sqlx::query(
            r#"
            INSERT INTO attribute (name, description, program_id)
            VALUES ($1, $2, $3)
            RETURNING attribute_id, name, description, program_id
            "#,
        )
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.program_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        let attribute = Self::from_row(&row);

        info!(
            subsystem = "db",
            component = "attributes",
            op = "create",
            attribute_id = attribute.attribute_id,
            program_id = attribute.program_id,
            "Attribute created"
        );
        Ok(attribute)
    }

    pub async fn get(&self, attribute_id: i64) -> Result<Option<Attribute>> {
        let row = sqlx::query(
            "SELECT attribute_id, name, description, program_id FROM attribute WHERE attribute_id = $1",
        )
        .bind(attribute_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Self::from_row(&r)))
    }

    pub async fn list(&self, filter: AttributeFilter) -> Result<Vec<Attribute>> {
        let rows = sqlx::query(
            r#"
            SELECT attribute_id, name, description, program_id
            FROM attribute
            WHERE ($1::BIGINT IS NULL OR program_id = $1)
              AND ($2::TEXT IS NULL OR name ILIKE $2)
            ORDER BY attribute_id
            "#,
        )
        .bind(filter.program_id)
        .bind(filter.name.as_deref().map(|n| format!("%{}%", escape_like(n))))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(Self::from_row).collect())
    }

    /// Partial update; a supplied `program_id` is validated first.
    pub async fn update(&self, attribute_id: i64, req: &UpdateAttributeRequest) -> Result<Attribute> {
        if let Some(name) = &req.name {
            if name.trim().is_empty() {
                return Err(Error::Validation("attribute name must not be empty".into()));
            }
        }
        if let Some(program_id) = req.program_id {
            ensure_exists(&self.pool, "program", program_id).await?;
        }

        let row = sqlx::query(
            r#"
            UPDATE attribute
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                program_id = COALESCE($4, program_id)
            WHERE attribute_id = $1
            RETURNING attribute_id, name, description, program_id
            "#,
        )
        .bind(attribute_id)
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.program_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(|r| Self::from_row(&r))
            .ok_or_else(|| Error::NotFound(format!("attribute {} not found", attribute_id)))
    }

    pub async fn delete(&self, attribute_id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM attribute WHERE attribute_id = $1")
            .bind(attribute_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!(
                "attribute {} not found",
                attribute_id
            )));
        }

        info!(
            subsystem = "db",
            component = "attributes",
            op = "delete",
            attribute_id,
            "Attribute deleted"
        );
        Ok(())
    }
}
