//! Tag storage. Tags are user-owned labels attached to materials.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::info;

use curricula_core::{Error, Result, Tag};

use crate::{ensure_exists, escape_like};

/// Optional filters for listing tags. Filters AND together.
#[derive(Debug, Clone, Default)]
pub struct TagFilter {
    pub user_id: Option<i64>,
    pub name: Option<String>,
    pub created_before: Option<DateTime<Utc>>,
    pub created_after: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct PgTagRepository {
    pool: PgPool,
}

impl PgTagRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn from_row(row: &sqlx::postgres::PgRow) -> Tag {
        Tag {
            tag_id: row.get("tag_id"),
            name: row.get("name"),
            user_id: row.get("user_id"),
            created_at: row.get("created_at"),
        }
    }

    pub async fn create(&self, name: &str, user_id: i64) -> Result<Tag> {
        if name.trim().is_empty() {
            return Err(Error::Validation("tag name must not be empty".into()));
        }
        ensure_exists(&self.pool, "app_user", user_id).await?;

        let row = sqlx::query(
            r#"
            INSERT INTO tag (name, user_id)
            VALUES ($1, $2)
            RETURNING tag_id, name, user_id, created_at
            "#,
        )
        .bind(name)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        let tag = Self::from_row(&row);

        info!(
            subsystem = "db",
            component = "tags",
            op = "create",
            tag_id = tag.tag_id,
            user_id,
            "Tag created"
        );
        Ok(tag)
    }

    pub async fn get(&self, tag_id: i64) -> Result<Option<Tag>> {
        let row =
            sqlx::query("SELECT tag_id, name, user_id, created_at FROM tag WHERE tag_id = $1")
                .bind(tag_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(Error::Database)?;

        Ok(row.map(|r| Self::from_row(&r)))
    }

    pub async fn list(&self, filter: TagFilter) -> Result<Vec<Tag>> {
        let rows = sqlx::query(
            r#"
            SELECT tag_id, name, user_id, created_at
            FROM tag
            WHERE ($1::BIGINT IS NULL OR user_id = $1)
              AND ($2::TEXT IS NULL OR name ILIKE $2)
              AND ($3::TIMESTAMPTZ IS NULL OR created_at < $3)
              AND ($4::TIMESTAMPTZ IS NULL OR created_at > $4)
            ORDER BY tag_id
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.name.as_deref().map(|n| format!("%{}%", escape_like(n))))
        .bind(filter.created_before)
        .bind(filter.created_after)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(Self::from_row).collect())
    }

    pub async fn rename(&self, tag_id: i64, name: &str) -> Result<Tag> {
        if name.trim().is_empty() {
            return Err(Error::Validation("tag name must not be empty".into()));
        }

        let row = sqlx::query(
            r#"
            UPDATE tag SET name = $2
            WHERE tag_id = $1
            RETURNING tag_id, name, user_id, created_at
            "#,
        )
        .bind(tag_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(|r| Self::from_row(&r))
            .ok_or_else(|| Error::NotFound(format!("tag {} not found", tag_id)))
    }

    pub async fn delete(&self, tag_id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM tag WHERE tag_id = $1")
            .bind(tag_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("tag {} not found", tag_id)));
        }

        info!(
            subsystem = "db",
            component = "tags",
            op = "delete",
            tag_id,
            "Tag deleted"
        );
        Ok(())
    }
}
