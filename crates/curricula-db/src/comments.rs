//! Comment storage.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::info;

use curricula_core::{Comment, Error, Result};

use crate::ensure_exists;

/// Optional filters for listing comments. Filters AND together.
#[derive(Debug, Clone, Default)]
pub struct CommentFilter {
    pub user_id: Option<i64>,
    pub material_id: Option<i64>,
    pub created_before: Option<DateTime<Utc>>,
    pub created_after: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct PgCommentRepository {
    pool: PgPool,
}

impl PgCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn from_row(row: &sqlx::postgres::PgRow) -> Comment {
        Comment {
            comment_id: row.get("comment_id"),
            text: row.get("text"),
            created_at: row.get("created_at"),
            user_id: row.get("user_id"),
            material_id: row.get("material_id"),
        }
    }

    pub async fn create(
        &self,
        text: Option<&str>,
        user_id: i64,
        material_id: i64,
    ) -> Result<Comment> {
        ensure_exists(&self.pool, "material", material_id).await?;

        let row = sqlx::query(
            r#"
            INSERT INTO comment (text, user_id, material_id)
            VALUES ($1, $2, $3)
            RETURNING comment_id, text, created_at, user_id, material_id
            "#,
        )
        .bind(text)
        .bind(user_id)
        .bind(material_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        let comment = Self::from_row(&row);

        info!(
            subsystem = "db",
            component = "comments",
            op = "create",
            comment_id = comment.comment_id,
            material_id,
            user_id,
            "Comment created"
        );
        Ok(comment)
    }

    pub async fn get(&self, comment_id: i64) -> Result<Option<Comment>> {
        let row = sqlx::query(
            "SELECT comment_id, text, created_at, user_id, material_id FROM comment WHERE comment_id = $1",
        )
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Self::from_row(&r)))
    }

    pub async fn list(&self, filter: CommentFilter) -> Result<Vec<Comment>> {
        let rows = sqlx::query(
            r#"
            SELECT comment_id, text, created_at, user_id, material_id
            FROM comment
            WHERE ($1::BIGINT IS NULL OR user_id = $1)
              AND ($2::BIGINT IS NULL OR material_id = $2)
              AND ($3::TIMESTAMPTZ IS NULL OR created_at < $3)
              AND ($4::TIMESTAMPTZ IS NULL OR created_at > $4)
            ORDER BY comment_id
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.material_id)
        .bind(filter.created_before)
        .bind(filter.created_after)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(Self::from_row).collect())
    }

    /// Replace the comment text. Only the text is mutable after creation.
    pub async fn set_text(&self, comment_id: i64, text: Option<&str>) -> Result<Comment> {
        let row = sqlx::query(
            r#"
            UPDATE comment SET text = $2
            WHERE comment_id = $1
            RETURNING comment_id, text, created_at, user_id, material_id
            "#,
        )
        .bind(comment_id)
        .bind(text)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(|r| Self::from_row(&r))
            .ok_or_else(|| Error::NotFound(format!("comment {} not found", comment_id)))
    }

    pub async fn delete(&self, comment_id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM comment WHERE comment_id = $1")
            .bind(comment_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("comment {} not found", comment_id)));
        }

        info!(
            subsystem = "db",
            component = "comments",
            op = "delete",
            comment_id,
            "Comment deleted"
        );
        Ok(())
    }
}
