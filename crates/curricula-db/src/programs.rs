//! Program storage.

use sqlx::{PgPool, Row};
use tracing::info;

use curricula_core::{
    CreateProgramRequest, Error, Program, Result, UpdateProgramRequest,
};

use crate::escape_like;

/// Optional filters for listing programs. Filters AND together.
#[derive(Debug, Clone, Default)]
pub struct ProgramFilter {
    /// Case-insensitive substring match on name.
    pub name: Option<String>,
    /// Case-insensitive substring match on version.
    pub version: Option<String>,
}

#[derive(Clone)]
pub struct PgProgramRepository {
    pool: PgPool,
}

impl PgProgramRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn from_row(row: &sqlx::postgres::PgRow) -> Program {
        Program {
            program_id: row.get("program_id"),
            name: row.get("name"),
            description: row.get("description"),
            version: row.get("version"),
        }
    }

    pub async fn create(&self, req: &CreateProgramRequest) -> Result<Program> {
        if req.name.trim().is_empty() {
            return Err(Error::Validation("program name must not be empty".into()));
        }

        let row = sqlx::query(
            r#"
            INSERT INTO program (name, description, version)
            VALUES ($1, $2, $3)
            RETURNING program_id, name, description, version
            "#,
        )
        .bind(&req.name)
        .bind(&req.description)
        .bind(&req.version)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        let program = Self::from_row(&row);

        info!(
            subsystem = "db",
            component = "programs",
            op = "create",
            program_id = program.program_id,
            "Program created"
        );
        Ok(program)
    }

    pub async fn get(&self, program_id: i64) -> Result<Option<Program>> {
        let row = sqlx::query(
            "SELECT program_id, name, description, version FROM program WHERE program_id = $1",
        )
        .bind(program_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Self::from_row(&r)))
    }

    pub async fn list(&self, filter: ProgramFilter) -> Result<Vec<Program>> {
        let rows = sqlx::query(
            r#"
            SELECT program_id, name, description, version
            FROM program
            WHERE ($1::TEXT IS NULL OR name ILIKE $1)
              AND ($2::TEXT IS NULL OR version ILIKE $2)
            ORDER BY program_id
            "#,
        )
        .bind(filter.name.as_deref().map(|n| format!("%{}%", escape_like(n))))
        .bind(
            filter
                .version
                .as_deref()
                .map(|v| format!("%{}%", escape_like(v))),
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(Self::from_row).collect())
    }

    /// Partial update; absent fields keep current values.
    pub async fn update(&self, program_id: i64, req: &UpdateProgramRequest) -> Result<Program> {
        if let Some(name) = &req.name {
            if name.trim().is_empty() {
                return Err(Error::Validation("program name must not be empty".into()));
            }
        }

        let row = sqlx::query(
            r#"
            UPDATE program
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                version = COALESCE($4, version)
            WHERE program_id = $1
            RETURNING program_id, name, description, version
            "#,
        )
        .bind(program_id)
        .bind(&req.name)
        .bind(&req.description)
        .bind(&req.version)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(|r| Self::from_row(&r))
            .ok_or_else(|| Error::NotFound(format!("program {} not found", program_id)))
    }

    pub async fn delete(&self, program_id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM program WHERE program_id = $1")
            .bind(program_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("program {} not found", program_id)));
        }

        info!(
            subsystem = "db",
            component = "programs",
            op = "delete",
            program_id,
            "Program deleted"
        );
        Ok(())
    }
}
