//! Learning objective storage.

use sqlx::{PgPool, Row};
use tracing::info;

use curricula_core::{
    CreateObjectiveRequest, Error, Objective, Result, UpdateObjectiveRequest,
};

use crate::{ensure_exists, escape_like};

/// Optional filters for listing objectives. Filters AND together.
#[derive(Debug, Clone, Default)]
pub struct ObjectiveFilter {
    pub program_id: Option<i64>,
    pub name: Option<String>,
}

#[derive(Clone)]
pub struct PgObjectiveRepository {
    pool: PgPool,
}

impl PgObjectiveRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn from_row(row: &sqlx::postgres::PgRow) -> Objective {
        Objective {
            objective_id: row.get("objective_id"),
            name: row.get("name"),
            description: row.get("description"),
            program_id: row.get("program_id"),
        }
    }

    pub async fn create(&self, req: &CreateObjectiveRequest) -> Result<Objective> {
        if req.name.trim().is_empty() {
            return Err(Error::Validation("objective name must not be empty".into()));
        }
        ensure_exists(&self.pool, "program", req.program_id).await?;

        let row = sqlx::query(
            r#"
            INSERT INTO objective (name, description, program_id)
            VALUES ($1, $2, $3)
            RETURNING objective_id, name, description, program_id
            "#,
        )
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.program_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        let objective = Self::from_row(&row);

        info!(
            subsystem = "db",
            component = "objectives",
            op = "create",
            objective_id = objective.objective_id,
            program_id = objective.program_id,
            "Objective created"
        );
        Ok(objective)
    }

    pub async fn get(&self, objective_id: i64) -> Result<Option<Objective>> {
        let row = sqlx::query(
            "SELECT objective_id, name, description, program_id FROM objective WHERE objective_id = $1",
        )
        .bind(objective_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Self::from_row(&r)))
    }

    pub async fn list(&self, filter: ObjectiveFilter) -> Result<Vec<Objective>> {
        let rows = sqlx::query(
            r#"
            SELECT objective_id, name, description, program_id
            FROM objective
            WHERE ($1::BIGINT IS NULL OR program_id = $1)
              AND ($2::TEXT IS NULL OR name ILIKE $2)
            ORDER BY objective_id
            "#,
        )
        .bind(filter.program_id)
        .bind(filter.name.as_deref().map(|n| format!("%{}%", escape_like(n))))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(Self::from_row).collect())
    }

    pub async fn update(&self, objective_id: i64, req: &UpdateObjectiveRequest) -> Result<Objective> {
        if let Some(name) = &req.name {
            if name.trim().is_empty() {
                return Err(Error::Validation("objective name must not be empty".into()));
            }
        }
        if let Some(program_id) = req.program_id {
            ensure_exists(&self.pool, "program", program_id).await?;
        }

        let row = sqlx::query(
            r#"
            UPDATE objective
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                program_id = COALESCE($4, program_id)
            WHERE objective_id = $1
            RETURNING objective_id, name, description, program_id
            "#,
        )
        .bind(objective_id)
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.program_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(|r| Self::from_row(&r))
            .ok_or_else(|| Error::NotFound(format!("objective {} not found", objective_id)))
    }

    pub async fn delete(&self, objective_id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM objective WHERE objective_id = $1")
            .bind(objective_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!(
                "objective {} not found",
                objective_id
            )));
        }

        info!(
            subsystem = "db",
            component = "objectives",
            op = "delete",
            objective_id,
            "Objective deleted"
        );
        Ok(())
    }
}
