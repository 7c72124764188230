//! Observable outcome storage.

use sqlx::{PgPool, Row};
use tracing::info;

use curricula_core::{
    CreateObservationRequest, Error, Observation, Result, UpdateObservationRequest,
};

use crate::{ensure_exists, escape_like};

/// Optional filters for listing observations. Filters AND together.
#[derive(Debug, Clone, Default)]
pub struct ObservationFilter {
    pub attribute_id: Option<i64>,
    pub name: Option<String>,
}

#[derive(Clone)]
pub struct PgObservationRepository {
    pool: PgPool,
}

impl PgObservationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn from_row(row: &sqlx::postgres::PgRow) -> Observation {
        Observation {
            observation_id: row.get("observation_id"),
            name: row.get("name"),
            description: row.get("description"),
            attribute_id: row.get("attribute_id"),
        }
    }

    pub async fn create(&self, req: &CreateObservationRequest) -> Result<Observation> {
        if req.name.trim().is_empty() {
            return Err(Error::Validation(
                "observation name must not be empty".into(),
            ));
        }
        ensure_exists(&self.pool, "attribute", req.attribute_id).await?;

        let row = sqlx::query(
            r#"
            INSERT INTO observation (name, description, attribute_id)
            VALUES ($1, $2, $3)
            RETURNING observation_id, name, description, attribute_id
            "#,
        )
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.attribute_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        let observation = Self::from_row(&row);

        info!(
            subsystem = "db",
            component = "observations",
            op = "create",
            observation_id = observation.observation_id,
            attribute_id = observation.attribute_id,
            "Observation created"
        );
        Ok(observation)
    }

    pub async fn get(&self, observation_id: i64) -> Result<Option<Observation>> {
        let row = sqlx::query(
            "SELECT observation_id, name, description, attribute_id FROM observation WHERE observation_id = $1",
        )
        .bind(observation_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Self::from_row(&r)))
    }

    pub async fn list(&self, filter: ObservationFilter) -> Result<Vec<Observation>> {
        let rows = sqlx::query(
            r#"
            SELECT observation_id, name, description, attribute_id
            FROM observation
            WHERE ($1::BIGINT IS NULL OR attribute_id = $1)
              AND ($2::TEXT IS NULL OR name ILIKE $2)
            ORDER BY observation_id
            "#,
        )
        .bind(filter.attribute_id)
        .bind(filter.name.as_deref().map(|n| format!("%{}%", escape_like(n))))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(Self::from_row).collect())
    }

    pub async fn update(
        &self,
        observation_id: i64,
        req: &UpdateObservationRequest,
    ) -> Result<Observation> {
        if let Some(name) = &req.name {
            if name.trim().is_empty() {
                return Err(Error::Validation(
                    "observation name must not be empty".into(),
                ));
            }
        }
        if let Some(attribute_id) = req.attribute_id {
            ensure_exists(&self.pool, "attribute", attribute_id).await?;
        }

        let row = sqlx::query(
            r#"
            UPDATE observation
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                attribute_id = COALESCE($4, attribute_id)
            WHERE observation_id = $1
            RETURNING observation_id, name, description, attribute_id
            "#,
        )
        .bind(observation_id)
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.attribute_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(|r| Self::from_row(&r))
            .ok_or_else(|| Error::NotFound(format!("observation {} not found", observation_id)))
    }

    pub async fn delete(&self, observation_id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM observation WHERE observation_id = $1")
            .bind(observation_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!(
                "observation {} not found",
                observation_id
            )));
        }

        info!(
            subsystem = "db",
            component = "observations",
            op = "delete",
            observation_id,
            "Observation deleted"
        );
        Ok(())
    }
}
