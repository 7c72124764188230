//! Curriculum module storage.

use sqlx::{PgPool, Row};
use tracing::info;

use curricula_core::{CreateModuleRequest, Error, Module, Result, UpdateModuleRequest};

use crate::{ensure_exists, escape_like};

/// Optional filters for listing modules. Filters AND together.
#[derive(Debug, Clone, Default)]
pub struct ModuleFilter {
    /// Case-insensitive substring match on name.
    pub name: Option<String>,
    /// Case-insensitive substring match on the offering unit.
    pub offered_by: Option<String>,
    /// Exact match on owning program.
    pub program_id: Option<i64>,
}

#[derive(Clone)]
pub struct PgModuleRepository {
    pool: PgPool,
}

const MODULE_COLUMNS: &str = "module_id, name, name_en, nature, category, number, credit, \
     lec_hours, lab_hours, oncampus_prac, offcampus_prac, term, offered_by, description, program_id";

impl PgModuleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn from_row(row: &sqlx::postgres::PgRow) -> Module {
        Module {
            module_id: row.get("module_id"),
            name: row.get("name"),
            name_en: row.get("name_en"),
            nature: row.get("nature"),
            category: row.get("category"),
            number: row.get("number"),
            credit: row.get("credit"),
            lec_hours: row.get("lec_hours"),
            lab_hours: row.get("lab_hours"),
            oncampus_prac: row.get("oncampus_prac"),
            offcampus_prac: row.get("offcampus_prac"),
            term: row.get("term"),
            offered_by: row.get("offered_by"),
            description: row.get("description"),
            program_id: row.get("program_id"),
        }
    }

    pub async fn create(&self, req: &CreateModuleRequest) -> Result<Module> {
        if req.name.trim().is_empty() {
            return Err(Error::Validation("module name must not be empty".into()));
        }
        ensure_exists(&self.pool, "program", req.program_id).await?;

        let sql = format!(
            r#"
            INSERT INTO module (name, name_en, nature, category, number, credit,
                lec_hours, lab_hours, oncampus_prac, offcampus_prac, term,
                offered_by, description, program_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {MODULE_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(&req.name)
            .bind(&req.name_en)
            .bind(&req.nature)
            .bind(&req.category)
            .bind(&req.number)
            .bind(req.credit)
            .bind(req.lec_hours)
            .bind(req.lab_hours)
            .bind(req.oncampus_prac)
            .bind(req.offcampus_prac)
            .bind(&req.term)
            .bind(&req.offered_by)
            .bind(&req.description)
            .bind(req.program_id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;

        let module = Self::from_row(&row);

        info!(
            subsystem = "db",
            component = "modules",
            op = "create",
            module_id = module.module_id,
            program_id = module.program_id,
            "Module created"
        );
        Ok(module)
    }

    pub async fn get(&self, module_id: i64) -> Result<Option<Module>> {
        let sql = format!("SELECT {MODULE_COLUMNS} FROM module WHERE module_id = $1");
        let row = sqlx::query(&sql)
            .bind(module_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.map(|r| Self::from_row(&r)))
    }

    pub async fn list(&self, filter: ModuleFilter) -> Result<Vec<Module>> {
        let sql = format!(
            r#"
            SELECT {MODULE_COLUMNS}
            FROM module
            WHERE ($1::TEXT IS NULL OR name ILIKE $1)
              AND ($2::TEXT IS NULL OR offered_by ILIKE $2)
              AND ($3::BIGINT IS NULL OR program_id = $3)
            ORDER BY module_id
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(filter.name.as_deref().map(|n| format!("%{}%", escape_like(n))))
            .bind(
                filter
                    .offered_by
                    .as_deref()
                    .map(|o| format!("%{}%", escape_like(o))),
            )
            .bind(filter.program_id)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows.iter().map(Self::from_row).collect())
    }

    /// Partial update; a supplied `program_id` is validated first.
    pub async fn update(&self, module_id: i64, req: &UpdateModuleRequest) -> Result<Module> {
        if let Some(name) = &req.name {
            if name.trim().is_empty() {
                return Err(Error::Validation("module name must not be empty".into()));
            }
        }
        if let Some(program_id) = req.program_id {
            ensure_exists(&self.pool, "program", program_id).await?;
        }

        let sql = format!(
            r#"
            UPDATE module
            SET name = COALESCE($2, name),
                name_en = COALESCE($3, name_en),
                nature = COALESCE($4, nature),
                category = COALESCE($5, category),
                number = COALESCE($6, number),
                credit = COALESCE($7, credit),
                lec_hours = COALESCE($8, lec_hours),
                lab_hours = COALESCE($9, lab_hours),
                oncampus_prac = COALESCE($10, oncampus_prac),
                offcampus_prac = COALESCE($11, offcampus_prac),
                term = COALESCE($12, term),
                offered_by = COALESCE($13, offered_by),
                description = COALESCE($14, description),
                program_id = COALESCE($15, program_id)
            WHERE module_id = $1
            RETURNING {MODULE_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(module_id)
            .bind(&req.name)
            .bind(&req.name_en)
            .bind(&req.nature)
            .bind(&req.category)
            .bind(&req.number)
            .bind(req.credit)
            .bind(req.lec_hours)
            .bind(req.lab_hours)
            .bind(req.oncampus_prac)
            .bind(req.offcampus_prac)
            .bind(&req.term)
            .bind(&req.offered_by)
            .bind(&req.description)
            .bind(req.program_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        row.map(|r| Self::from_row(&r))
            .ok_or_else(|| Error::NotFound(format!("module {} not found", module_id)))
    }

    pub async fn delete(&self, module_id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM module WHERE module_id = $1")
            .bind(module_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("module {} not found", module_id)));
        }

        info!(
            subsystem = "db",
            component = "modules",
            op = "delete",
            module_id,
            "Module deleted"
        );
        Ok(())
    }
}
