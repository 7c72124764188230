//! Weighted relation upsert engine.
//!
//! One implementation serves both edge tables (attribute↔objective and
//! module↔observation): an [`EdgeTable`] names the table and columns, and
//! [`PgRelationRepository`] builds its SQL from those static names. No
//! user input ever reaches the SQL text; ids and weights are bound.
//!
//! Upserts are a single conflict-resolving INSERT against the pair's
//! UNIQUE constraint, so two concurrent upserts of the same (left, right)
//! pair cannot both insert. `(xmax = 0)` on the returned row tells a fresh
//! insert apart from a conflict-update, which drives the API's
//! 201-created vs 200-updated contract.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::debug;

use curricula_core::{
    Edge, EdgeFilter, Error, RelationRepository, Result, Side, SupportItem, UpsertOutcome,
};

/// Static description of one weighted edge table.
#[derive(Debug, Clone, Copy)]
pub struct EdgeTable {
    /// Edge table name.
    pub table: &'static str,
    /// Primary key column of the edge table.
    pub id_column: &'static str,
    /// Column holding the left-side foreign key.
    pub left_column: &'static str,
    /// Column holding the right-side foreign key.
    pub right_column: &'static str,
    /// Table the left side references (also its primary key prefix).
    pub left_table: &'static str,
    /// Table the right side references.
    pub right_table: &'static str,
}

impl EdgeTable {
    fn column_for(&self, side: Side) -> &'static str {
        match side {
            Side::Left => self.left_column,
            Side::Right => self.right_column,
        }
    }
}

/// Attribute↔objective edges (`/relations`, attribute supports).
pub const ATTRIBUTE_OBJECTIVE_EDGES: EdgeTable = EdgeTable {
    table: "attr_obj_rel",
    id_column: "attr_obj_id",
    left_column: "attribute_id",
    right_column: "objective_id",
    left_table: "attribute",
    right_table: "objective",
};

/// Module↔observation edges (`/links`, module supports).
pub const MODULE_OBSERVATION_EDGES: EdgeTable = EdgeTable {
    table: "mod_obs_rel",
    id_column: "mod_obs_id",
    left_column: "module_id",
    right_column: "observation_id",
    left_table: "module",
    right_table: "observation",
};

/// PostgreSQL implementation of the relation engine for one edge table.
#[derive(Clone)]
pub struct PgRelationRepository {
    pool: PgPool,
    edges: EdgeTable,
}

impl PgRelationRepository {
    /// Create a repository over the given edge table.
    pub fn new(pool: PgPool, edges: EdgeTable) -> Self {
        Self { pool, edges }
    }

    /// Atomic find-or-create-or-update on the (left, right) pair.
    ///
    /// A `NULL` bound weight means "default to 1 on create, keep the
    /// stored weight on update", which is what the bulk merge needs.
    async fn upsert_inner(
        &self,
        left_id: i64,
        right_id: i64,
        weight: Option<i32>,
    ) -> Result<UpsertOutcome> {
        crate::ensure_exists(&self.pool, self.edges.left_table, left_id).await?;
        crate::ensure_exists(&self.pool, self.edges.right_table, right_id).await?;

        let sql = format!(
            "INSERT INTO {table} ({left}, {right}, weight) \
             VALUES ($1, $2, COALESCE($3, 1)) \
             ON CONFLICT ({left}, {right}) \
             DO UPDATE SET weight = COALESCE($3, {table}.weight) \
             RETURNING {id}, weight, (xmax = 0) AS inserted",
            table = self.edges.table,
            left = self.edges.left_column,
            right = self.edges.right_column,
            id = self.edges.id_column,
        );

        let row = sqlx::query(&sql)
            .bind(left_id)
            .bind(right_id)
            .bind(weight)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;

        let created: bool = row.get("inserted");
        let edge = Edge {
            id: row.get(self.edges.id_column),
            left_id,
            right_id,
            weight: row.get("weight"),
        };

        debug!(
            subsystem = "db",
            component = "relations",
            op = "upsert",
            db_table = self.edges.table,
            edge_id = edge.id,
            created,
            "Edge upserted"
        );

        Ok(UpsertOutcome { edge, created })
    }

    fn edge_from_row(&self, row: &sqlx::postgres::PgRow) -> Edge {
        Edge {
            id: row.get(self.edges.id_column),
            left_id: row.get(self.edges.left_column),
            right_id: row.get(self.edges.right_column),
            weight: row.get("weight"),
        }
    }
}

#[async_trait]
impl RelationRepository for PgRelationRepository {
    async fn upsert(&self, left_id: i64, right_id: i64, weight: i32) -> Result<UpsertOutcome> {
        self.upsert_inner(left_id, right_id, Some(weight)).await
    }

    async fn merge_support_set(
        &self,
        anchor: Side,
        anchor_id: i64,
        items: &[SupportItem],
    ) -> Result<Vec<UpsertOutcome>> {
        let mut outcomes = Vec::with_capacity(items.len());
        for item in items {
            let (left_id, right_id) = match anchor {
                Side::Left => (anchor_id, item.other_id),
                Side::Right => (item.other_id, anchor_id),
            };
            outcomes.push(self.upsert_inner(left_id, right_id, item.weight).await?);
        }
        Ok(outcomes)
    }

    async fn get(&self, edge_id: i64) -> Result<Option<Edge>> {
        let sql = format!(
            "SELECT {id}, {left}, {right}, weight FROM {table} WHERE {id} = $1",
            table = self.edges.table,
            id = self.edges.id_column,
            left = self.edges.left_column,
            right = self.edges.right_column,
        );
        let row = sqlx::query(&sql)
            .bind(edge_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.map(|r| self.edge_from_row(&r)))
    }

    async fn list(&self, filter: EdgeFilter) -> Result<Vec<Edge>> {
        let base = format!(
            "SELECT {id}, {left}, {right}, weight FROM {table}",
            table = self.edges.table,
            id = self.edges.id_column,
            left = self.edges.left_column,
            right = self.edges.right_column,
        );
        let order = format!(" ORDER BY {}", self.edges.id_column);

        let rows = match (filter.left_id, filter.right_id) {
            (None, None) => {
                sqlx::query(&format!("{}{}", base, order))
                    .fetch_all(&self.pool)
                    .await
            }
            (Some(left), None) => {
                let sql = format!("{} WHERE {} = $1{}", base, self.edges.left_column, order);
                sqlx::query(&sql).bind(left).fetch_all(&self.pool).await
            }
            (None, Some(right)) => {
                let sql = format!("{} WHERE {} = $1{}", base, self.edges.right_column, order);
                sqlx::query(&sql).bind(right).fetch_all(&self.pool).await
            }
            (Some(left), Some(right)) => {
                let sql = format!(
                    "{} WHERE {} = $1 AND {} = $2{}",
                    base, self.edges.left_column, self.edges.right_column, order
                );
                sqlx::query(&sql)
                    .bind(left)
                    .bind(right)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(Error::Database)?;

        Ok(rows.iter().map(|r| self.edge_from_row(r)).collect())
    }

    async fn delete(&self, edge_id: i64) -> Result<()> {
        let sql = format!(
            "DELETE FROM {table} WHERE {id} = $1",
            table = self.edges.table,
            id = self.edges.id_column,
        );
        let result = sqlx::query(&sql)
            .bind(edge_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!(
                "{} {} not found",
                self.edges.table, edge_id
            )));
        }
        Ok(())
    }

    async fn delete_all_for(&self, anchor: Side, anchor_id: i64) -> Result<u64> {
        let column = self.edges.column_for(anchor);
        let sql = format!(
            "DELETE FROM {table} WHERE {column} = $1",
            table = self.edges.table,
            column = column,
        );
        let result = sqlx::query(&sql)
            .bind(anchor_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "relations",
            op = "delete_all_for",
            db_table = self.edges.table,
            anchor_column = column,
            anchor_id,
            result_count = result.rows_affected(),
            "Edges cleared for anchor"
        );

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_tables_reference_distinct_columns() {
        for edges in [ATTRIBUTE_OBJECTIVE_EDGES, MODULE_OBSERVATION_EDGES] {
            assert_ne!(edges.left_column, edges.right_column);
            assert_ne!(edges.left_table, edges.right_table);
        }
    }

    #[test]
    fn test_column_for_side() {
        let edges = ATTRIBUTE_OBJECTIVE_EDGES;
        assert_eq!(edges.column_for(Side::Left), "attribute_id");
        assert_eq!(edges.column_for(Side::Right), "objective_id");
    }
}
