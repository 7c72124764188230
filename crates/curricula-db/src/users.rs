//! User account storage.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::info;

use curricula_core::{Error, Result, Role, User, UserRepository};

use crate::escape_like;

/// Optional filters for listing users. Filters AND together.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Case-insensitive substring match on username.
    pub username: Option<String>,
    /// Exact role match.
    pub role: Option<Role>,
}

/// PostgreSQL implementation of user storage.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn user_from_row(row: &sqlx::postgres::PgRow) -> Result<User> {
        let role_str: String = row.get("role");
        let role = role_str
            .parse::<Role>()
            .map_err(|e| Error::Internal(format!("invalid role in app_user row: {}", e)))?;
        Ok(User {
            user_id: row.get("user_id"),
            username: row.get("username"),
            password_hash: row.get("password_hash"),
            role,
        })
    }

    /// List users, optionally filtered.
    pub async fn list(&self, filter: UserFilter) -> Result<Vec<User>> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, username, password_hash, role
            FROM app_user
            WHERE ($1::TEXT IS NULL OR username ILIKE $1)
              AND ($2::TEXT IS NULL OR role = $2)
            ORDER BY user_id
            "#,
        )
        .bind(
            filter
                .username
                .as_deref()
                .map(|n| format!("%{}%", escape_like(n))),
        )
        .bind(filter.role.map(|r| r.as_str().to_string()))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(Self::user_from_row).collect()
    }

    /// Update username and/or role; absent fields keep current values.
    pub async fn update(
        &self,
        user_id: i64,
        username: Option<&str>,
        role: Option<Role>,
    ) -> Result<User> {
        let row = sqlx::query(
            r#"
            UPDATE app_user
            SET username = COALESCE($2, username),
                role = COALESCE($3, role)
            WHERE user_id = $1
            RETURNING user_id, username, password_hash, role
            "#,
        )
        .bind(user_id)
        .bind(username)
        .bind(role.map(|r| r.as_str().to_string()))
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        match row {
            Some(row) => Self::user_from_row(&row),
            None => Err(Error::NotFound(format!("user {} not found", user_id))),
        }
    }

    /// Delete a user account.
    pub async fn delete(&self, user_id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM app_user WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("user {} not found", user_id)));
        }

        info!(
            subsystem = "db",
            component = "users",
            op = "delete",
            user_id,
            "User deleted"
        );
        Ok(())
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, username: &str, password_hash: &str, role: Role) -> Result<User> {
        let row = sqlx::query(
            r#"
            INSERT INTO app_user (username, password_hash, role)
            VALUES ($1, $2, $3)
            RETURNING user_id, username, password_hash, role
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        let user = Self::user_from_row(&row)?;

        info!(
            subsystem = "db",
            component = "users",
            op = "create",
            user_id = user.user_id,
            role = role.as_str(),
            "User created"
        );
        Ok(user)
    }

    async fn get(&self, user_id: i64) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT user_id, username, password_hash, role FROM app_user WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref().map(Self::user_from_row).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT user_id, username, password_hash, role
            FROM app_user
            WHERE username = $1
            ORDER BY user_id
            LIMIT 1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref().map(Self::user_from_row).transpose()
    }

    async fn set_password_hash(&self, user_id: i64, password_hash: &str) -> Result<()> {
        let result = sqlx::query("UPDATE app_user SET password_hash = $2 WHERE user_id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("user {} not found", user_id)));
        }
        Ok(())
    }
}
