//! Notification storage.
//!
//! Rows land here through two paths: the admin CRUD surface, and the
//! background worker draining the in-process queue. Both go through the
//! same repository; the worker uses it via [`NotificationSink`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::info;

use curricula_core::{Error, Notification, NotificationSink, Result};

use crate::{ensure_exists, escape_like};

/// Optional filters for listing notifications. Filters AND together.
#[derive(Debug, Clone, Default)]
pub struct NotificationFilter {
    /// Case-insensitive substring match on message.
    pub message: Option<String>,
    pub user_id: Option<i64>,
    pub created_before: Option<DateTime<Utc>>,
    pub created_after: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn from_row(row: &sqlx::postgres::PgRow) -> Notification {
        Notification {
            notification_id: row.get("notification_id"),
            message: row.get("message"),
            created_at: row.get("created_at"),
            user_id: row.get("user_id"),
        }
    }

    pub async fn create(&self, message: &str, user_id: i64) -> Result<Notification> {
        if message.trim().is_empty() {
            return Err(Error::Validation(
                "notification message must not be empty".into(),
            ));
        }
        ensure_exists(&self.pool, "app_user", user_id).await?;

        let row = sqlx::query(
            r#"
            INSERT INTO notification (message, user_id)
            VALUES ($1, $2)
            RETURNING notification_id, message, created_at, user_id
            "#,
        )
        .bind(message)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        let notification = Self::from_row(&row);

        info!(
            subsystem = "db",
            component = "notifications",
            op = "create",
            notification_id = notification.notification_id,
            user_id,
            "Notification created"
        );
        Ok(notification)
    }

    pub async fn get(&self, notification_id: i64) -> Result<Option<Notification>> {
        let row = sqlx::query(
            "SELECT notification_id, message, created_at, user_id FROM notification WHERE notification_id = $1",
        )
        .bind(notification_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Self::from_row(&r)))
    }

    pub async fn list(&self, filter: NotificationFilter) -> Result<Vec<Notification>> {
        let rows = sqlx::query(
            r#"
            SELECT notification_id, message, created_at, user_id
            FROM notification
            WHERE ($1::TEXT IS NULL OR message ILIKE $1)
              AND ($2::BIGINT IS NULL OR user_id = $2)
              AND ($3::TIMESTAMPTZ IS NULL OR created_at < $3)
              AND ($4::TIMESTAMPTZ IS NULL OR created_at > $4)
            ORDER BY notification_id
            "#,
        )
        .bind(
            filter
                .message
                .as_deref()
                .map(|m| format!("%{}%", escape_like(m))),
        )
        .bind(filter.user_id)
        .bind(filter.created_before)
        .bind(filter.created_after)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(Self::from_row).collect())
    }

    /// Partial update; a supplied `user_id` is validated first.
    pub async fn update(
        &self,
        notification_id: i64,
        message: Option<&str>,
        user_id: Option<i64>,
    ) -> Result<Notification> {
        if let Some(message) = message {
            if message.trim().is_empty() {
                return Err(Error::Validation(
                    "notification message must not be empty".into(),
                ));
            }
        }
        if let Some(user_id) = user_id {
            ensure_exists(&self.pool, "app_user", user_id).await?;
        }

        let row = sqlx::query(
            r#"
            UPDATE notification
            SET message = COALESCE($2, message),
                user_id = COALESCE($3, user_id)
            WHERE notification_id = $1
            RETURNING notification_id, message, created_at, user_id
            "#,
        )
        .bind(notification_id)
        .bind(message)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(|r| Self::from_row(&r)).ok_or_else(|| {
            Error::NotFound(format!("notification {} not found", notification_id))
        })
    }

    pub async fn delete(&self, notification_id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM notification WHERE notification_id = $1")
            .bind(notification_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!(
                "notification {} not found",
                notification_id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for PgNotificationRepository {
    async fn deliver(&self, user_id: i64, message: &str) -> Result<i64> {
        let notification = self.create(message, user_id).await?;
        Ok(notification.notification_id)
    }
}
