//! # curricula-db
//!
//! PostgreSQL database layer for curricula.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for all core entities
//! - The weighted relation engine over both edge tables
//! - Local filesystem storage for material uploads
//!
//! ## Example
//!
//! ```rust,ignore
//! use curricula_db::Database;
//! use curricula_core::CreateProgramRequest;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/curricula").await?;
//!
//!     let program = db.programs.create(&CreateProgramRequest {
//!         name: "Software Engineering".to_string(),
//!         description: None,
//!         version: Some("2026".to_string()),
//!     }).await?;
//!
//!     println!("Created program: {}", program.program_id);
//!     Ok(())
//! }
//! ```

pub mod attributes;
pub mod comments;
pub mod file_store;
pub mod materials;
pub mod modules;
pub mod notifications;
pub mod objectives;
pub mod observations;
pub mod pool;
pub mod programs;
pub mod relations;
pub mod tags;
pub mod users;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use curricula_core::*;

use sqlx::{PgPool, Row};

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Check that `id` exists in `table`, whose primary key column is
/// `{table}_id`. Only called with static table names from this crate.
/// A missing row is an `InvalidReference`: the id arrived as a
/// foreign-key field of a write.
pub(crate) async fn ensure_exists(pool: &PgPool, table: &'static str, id: i64) -> Result<()> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {table} WHERE {table}_id = $1)",
        table = table
    );
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(Error::Database)?;
    let exists: bool = row.get(0);

    if exists {
        Ok(())
    } else {
        Err(Error::InvalidReference(format!(
            "{} {} does not exist",
            table, id
        )))
    }
}

// Re-export repository implementations
pub use attributes::{AttributeFilter, PgAttributeRepository};
pub use comments::{CommentFilter, PgCommentRepository};
pub use file_store::{
    material_storage_path, sanitize_segment, validate_extension, FileStore, LocalFileStore,
};
pub use materials::{MaterialFilter, MaterialUpdate, NewMaterial, PgMaterialRepository};
pub use modules::{ModuleFilter, PgModuleRepository};
pub use notifications::{NotificationFilter, PgNotificationRepository};
pub use objectives::{ObjectiveFilter, PgObjectiveRepository};
pub use observations::{ObservationFilter, PgObservationRepository};
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use programs::{PgProgramRepository, ProgramFilter};
pub use relations::{
    EdgeTable, PgRelationRepository, ATTRIBUTE_OBJECTIVE_EDGES, MODULE_OBSERVATION_EDGES,
};
pub use tags::{PgTagRepository, TagFilter};
pub use users::{PgUserRepository, UserFilter};

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: PgPool,
    /// User account repository.
    pub users: PgUserRepository,
    /// Program repository.
    pub programs: PgProgramRepository,
    /// Graduate attribute repository.
    pub attributes: PgAttributeRepository,
    /// Learning objective repository.
    pub objectives: PgObjectiveRepository,
    /// Observable outcome repository.
    pub observations: PgObservationRepository,
    /// Curriculum module repository.
    pub modules: PgModuleRepository,
    /// Attribute↔objective relation engine.
    pub relations: PgRelationRepository,
    /// Module↔observation relation engine.
    pub links: PgRelationRepository,
    /// Tag repository.
    pub tags: PgTagRepository,
    /// Material metadata repository.
    pub materials: PgMaterialRepository,
    /// Comment repository.
    pub comments: PgCommentRepository,
    /// Notification repository.
    pub notifications: PgNotificationRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: PgUserRepository::new(pool.clone()),
            programs: PgProgramRepository::new(pool.clone()),
            attributes: PgAttributeRepository::new(pool.clone()),
            objectives: PgObjectiveRepository::new(pool.clone()),
            observations: PgObservationRepository::new(pool.clone()),
            modules: PgModuleRepository::new(pool.clone()),
            relations: PgRelationRepository::new(pool.clone(), ATTRIBUTE_OBJECTIVE_EDGES),
            links: PgRelationRepository::new(pool.clone(), MODULE_OBSERVATION_EDGES),
            tags: PgTagRepository::new(pool.clone()),
            materials: PgMaterialRepository::new(pool.clone()),
            comments: PgCommentRepository::new(pool.clone()),
            notifications: PgNotificationRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn test_escape_like_escapes_wildcards() {
        assert_eq!(escape_like("50%"), "50\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }
}
