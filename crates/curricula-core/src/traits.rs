//! Repository traits for the seams other crates depend on.
//!
//! Only the repositories consumed across crate boundaries (auth
//! middleware, relation engine, notification worker) are trait-backed;
//! the remaining entity repositories are concrete types in curricula-db.

use async_trait::async_trait;

use crate::auth::Role;
use crate::error::Result;
use crate::models::{Edge, EdgeFilter, Side, SupportItem, UpsertOutcome, User};

/// Credential store: persists user records and resolves them for auth.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user with an already-hashed password.
    async fn create(&self, username: &str, password_hash: &str, role: Role) -> Result<User>;

    /// Look up a user by id. `Ok(None)` when absent.
    async fn get(&self, user_id: i64) -> Result<Option<User>>;

    /// Look up a user by username. Returns the first match; usernames are
    /// unique in practice but not enforced by the schema.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Overwrite the stored password hash.
    async fn set_password_hash(&self, user_id: i64, password_hash: &str) -> Result<()>;
}

/// Weighted many-to-many relation store, generic over an edge table.
#[async_trait]
pub trait RelationRepository: Send + Sync {
    /// Atomically create the (left, right) edge or overwrite its weight.
    /// Both ids are validated against their referenced tables first.
    async fn upsert(&self, left_id: i64, right_id: i64, weight: i32) -> Result<UpsertOutcome>;

    /// Per-item upsert anchored on one side. Additive: edges for ids
    /// omitted from `items` are left in place.
    async fn merge_support_set(
        &self,
        anchor: Side,
        anchor_id: i64,
        items: &[SupportItem],
    ) -> Result<Vec<UpsertOutcome>>;

    /// Fetch one edge by id.
    async fn get(&self, edge_id: i64) -> Result<Option<Edge>>;

    /// List edges matching the AND-combined filter, ordered by id.
    async fn list(&self, filter: EdgeFilter) -> Result<Vec<Edge>>;

    /// Delete one edge; `NotFound` if it does not exist.
    async fn delete(&self, edge_id: i64) -> Result<()>;

    /// Delete every edge anchored on one side. Deleting from an anchor
    /// with no edges is a no-op success; returns the number removed.
    async fn delete_all_for(&self, anchor: Side, anchor_id: i64) -> Result<u64>;
}

/// Sink for persisted notifications (used by the background worker).
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Persist a notification targeting `user_id`.
    async fn deliver(&self, user_id: i64, message: &str) -> Result<i64>;
}
