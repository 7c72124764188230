//! Structured logging field name constants.
//!
//! All crates use these constants for consistent structured logging, so
//! log aggregation tools can query by standardized field names across
//! every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |

/// Subsystem originating the log event.
/// Values: "api", "db", "jobs", "storage"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "pool", "relations", "notification_worker"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "upsert", "list", "enqueue"
pub const OPERATION: &str = "op";

/// Id of the authenticated user making the request.
pub const USER_ID: &str = "user_id";

/// Database table or entity affected.
pub const DB_TABLE: &str = "db_table";

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of rows returned or affected.
pub const RESULT_COUNT: &str = "result_count";

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
