//! Central defaults for curricula.
//!
//! Every tunable the binaries read from the environment has its fallback
//! value here, so the effective configuration is auditable in one place.

/// Default token time-to-live in seconds (24 hours).
pub const TOKEN_TTL_SECS: i64 = 86_400;

/// Default weight for a relation edge when the request omits one.
pub const RELATION_WEIGHT: i32 = 1;

/// Default HTTP bind host.
pub const HTTP_HOST: &str = "0.0.0.0";

/// Default HTTP bind port.
pub const HTTP_PORT: u16 = 3000;

/// Default database URL.
pub const DATABASE_URL: &str = "postgres://localhost/curricula";

/// Default base directory for uploaded material files.
pub const UPLOAD_DIR: &str = "uploads";

/// Maximum request body size in bytes (32 MB, covers material uploads).
pub const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Capacity of the in-process notification queue.
pub const NOTIFICATION_QUEUE_CAPACITY: usize = 256;

/// File extensions accepted for material uploads.
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "txt", "pdf", "png", "jpg", "jpeg", "gif", "docx", "doc", "xlsx", "xls",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_ttl_is_a_day() {
        assert_eq!(TOKEN_TTL_SECS, 24 * 60 * 60);
    }

    #[test]
    fn test_allowed_extensions_are_lowercase() {
        for ext in ALLOWED_EXTENSIONS {
            assert_eq!(*ext, ext.to_lowercase());
        }
    }
}
