//! File storage for uploaded materials.
//!
//! Uploads are kept on the local filesystem under a base directory, laid
//! out as `{module}/{tag}/{filename}`. All three segments are sanitized
//! before touching the filesystem, so a stored relative path can never
//! escape the base directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info};

use curricula_core::{defaults::ALLOWED_EXTENSIONS, Error, Result};

/// Abstraction over upload storage. Paths are relative to the store's
/// base; callers persist them in material rows.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Write `bytes` at `relative_path`, creating parent directories.
    async fn save(&self, relative_path: &str, bytes: &[u8]) -> Result<()>;

    /// Read the full contents at `relative_path`.
    async fn read(&self, relative_path: &str) -> Result<Vec<u8>>;

    /// Remove the file at `relative_path`. Missing files are an error.
    async fn remove(&self, relative_path: &str) -> Result<()>;
}

/// Filesystem-backed store rooted at one directory.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    base_dir: PathBuf,
}

impl LocalFileStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolve a relative path against the base, rejecting traversal.
    fn resolve(&self, relative_path: &str) -> Result<PathBuf> {
        let rel = Path::new(relative_path);
        if rel.is_absolute()
            || rel
                .components()
                .any(|c| !matches!(c, std::path::Component::Normal(_)))
        {
            return Err(Error::Storage(format!(
                "invalid storage path: {}",
                relative_path
            )));
        }
        Ok(self.base_dir.join(rel))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn save(&self, relative_path: &str, bytes: &[u8]) -> Result<()> {
        let path = self.resolve(relative_path)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, bytes).await?;

        info!(
            subsystem = "db",
            component = "file_store",
            op = "save",
            path = relative_path,
            bytes = bytes.len(),
            "File written"
        );
        Ok(())
    }

    async fn read(&self, relative_path: &str) -> Result<Vec<u8>> {
        let path = self.resolve(relative_path)?;
        let bytes = fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(format!("file {} not found", relative_path))
            } else {
                Error::Io(e)
            }
        })?;

        debug!(
            subsystem = "db",
            component = "file_store",
            op = "read",
            path = relative_path,
            bytes = bytes.len(),
            "File read"
        );
        Ok(bytes)
    }

    async fn remove(&self, relative_path: &str) -> Result<()> {
        let path = self.resolve(relative_path)?;
        fs::remove_file(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(format!("file {} not found", relative_path))
            } else {
                Error::Io(e)
            }
        })?;

        info!(
            subsystem = "db",
            component = "file_store",
            op = "remove",
            path = relative_path,
            "File removed"
        );
        Ok(())
    }
}

/// Reduce a user-supplied name to a single safe path segment. Keeps
/// alphanumerics, dash, underscore, and dot; everything else becomes an
/// underscore. Leading dots are stripped so a segment cannot be hidden
/// or read as `..`.
pub fn sanitize_segment(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.').to_string();
    if trimmed.is_empty() {
        "unnamed".to_string()
    } else {
        trimmed
    }
}

/// Check the upload's extension against the allow list.
pub fn validate_extension(filename: &str) -> Result<()> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(Error::Validation(format!(
            "file type not allowed: {}",
            filename
        ))),
    }
}

/// Build the relative storage path for a material upload.
pub fn material_storage_path(module_name: &str, tag_name: &str, filename: &str) -> String {
    format!(
        "{}/{}/{}",
        sanitize_segment(module_name),
        sanitize_segment(tag_name),
        sanitize_segment(filename)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_segment_replaces_separators() {
        assert_eq!(sanitize_segment("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_segment("notes 2024.pdf"), "notes_2024.pdf");
    }

    #[test]
    fn test_sanitize_segment_strips_leading_dots() {
        assert_eq!(sanitize_segment("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(sanitize_segment(".."), "unnamed");
        assert_eq!(sanitize_segment(".hidden"), "hidden");
    }

    #[test]
    fn test_sanitize_segment_empty_becomes_unnamed() {
        assert_eq!(sanitize_segment(""), "unnamed");
        assert_eq!(sanitize_segment("///"), "unnamed");
    }

    #[test]
    fn test_validate_extension_allow_list() {
        assert!(validate_extension("syllabus.pdf").is_ok());
        assert!(validate_extension("SLIDES.DOCX").is_ok());
        assert!(validate_extension("payload.exe").is_err());
        assert!(validate_extension("no_extension").is_err());
    }

    #[test]
    fn test_material_storage_path_layout() {
        let path = material_storage_path("Algorithms I", "week 1", "intro.pdf");
        assert_eq!(path, "Algorithms_I/week_1/intro.pdf");
    }

    #[tokio::test]
    async fn test_local_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path());

        store.save("m/t/file.txt", b"hello").await.unwrap();
        let bytes = store.read("m/t/file.txt").await.unwrap();
        assert_eq!(bytes, b"hello");

        store.remove("m/t/file.txt").await.unwrap();
        assert!(matches!(
            store.read("m/t/file.txt").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_local_store_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path());

        assert!(store.read("../outside.txt").await.is_err());
        assert!(store.save("/abs/path.txt", b"x").await.is_err());
    }
}
