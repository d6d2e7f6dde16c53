//! Staging-directory file operations
//!
//! The typed file-operation capability behind Extract and Archive:
//! resolving staged paths, loosening permissions for the loader, and
//! relocating consumed files to the archive directory. Replaces the
//! original pipeline's shell bodies (`chmod`, `mv`) with operations that
//! are testable against a temp directory.

use crate::domain::errors::PipelineError;
use crate::domain::result::Result;
use std::path::{Path, PathBuf};

/// Intake and archive directories for one run
#[derive(Debug, Clone)]
pub struct StagingArea {
    intake_dir: PathBuf,
    archive_dir: PathBuf,
}

impl StagingArea {
    pub fn new(intake_dir: impl Into<PathBuf>, archive_dir: impl Into<PathBuf>) -> Self {
        Self {
            intake_dir: intake_dir.into(),
            archive_dir: archive_dir.into(),
        }
    }

    /// Creates the intake and archive directories if absent
    pub async fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.intake_dir, &self.archive_dir] {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                PipelineError::Staging(format!(
                    "Failed to create directory {}: {e}",
                    dir.display()
                ))
            })?;
        }
        Ok(())
    }

    /// Path a staged file of the given name lives at
    pub fn staged_path(&self, filename: &str) -> PathBuf {
        self.intake_dir.join(filename)
    }

    /// Grants read permission to the loading process (mode 0644)
    ///
    /// No-op on non-unix targets.
    pub async fn make_loader_readable(&self, path: &Path) -> Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o644);
            tokio::fs::set_permissions(path, permissions)
                .await
                .map_err(|e| {
                    PipelineError::Staging(format!(
                        "Failed to set permissions on {}: {e}",
                        path.display()
                    ))
                })?;
        }
        #[cfg(not(unix))]
        {
            let _ = path;
        }
        Ok(())
    }

    /// Relocates a staged file to the archive directory
    ///
    /// The file keeps its name; an archived file of the same name from an
    /// earlier run is replaced. Falls back to copy-and-remove when the
    /// archive directory sits on a different filesystem.
    pub async fn archive(&self, path: &Path) -> Result<PathBuf> {
        let filename = path.file_name().ok_or_else(|| {
            PipelineError::Staging(format!("Not a file path: {}", path.display()))
        })?;
        let target = self.archive_dir.join(filename);

        match tokio::fs::rename(path, &target).await {
            Ok(()) => {}
            Err(rename_err) => {
                // EXDEV: archive lives on another device.
                tokio::fs::copy(path, &target).await.map_err(|e| {
                    PipelineError::Staging(format!(
                        "Failed to archive {} to {}: rename: {rename_err}, copy: {e}",
                        path.display(),
                        target.display()
                    ))
                })?;
                tokio::fs::remove_file(path).await.map_err(|e| {
                    PipelineError::Staging(format!(
                        "Archived copy of {} succeeded but removal failed: {e}",
                        path.display()
                    ))
                })?;
            }
        }

        tracing::info!(
            from = %path.display(),
            to = %target.display(),
            "Staged file archived"
        );

        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staging(dir: &tempfile::TempDir) -> StagingArea {
        StagingArea::new(dir.path().join("intake"), dir.path().join("archive"))
    }

    #[tokio::test]
    async fn test_ensure_directories_creates_both() {
        let dir = tempfile::tempdir().unwrap();
        let area = staging(&dir);
        area.ensure_directories().await.unwrap();
        assert!(dir.path().join("intake").is_dir());
        assert!(dir.path().join("archive").is_dir());
    }

    #[tokio::test]
    async fn test_staged_path_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let area = staging(&dir);
        assert_eq!(
            area.staged_path("orders.csv"),
            dir.path().join("intake").join("orders.csv")
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_make_loader_readable_sets_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let area = staging(&dir);
        area.ensure_directories().await.unwrap();
        let path = area.staged_path("customers.csv");
        tokio::fs::write(&path, "data").await.unwrap();

        area.make_loader_readable(&path).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[tokio::test]
    async fn test_archive_moves_file_out_of_intake() {
        let dir = tempfile::tempdir().unwrap();
        let area = staging(&dir);
        area.ensure_directories().await.unwrap();
        let staged = area.staged_path("orders.csv");
        tokio::fs::write(&staged, "rows").await.unwrap();

        let archived = area.archive(&staged).await.unwrap();

        assert!(!staged.exists());
        assert_eq!(archived, dir.path().join("archive").join("orders.csv"));
        assert_eq!(std::fs::read_to_string(archived).unwrap(), "rows");
    }

    #[tokio::test]
    async fn test_archive_replaces_same_name() {
        let dir = tempfile::tempdir().unwrap();
        let area = staging(&dir);
        area.ensure_directories().await.unwrap();
        tokio::fs::write(dir.path().join("archive").join("orders.csv"), "old")
            .await
            .unwrap();
        let staged = area.staged_path("orders.csv");
        tokio::fs::write(&staged, "new").await.unwrap();

        let archived = area.archive(&staged).await.unwrap();

        assert_eq!(std::fs::read_to_string(archived).unwrap(), "new");
    }

    #[tokio::test]
    async fn test_archive_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let area = staging(&dir);
        area.ensure_directories().await.unwrap();

        let result = area.archive(&area.staged_path("ghost.csv")).await;
        assert!(result.is_err());
    }
}
