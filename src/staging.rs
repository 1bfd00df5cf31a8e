use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use uuid::Uuid;

/// A uniquely named local file that is removed when dropped.
///
/// Handlers stage generated audio here before upload; the file goes away on
/// every return path, including after a successful upload.
#[derive(Debug)]
pub struct StagedFile {
    id: String,
    path: PathBuf,
}

impl StagedFile {
    /// Reserve `<dir>/<uuid>.<extension>`. Nothing is created on disk yet.
    pub fn new(dir: &Path, extension: &str) -> Self {
        let id = Uuid::new_v4().to_string();
        let path = dir.join(format!("{}.{}", id, extension));
        Self { id, path }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!("Removed staged file {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                "Failed to remove staged file {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_file_after_id() {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagedFile::new(dir.path(), "wav");

        assert_eq!(
            staged.path().file_name().unwrap().to_str().unwrap(),
            format!("{}.wav", staged.id())
        );
        assert!(Uuid::parse_str(staged.id()).is_ok());
    }

    #[test]
    fn ids_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let a = StagedFile::new(dir.path(), "wav");
        let b = StagedFile::new(dir.path(), "wav");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn removes_file_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let staged = StagedFile::new(dir.path(), "wav");
            std::fs::write(staged.path(), b"RIFF").unwrap();
            assert!(staged.path().exists());
            staged.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn drop_without_file_is_quiet() {
        let dir = tempfile::tempdir().unwrap();
        drop(StagedFile::new(dir.path(), "wav"));
    }
}
