//! Local preview files for queued uploads
//!
//! Each accepted file gets a copy under `<root>/previews/` so the console can show a
//! thumbnail before upload. The copy is a leak unless revoked: callers revoke it when
//! the owning item is removed or cleared.

use std::path::{Path, PathBuf};

use crate::models::UploadItem;

#[derive(Debug, Clone)]
pub struct PreviewStore {
    dir: PathBuf,
}

impl PreviewStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the item's bytes to a preview file and return its path
    pub async fn create(&self, item: &UploadItem) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(sanitize(&item.id));
        tokio::fs::write(&path, &item.data).await?;
        Ok(path)
    }

    /// Delete a preview file; a file that is already gone is not an error
    pub async fn revoke(&self, path: &Path) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => tracing::debug!(path = %path.display(), "Preview revoked"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to revoke preview"),
        }
    }
}

/// Keep preview names inside the preview directory
fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CandidateFile;

    #[tokio::test]
    async fn test_create_then_revoke() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = PreviewStore::new(temp_dir.path().join("previews"));
        let item = UploadItem::queued(CandidateFile {
            file_name: "../../etc/tree.png".to_string(),
            mime_type: "image/png".to_string(),
            data: vec![1, 2, 3],
        });

        let path = store.create(&item).await.unwrap();
        assert!(path.starts_with(store.dir()));
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);

        store.revoke(&path).await;
        assert!(!path.exists());

        // Second revoke is a no-op
        store.revoke(&path).await;
    }

    #[test]
    fn test_sanitize_strips_separators() {
        assert_eq!(sanitize("a/b\\c d.png"), "a_b_c_d.png");
    }
}
