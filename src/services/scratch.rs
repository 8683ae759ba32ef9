use crate::models::UploadedFile;
use crate::services::error::ConvertError;
use crate::utils::validation::sanitize_filename;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Request-scoped scratch directory. Removed from disk when dropped.
pub struct ScratchArena {
    dir: TempDir,
}

impl ScratchArena {
    pub fn create(base: &Path, request_id: &str) -> Result<Self, ConvertError> {
        let prefix: String = request_id
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
            .take(36)
            .collect();

        let dir = tempfile::Builder::new()
            .prefix(&format!("convert-{}-", prefix))
            .tempdir_in(base)
            .map_err(|source| ConvertError::Scratch {
                file: base.display().to_string(),
                source,
            })?;

        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `file` into the arena and read it back, so parsing runs on the persisted copy.
    /// The index prefix keeps duplicate client filenames apart.
    pub async fn persist(&self, index: usize, file: UploadedFile) -> Result<UploadedFile, ConvertError> {
        let path = self.slot(index, &file.filename);
        let scratch_err = |source: std::io::Error| ConvertError::Scratch {
            file: file.filename.clone(),
            source,
        };

        tokio::fs::write(&path, &file.data).await.map_err(scratch_err)?;
        let data = tokio::fs::read(&path).await.map_err(scratch_err)?;

        tracing::debug!(path = %path.display(), bytes = data.len(), "upload persisted to scratch");
        Ok(UploadedFile::new(file.filename, data))
    }

    fn slot(&self, index: usize, filename: &str) -> PathBuf {
        let name = sanitize_filename(filename).unwrap_or_else(|_| "upload".to_string());
        self.dir.path().join(format!("{:03}_{}", index, name))
    }
}
