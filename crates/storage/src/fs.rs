use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};

use quiz_core::model::{ReportId, ResultReport};

use crate::repository::{ReportRecord, ResultStore, StorageError};

/// Device-local result store: one JSON file per report.
///
/// The original client kept reports in browser `localStorage` under
/// `quiz_solution_{id}`; this store keeps the same key as the file name.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Create a store rooted at `dir`. The directory is created on first
    /// save if it does not exist.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &ReportId) -> PathBuf {
        self.dir.join(format!("quiz_solution_{id}.json"))
    }
}

#[async_trait]
impl ResultStore for JsonFileStore {
    async fn save(&self, report: &ResultReport) -> Result<ReportId, StorageError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;

        let id = ReportId::generate();
        let record = ReportRecord::from_report(report);
        let json = serde_json::to_vec_pretty(&record)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        tokio::fs::write(self.path_for(&id), json)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;
        Ok(id)
    }

    async fn load(&self, id: &ReportId) -> Result<ResultReport, StorageError> {
        let bytes = match tokio::fs::read(self.path_for(id)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound);
            }
            Err(e) => return Err(StorageError::Io(e.to_string())),
        };

        let record: ReportRecord = serde_json::from_slice(&bytes)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        record
            .into_report()
            .map_err(|e| StorageError::Serialization(e.to_string()))
    }
}
