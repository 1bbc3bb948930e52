//! Demo `StoragePort`: one directory per job, JSON-per-record on disk,
//! serialize-write-done with no intermediate buffering.

use crate::domain::{JobRecord, RewrittenFile, ScreenshotOutcome};
use crate::error::PipelineError;
use crate::ports::StoragePort;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub struct FileStorage {
    root: PathBuf,
}

/// Input file names are caller-supplied; strip path separators before
/// using one as a component of an output path.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect()
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn job_dir(&self, job_id: &str) -> PathBuf {
        self.root.join(job_id)
    }

    async fn write_json<T: serde::Serialize + Sync>(
        path: PathBuf,
        value: &T,
    ) -> Result<(), PipelineError> {
        let body = serde_json::to_vec_pretty(value)
            .map_err(|e| PipelineError::Storage(format!("serializing {}: {e}", path.display())))?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PipelineError::Storage(format!("creating {}: {e}", parent.display())))?;
        }
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| PipelineError::Storage(format!("writing {}: {e}", path.display())))
    }

    async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, PipelineError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| PipelineError::Storage(format!("parsing {}: {e}", path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PipelineError::Storage(format!("reading {}: {e}", path.display()))),
        }
    }
}

#[async_trait]
impl StoragePort for FileStorage {
    async fn save_job(&self, record: &JobRecord) -> Result<(), PipelineError> {
        Self::write_json(self.job_dir(&record.id).join("job.json"), record).await
    }

    async fn save_screenshot_outcomes(
        &self,
        job_id: &str,
        outcomes: &[ScreenshotOutcome],
    ) -> Result<(), PipelineError> {
        Self::write_json(self.job_dir(job_id).join("screenshots.json"), &outcomes.to_vec()).await
    }

    async fn save_rewritten_files(
        &self,
        job_id: &str,
        files: &[RewrittenFile],
    ) -> Result<(), PipelineError> {
        let dir = self.job_dir(job_id).join("files");
        for file in files {
            let path = dir.join(format!("{}.json", sanitize(&file.name)));
            Self::write_json(path, file).await?;
        }
        Ok(())
    }

    async fn load_job(&self, job_id: &str) -> Result<Option<JobRecord>, PipelineError> {
        Self::read_json(&self.job_dir(job_id).join("job.json")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Tier;
    use crate::domain::JobStage;

    fn sample(id: &str) -> JobRecord {
        JobRecord {
            id: id.to_string(),
            tier: Tier::Restricted,
            stage: JobStage::Completed,
            hand_count: 1,
            screenshot_count: 1,
            match_count: 1,
            unmatched_count: 0,
            error_kinds: vec![],
        }
    }

    #[tokio::test]
    async fn round_trips_a_job_record_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let record = sample("job-1");
        storage.save_job(&record).await.unwrap();
        let loaded = storage.load_job("job-1").await.unwrap();
        assert_eq!(loaded.unwrap().id, "job-1");
    }

    #[tokio::test]
    async fn load_job_returns_none_for_an_unknown_job() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert!(storage.load_job("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_rewritten_files_writes_one_file_per_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let files = vec![RewrittenFile {
            name: "session.txt".into(),
            hand_ids: vec!["100".into()],
            text: "Hand #100".into(),
            classification: crate::domain::Classification::Clean,
        }];
        storage.save_rewritten_files("job-1", &files).await.unwrap();
        assert!(dir.path().join("job-1/files/session.txt.json").exists());
    }
}
