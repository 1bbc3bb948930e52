//! External collaborators. Every OCR, storage, and validation dependency is
//! consolidated behind a trait here — no stage reaches past these traits
//! into a concrete transport.

use crate::domain::{JobRecord, OcrAOutcome, OcrBOutcome, RewrittenFile, Screenshot, ScreenshotOutcome};
use crate::error::PipelineError;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait OcrPort: Send + Sync {
    async fn extract_hand_id(&self, screenshot: &Screenshot) -> OcrAOutcome;
    async fn extract_players(&self, screenshot: &Screenshot) -> OcrBOutcome;
}

#[async_trait]
impl<T: OcrPort + ?Sized> OcrPort for Arc<T> {
    async fn extract_hand_id(&self, screenshot: &Screenshot) -> OcrAOutcome {
        self.as_ref().extract_hand_id(screenshot).await
    }
    async fn extract_players(&self, screenshot: &Screenshot) -> OcrBOutcome {
        self.as_ref().extract_players(screenshot).await
    }
}

#[async_trait]
pub trait StoragePort: Send + Sync {
    async fn save_job(&self, record: &JobRecord) -> Result<(), PipelineError>;
    async fn save_screenshot_outcomes(
        &self,
        job_id: &str,
        outcomes: &[ScreenshotOutcome],
    ) -> Result<(), PipelineError>;
    async fn save_rewritten_files(
        &self,
        job_id: &str,
        files: &[RewrittenFile],
    ) -> Result<(), PipelineError>;
    async fn load_job(&self, job_id: &str) -> Result<Option<JobRecord>, PipelineError>;
}

#[async_trait]
impl<T: StoragePort + ?Sized> StoragePort for Arc<T> {
    async fn save_job(&self, record: &JobRecord) -> Result<(), PipelineError> {
        self.as_ref().save_job(record).await
    }
    async fn save_screenshot_outcomes(
        &self,
        job_id: &str,
        outcomes: &[ScreenshotOutcome],
    ) -> Result<(), PipelineError> {
        self.as_ref().save_screenshot_outcomes(job_id, outcomes).await
    }
    async fn save_rewritten_files(
        &self,
        job_id: &str,
        files: &[RewrittenFile],
    ) -> Result<(), PipelineError> {
        self.as_ref().save_rewritten_files(job_id, files).await
    }
    async fn load_job(&self, job_id: &str) -> Result<Option<JobRecord>, PipelineError> {
        self.as_ref().load_job(job_id).await
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Ok,
    Violations(Vec<Violation>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub kind: String,
    pub detail: String,
}

#[async_trait]
pub trait ValidatorPort: Send + Sync {
    async fn validate(&self, rewritten_hand_text: &str) -> ValidationOutcome;
}

#[async_trait]
impl<T: ValidatorPort + ?Sized> ValidatorPort for Arc<T> {
    async fn validate(&self, rewritten_hand_text: &str) -> ValidationOutcome {
        self.as_ref().validate(rewritten_hand_text).await
    }
}

/// An unavailable validator is treated as `ok` for every hand.
pub struct NullValidator;

#[async_trait]
impl ValidatorPort for NullValidator {
    async fn validate(&self, _rewritten_hand_text: &str) -> ValidationOutcome {
        ValidationOutcome::Ok
    }
}

/// Stands in for a real vision-OCR client until one is wired up behind
/// [`OcrPort`]: every screenshot comes back unrecognized.
pub struct NullOcr;

#[async_trait]
impl OcrPort for NullOcr {
    async fn extract_hand_id(&self, _screenshot: &Screenshot) -> OcrAOutcome {
        OcrAOutcome::NotFound
    }
    async fn extract_players(&self, _screenshot: &Screenshot) -> OcrBOutcome {
        OcrBOutcome::Malformed
    }
}
