//! Progress events. An unbounded mpsc channel bridges the pipeline
//! (producer) to whatever UI subscribes (consumer). The pipeline never
//! polls for UI state — it only ever pushes.

use crate::domain::JobStage;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Clone)]
pub struct StageCounts {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub in_flight: usize,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub job_id: String,
    pub stage: JobStage,
    pub counts: StageCounts,
    pub elapsed: Duration,
}

#[derive(Clone)]
pub struct ProgressReporter {
    job_id: String,
    started: Instant,
    tx: Option<UnboundedSender<ProgressEvent>>,
}

impl ProgressReporter {
    pub fn new(job_id: impl Into<String>, tx: Option<UnboundedSender<ProgressEvent>>) -> Self {
        Self {
            job_id: job_id.into(),
            started: Instant::now(),
            tx,
        }
    }

    pub fn emit(&self, stage: JobStage, counts: StageCounts) {
        log::info!(
            "job {} stage {:?}: {}/{} succeeded, {} failed, {} in flight",
            self.job_id,
            stage,
            counts.succeeded,
            counts.total,
            counts.failed,
            counts.in_flight
        );
        if let Some(tx) = &self.tx {
            let _ = tx.send(ProgressEvent {
                job_id: self.job_id.clone(),
                stage,
                counts,
                elapsed: self.started.elapsed(),
            });
        }
    }
}

/// Pairs a subscriber-facing receiver with the sender handed to the pipeline.
pub fn channel() -> (UnboundedSender<ProgressEvent>, UnboundedReceiver<ProgressEvent>) {
    mpsc::unbounded_channel()
}
