//! Error taxonomy. Every non-fatal kind is recorded on the job and
//! surfaces in the final report; only `Storage`, `Config`, and a per-stage
//! wallclock timeout are fatal.

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum PipelineError {
    #[error("hand record in {file} malformed: {reason}")]
    InputParse { file: String, reason: String },

    #[error("ocr transient failure on {screenshot}: {reason}")]
    OcrTransient { screenshot: String, reason: String },

    #[error("ocr permanent failure on {screenshot}: {reason}")]
    OcrPermanent { screenshot: String, reason: String },

    #[error("ocr-b payload for {screenshot} violated schema")]
    OcrSchema { screenshot: String },

    #[error("match rejected for {screenshot} at gate {gate}")]
    MatchGateRejected { screenshot: String, gate: String },

    #[error("mapping conflict in hand {hand_id}: name {name} claimed by multiple seats")]
    MappingConflict { hand_id: String, name: String },

    #[error("table conflict at {table_id} for identifier {identifier}")]
    TableConflict { table_id: String, identifier: String },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("job cancelled")]
    Cancelled,

    #[error("stage {stage} exceeded its wallclock timeout")]
    StageTimeout { stage: String },
}

impl PipelineError {
    /// Propagation policy: only these kinds end the job.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PipelineError::Storage(_)
                | PipelineError::Config(_)
                | PipelineError::Cancelled
                | PipelineError::StageTimeout { .. }
        )
    }

    pub fn kind(&self) -> PipelineErrorKind {
        match self {
            PipelineError::InputParse { .. } => PipelineErrorKind::InputParse,
            PipelineError::OcrTransient { .. } => PipelineErrorKind::OcrTransient,
            PipelineError::OcrPermanent { .. } => PipelineErrorKind::OcrPermanent,
            PipelineError::OcrSchema { .. } => PipelineErrorKind::OcrSchema,
            PipelineError::MatchGateRejected { .. } => PipelineErrorKind::MatchGateRejected,
            PipelineError::MappingConflict { .. } => PipelineErrorKind::MappingConflict,
            PipelineError::TableConflict { .. } => PipelineErrorKind::TableConflict,
            PipelineError::Storage(_) => PipelineErrorKind::Storage,
            PipelineError::Config(_) => PipelineErrorKind::Config,
            PipelineError::Cancelled => PipelineErrorKind::Cancelled,
            PipelineError::StageTimeout { .. } => PipelineErrorKind::StageTimeout,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PipelineErrorKind {
    InputParse,
    OcrTransient,
    OcrPermanent,
    OcrSchema,
    MatchGateRejected,
    MappingConflict,
    TableConflict,
    Storage,
    Config,
    Cancelled,
    StageTimeout,
}
