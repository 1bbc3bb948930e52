use super::hand::Hand;
use super::match_record::MatchRecord;
use super::screenshot::Screenshot;
use super::table_mapping::TableMapping;
use crate::config::{PipelineConfig, Tier};
use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStage {
    Initialized,
    Parsing,
    OcrA,
    Matching,
    OcrB,
    Mapping,
    Aggregating,
    Rewriting,
    Classifying,
    Completed,
    Failed,
    Cancelled,
}

/// Root of a single run. Owns every `Hand` and `Screenshot`; mappings and
/// matches reference them by id/filename rather than borrowing, so the job
/// can be serialized wholesale through the storage port at stage boundaries.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    pub tier: Tier,
    pub config: PipelineConfig,
    pub hands: Vec<Hand>,
    pub screenshots: Vec<Screenshot>,
    pub matches: Vec<MatchRecord>,
    pub unmatched: Vec<String>,
    pub table_mappings: HashMap<String, TableMapping>,
    /// One entry per rewritten hand, in parse order. Grouped by
    /// [`RewrittenHand::source_file`] into [`RewrittenFile`]s at the
    /// storage boundary.
    pub hand_outputs: Vec<RewrittenHand>,
    pub rewritten: Vec<RewrittenFile>,
    pub stage: JobStage,
    pub errors: Vec<PipelineError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewrittenHand {
    pub hand_id: String,
    pub source_file: String,
    pub text: String,
    pub classification: Classification,
}

/// Whole files are classified by the worst hand they contain; the storage
/// port writes one of these per distinct input file, its hands
/// concatenated in parse order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewrittenFile {
    pub name: String,
    pub hand_ids: Vec<String>,
    pub text: String,
    pub classification: Classification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    Clean,
    Residual,
}

impl Job {
    pub fn new(id: impl Into<String>, config: PipelineConfig) -> Self {
        let tier = config.tier;
        Self {
            id: id.into(),
            tier,
            config,
            hands: Vec::new(),
            screenshots: Vec::new(),
            matches: Vec::new(),
            unmatched: Vec::new(),
            table_mappings: HashMap::new(),
            hand_outputs: Vec::new(),
            rewritten: Vec::new(),
            stage: JobStage::Initialized,
            errors: Vec::new(),
        }
    }

    pub fn record_error(&mut self, err: PipelineError) {
        log::warn!("job {}: {}", self.id, err);
        self.errors.push(err);
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.stage,
            JobStage::Completed | JobStage::Failed | JobStage::Cancelled
        )
    }

    /// Storage-port-facing summary: a compact snapshot written alongside
    /// the per-screenshot outcomes and per-file rewritten contents.
    pub fn to_record(&self) -> JobRecord {
        JobRecord {
            id: self.id.clone(),
            tier: self.tier,
            stage: self.stage,
            hand_count: self.hands.len(),
            screenshot_count: self.screenshots.len(),
            match_count: self.matches.len(),
            unmatched_count: self.unmatched.len(),
            error_kinds: self.errors.iter().map(|e| e.kind()).collect(),
        }
    }

    pub fn screenshot_outcomes(&self) -> Vec<ScreenshotOutcome> {
        self.screenshots
            .iter()
            .map(|s| ScreenshotOutcome {
                filename: s.filename.clone(),
                ocr_a: s.ocr_a.clone(),
                ocr_b_ok: s.ocr_b_payload().is_some(),
                matched_hand_id: s.matched_hand_id.clone(),
                confidence: s.match_confidence,
            })
            .collect()
    }
}

/// A durable, serializable snapshot of a [`Job`] for the storage port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    pub tier: Tier,
    pub stage: JobStage,
    pub hand_count: usize,
    pub screenshot_count: usize,
    pub match_count: usize,
    pub unmatched_count: usize,
    pub error_kinds: Vec<crate::error::PipelineErrorKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenshotOutcome {
    pub filename: String,
    pub ocr_a: Option<super::screenshot::OcrAOutcome>,
    pub ocr_b_ok: bool,
    pub matched_hand_id: Option<String>,
    pub confidence: Option<u8>,
}
