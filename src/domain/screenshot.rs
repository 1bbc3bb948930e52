use super::seat::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of OCR port operation A: hand-identifier extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OcrAOutcome {
    Found(String),
    NotFound,
    TransientError(String),
    PermanentError(String),
}

/// One display-name record from the OCR-B payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub name: String,
    pub stack: u64,
    pub role: Option<Role>,
    /// Hole cards visible in the screenshot, if any — populated only for
    /// the hero entry in practice, since opponents' cards are hidden
    /// outside a showdown. Empty when not shown.
    #[serde(default)]
    pub hole_cards: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrBPayload {
    pub players: Vec<PlayerRecord>,
    pub hero: PlayerRecord,
    /// Community cards visible in the screenshot, if any — a matching
    /// signal when compared against the hand's own board. Empty when the
    /// board isn't shown.
    #[serde(default)]
    pub board: Vec<String>,
}

impl OcrBPayload {
    /// Schema validation: a non-empty players list, with a role dict
    /// (possibly partial) implied by each record's optional `role`.
    pub fn is_schema_valid(&self) -> bool {
        !self.players.is_empty()
    }

    pub fn player_with_role(&self, role: Role) -> Option<&PlayerRecord> {
        self.players.iter().find(|p| p.role == Some(role))
    }
}

/// Outcome of OCR port operation B: players and roles extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OcrBOutcome {
    Payload(OcrBPayload),
    Malformed,
    TransientError(String),
    PermanentError(String),
}

/// A file to be read lazily and dropped after the last OCR driver that
/// needs it completes.
#[derive(Debug, Clone)]
pub enum ScreenshotSource {
    Path(PathBuf),
    InMemory(std::sync::Arc<Vec<u8>>),
}

impl ScreenshotSource {
    pub fn load(&self) -> std::io::Result<Vec<u8>> {
        match self {
            ScreenshotSource::Path(p) => std::fs::read(p),
            ScreenshotSource::InMemory(bytes) => Ok(bytes.as_ref().clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Screenshot {
    pub filename: String,
    pub source: ScreenshotSource,
    pub media_type: String,
    pub file_timestamp: DateTime<Utc>,
    pub ocr_a: Option<OcrAOutcome>,
    pub ocr_b: Option<OcrBOutcome>,
    pub matched_hand_id: Option<String>,
    pub match_confidence: Option<u8>,
    pub mapping: Option<std::collections::HashMap<String, String>>,
}

impl Screenshot {
    pub fn new(
        filename: impl Into<String>,
        source: ScreenshotSource,
        media_type: impl Into<String>,
        file_timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            filename: filename.into(),
            source,
            media_type: media_type.into(),
            file_timestamp,
            ocr_a: None,
            ocr_b: None,
            matched_hand_id: None,
            match_confidence: None,
            mapping: None,
        }
    }

    pub fn ocr_a_hand_id(&self) -> Option<&str> {
        match &self.ocr_a {
            Some(OcrAOutcome::Found(h)) => Some(h.as_str()),
            _ => None,
        }
    }

    pub fn ocr_b_payload(&self) -> Option<&OcrBPayload> {
        match &self.ocr_b {
            Some(OcrBOutcome::Payload(p)) => Some(p),
            _ => None,
        }
    }
}
