use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A binding of one screenshot to one hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub hand_id: String,
    pub screenshot_filename: String,
    /// Always in `[70, 100]`: 100 for a primary OCR-A bind, at or above
    /// the fallback threshold for a scored bind.
    pub confidence: u8,
    pub mapping: HashMap<String, String>,
}
