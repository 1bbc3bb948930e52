//! Binds hands to screenshots. Primary binding runs off OCR-A alone;
//! fallback scoring only contributes once a screenshot's OCR-B payload is
//! populated (the pipeline re-invokes this after OCR-B for screenshots
//! that missed a primary bind). Named-field records throughout, never
//! positional tuples.

mod score;

use crate::config::PipelineConfig;
use crate::domain::{Hand, Screenshot};
use std::collections::{HashMap, HashSet};

pub use score::score_candidate;

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub hand_id: String,
    pub screenshot_filename: String,
    pub confidence: u8,
}

pub struct MatchOutcome {
    pub bindings: Vec<Binding>,
    pub unmatched: Vec<String>,
}

/// Runs the full two-phase bind (primary, then fallback scoring) over the
/// given hands and screenshots. Screenshots are processed in stable
/// filename order. Idempotent to call again after OCR-B populates more
/// screenshots: hands already bound at confidence 100 stay locked.
pub fn match_screenshots(
    hands: &[Hand],
    screenshots: &[Screenshot],
    config: &PipelineConfig,
) -> MatchOutcome {
    let mut hand_index: HashMap<&str, usize> = HashMap::new();
    for (i, hand) in hands.iter().enumerate() {
        hand_index.entry(hand.hand_id.as_str()).or_insert(i);
    }

    let mut ordered: Vec<&Screenshot> = screenshots.iter().collect();
    ordered.sort_by(|a, b| a.filename.cmp(&b.filename));

    // hand index -> (screenshot filename, confidence)
    let mut claimed: HashMap<usize, (String, u8)> = HashMap::new();
    let mut fallback_pool: Vec<&Screenshot> = Vec::new();

    for shot in &ordered {
        let bound = shot.ocr_a_hand_id().and_then(|raw| {
            let normalized = Hand::normalize_hand_id(raw);
            hand_index.get(normalized.as_str()).copied()
        });
        match bound {
            Some(hand_idx) if !claimed.contains_key(&hand_idx) => {
                claimed.insert(hand_idx, (shot.filename.clone(), 100));
            }
            // Either no primary target, or the target is already claimed by
            // an earlier (by filename) screenshot — the loser falls through.
            _ => fallback_pool.push(shot),
        }
    }

    let mut proposals: HashMap<usize, Vec<(&Screenshot, u8)>> = HashMap::new();
    for shot in &fallback_pool {
        for (hand_idx, hand) in hands.iter().enumerate() {
            if claimed.contains_key(&hand_idx) {
                continue;
            }
            if !within_window(hand, shot, config.match_time_window_seconds) {
                continue;
            }
            if !score::passes_gates(hand, shot, config) {
                continue;
            }
            let candidate_score = score_candidate(hand, shot);
            if candidate_score >= config.match_fallback_threshold {
                proposals.entry(hand_idx).or_default().push((shot, candidate_score));
            }
        }
    }

    for (hand_idx, mut group) in proposals {
        group.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.filename.cmp(&b.0.filename)));
        let (winner, winner_score) = group[0];
        claimed.insert(hand_idx, (winner.filename.clone(), winner_score));
    }

    let matched_filenames: HashSet<&str> =
        claimed.values().map(|(filename, _)| filename.as_str()).collect();
    let unmatched: Vec<String> = ordered
        .iter()
        .map(|shot| shot.filename.clone())
        .filter(|filename| !matched_filenames.contains(filename.as_str()))
        .collect();

    let mut bindings: Vec<Binding> = claimed
        .into_iter()
        .map(|(hand_idx, (screenshot_filename, confidence))| Binding {
            hand_id: hands[hand_idx].hand_id.clone(),
            screenshot_filename,
            confidence,
        })
        .collect();
    bindings.sort_by(|a, b| a.screenshot_filename.cmp(&b.screenshot_filename));

    MatchOutcome { bindings, unmatched }
}

pub fn within_window(hand: &Hand, shot: &Screenshot, window_seconds: i64) -> bool {
    (hand.timestamp - shot.file_timestamp).num_seconds().abs() <= window_seconds
}
