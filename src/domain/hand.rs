use super::action::Action;
use super::seat::{Role, Seat};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hand {
    /// Normalized: any leading non-numeric prefix is stripped for comparisons.
    pub hand_id: String,
    /// Name of the input file this hand was parsed from; files are later
    /// classified by the worst hand they contain.
    pub source_file: String,
    pub table_id: String,
    pub timestamp: DateTime<Utc>,
    pub seats: Vec<Seat>,
    pub board: Vec<String>,
    pub actions: Vec<Action>,
    /// Cards from the hand's "Dealt to <id> [..]" line, when present. Only
    /// the uploading user's hole cards ever appear pre-showdown in an
    /// anonymized hand history, so this is the hero's cards — a matching
    /// signal when a screenshot's OCR-B payload also carries hole cards.
    #[serde(default)]
    pub hero_hole_cards: Vec<String>,
    /// Exact substring from the source file, later rewritten in place.
    pub raw_text: String,
}

impl Hand {
    /// Strips any leading non-numeric prefix for comparisons.
    pub fn normalize_hand_id(raw: &str) -> String {
        raw.trim_start_matches(|c: char| !c.is_ascii_digit())
            .to_string()
    }

    pub fn seat(&self, anon_id: &str) -> Option<&Seat> {
        self.seats.iter().find(|s| s.anon_id == anon_id)
    }

    pub fn seat_with_role(&self, role: Role) -> Option<&Seat> {
        self.seats.iter().find(|s| s.has_role(role))
    }

    pub fn hero_seat(&self) -> Option<&Seat> {
        self.seats.iter().find(|s| s.is_hero())
    }

    pub fn is_heads_up(&self) -> bool {
        self.seats.len() == 2
    }

    /// Seats are non-empty; raw text carries every listed id.
    pub fn validate(&self) -> Result<(), String> {
        if self.seats.is_empty() {
            return Err(format!("hand {} has no seats", self.hand_id));
        }
        for role in [Role::Button, Role::SmallBlind, Role::BigBlind] {
            let count = self.seats.iter().filter(|s| s.has_role(role)).count();
            if count > 1 {
                return Err(format!(
                    "hand {} has {count} seats tagged {role:?}",
                    self.hand_id
                ));
            }
        }
        for seat in &self.seats {
            if !self.raw_text.contains(&seat.anon_id) {
                return Err(format!(
                    "hand {} raw text missing seat identifier {}",
                    self.hand_id, seat.anon_id
                ));
            }
        }
        Ok(())
    }
}
