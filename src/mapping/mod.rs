//! Mapping builder: one matched hand plus its OCR-B payload produces an
//! anonymized-id to real-name dictionary for that hand. Role alignment
//! drives off the role-carrying `Seat` and dealer-rotation order; named-field
//! traversal throughout, no positional tuples standing in for a role.

mod fuzzy;

use crate::config::PipelineConfig;
use crate::domain::{Hand, OcrBPayload, Role, Seat};
use std::collections::{HashMap, HashSet};

pub struct MappingOutcome {
    pub mapping: HashMap<String, String>,
    pub conflict: bool,
}

/// `known_names` is the union of real names already resolved for this
/// hand's table by earlier hands in the same mapping pass — fuzzy
/// completion below reaches into it. The table aggregator's own union
/// runs after every hand's mapping is derived and is a separate thing.
///
/// Role alignment applies uniformly to every role-carrying seat, hero
/// included — the uploading user's seat gets whatever name the role match
/// surfaces (scenario: a hero tagged both `button` and `D` on a different
/// display name than the payload's own `hero` field still binds to the
/// `D`-tagged name). The payload's `hero` record is the anchor for
/// positional-fallback alignment and the last-resort bind for a hero seat
/// that carries no role at all.
pub fn derive_mapping(
    hand: &Hand,
    payload: &OcrBPayload,
    known_names: &HashSet<String>,
    config: &PipelineConfig,
) -> MappingOutcome {
    let mut mapping: HashMap<String, String> = HashMap::new();

    if hand.is_heads_up() {
        bind_heads_up(hand, payload, known_names, config, &mut mapping);
    } else {
        bind_role_based(hand, payload, known_names, config, &mut mapping);
        if !covers_all_seats(hand, &mapping) {
            bind_positional_fallback(hand, payload, known_names, config, &mut mapping);
        }
    }

    if let Some(hero_seat) = hand.hero_seat() {
        mapping
            .entry(hero_seat.anon_id.clone())
            .or_insert_with(|| complete_name(&payload.hero.name, known_names, config));
    }

    if has_duplicate_names(&mapping) {
        return MappingOutcome {
            mapping: HashMap::new(),
            conflict: true,
        };
    }
    MappingOutcome {
        mapping,
        conflict: false,
    }
}

fn bind_heads_up(
    hand: &Hand,
    payload: &OcrBPayload,
    known_names: &HashSet<String>,
    config: &PipelineConfig,
    mapping: &mut HashMap<String, String>,
) {
    let button_sb_seat = hand
        .seats
        .iter()
        .find(|s| s.has_role(Role::Button) && s.has_role(Role::SmallBlind));
    if let Some(seat) = button_sb_seat {
        if let Some(name) = payload
            .players
            .iter()
            .find(|p| matches!(p.role, Some(Role::Button) | Some(Role::SmallBlind)))
            .map(|p| p.name.as_str())
        {
            mapping.insert(seat.anon_id.clone(), complete_name(name, known_names, config));
        }
    }
    if let Some(seat) = hand.seat_with_role(Role::BigBlind) {
        if let Some(name) = payload
            .players
            .iter()
            .find(|p| p.role == Some(Role::BigBlind))
            .map(|p| p.name.as_str())
        {
            mapping.insert(seat.anon_id.clone(), complete_name(name, known_names, config));
        }
    }
}

fn bind_role_based(
    hand: &Hand,
    payload: &OcrBPayload,
    known_names: &HashSet<String>,
    config: &PipelineConfig,
    mapping: &mut HashMap<String, String>,
) {
    let resolved = resolve_role_names(payload);
    for role in [Role::Button, Role::SmallBlind, Role::BigBlind] {
        let Some(seat) = hand.seat_with_role(role) else { continue };
        if let Some(&name) = resolved.get(&role) {
            mapping.insert(seat.anon_id.clone(), complete_name(name, known_names, config));
        }
    }
}

/// Payload tags only `D`: SB and BB are derived by clockwise rotation in
/// the payload's player order (D → next → next).
fn resolve_role_names(payload: &OcrBPayload) -> HashMap<Role, &str> {
    let mut resolved: HashMap<Role, &str> = HashMap::new();
    for player in &payload.players {
        if let Some(role) = player.role {
            resolved.insert(role, player.name.as_str());
        }
    }
    let only_button_tagged = resolved.contains_key(&Role::Button)
        && !resolved.contains_key(&Role::SmallBlind)
        && !resolved.contains_key(&Role::BigBlind);
    if only_button_tagged {
        if let Some(button_index) = payload.players.iter().position(|p| p.role == Some(Role::Button)) {
            let n = payload.players.len();
            if n >= 3 {
                resolved.insert(Role::SmallBlind, payload.players[(button_index + 1) % n].name.as_str());
                resolved.insert(Role::BigBlind, payload.players[(button_index + 2) % n].name.as_str());
            }
        }
    }
    resolved
}

fn covers_all_seats(hand: &Hand, mapping: &HashMap<String, String>) -> bool {
    hand.seats.iter().all(|s| mapping.contains_key(&s.anon_id))
}

/// Aligns the payload's player order to the hand's seat order starting
/// from the hero seat, proceeding clockwise. Used when role tagging alone
/// doesn't cover every seat.
fn bind_positional_fallback(
    hand: &Hand,
    payload: &OcrBPayload,
    known_names: &HashSet<String>,
    config: &PipelineConfig,
    mapping: &mut HashMap<String, String>,
) {
    if payload.players.is_empty() {
        return;
    }
    let seat_order = clockwise_from_hero(hand);
    let payload_hero_index = payload
        .players
        .iter()
        .position(|p| p.name == payload.hero.name)
        .unwrap_or(0);
    let n = payload.players.len();

    for (offset, seat) in seat_order.iter().enumerate() {
        if seat.is_hero() || mapping.contains_key(&seat.anon_id) {
            continue;
        }
        let aligned = &payload.players[(payload_hero_index + offset) % n];
        mapping.insert(seat.anon_id.clone(), complete_name(&aligned.name, known_names, config));
    }
}

fn clockwise_from_hero(hand: &Hand) -> Vec<&Seat> {
    let mut seats: Vec<&Seat> = hand.seats.iter().collect();
    seats.sort_by_key(|s| s.number);
    if let Some(hero_position) = seats.iter().position(|s| s.is_hero()) {
        seats.rotate_left(hero_position);
    }
    seats
}

fn has_duplicate_names(mapping: &HashMap<String, String>) -> bool {
    let mut seen = HashSet::new();
    mapping.values().any(|name| !seen.insert(name))
}

/// Completes a trailing-ellipsis OCR truncation by fuzzy match against
/// names already known for this table. Names without a truncation marker
/// pass through byte-for-byte.
fn complete_name(name: &str, known_names: &HashSet<String>, config: &PipelineConfig) -> String {
    let trimmed = name.trim_end_matches('\u{2026}').trim_end_matches("...");
    if trimmed.len() == name.len() {
        return name.to_string();
    }
    known_names
        .iter()
        .map(|candidate| (candidate, fuzzy::similarity(trimmed, candidate)))
        .filter(|&(_, score)| score >= config.fuzzy_name_threshold)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(candidate, _)| candidate.clone())
        .unwrap_or_else(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Action, ActionKind, PlayerRecord, Seat};
    use chrono::Utc;

    fn three_handed() -> Hand {
        Hand {
            hand_id: "1".into(),
            source_file: "t.txt".into(),
            table_id: "T1".into(),
            timestamp: Utc::now(),
            seats: vec![
                Seat::new(1, "a11111", 200).with_role(Role::SmallBlind),
                Seat::new(2, "b22222", 200).with_role(Role::BigBlind),
                Seat::new(3, "hero", 200).with_role(Role::Button),
            ],
            board: vec![],
            actions: vec![Action::new("a11111", ActionKind::PostsSmallBlind, Some(1))],
            hero_hole_cards: vec![],
            raw_text: String::new(),
        }
    }

    fn player(name: &str, role: Option<Role>) -> PlayerRecord {
        PlayerRecord { name: name.into(), stack: 200, role, hole_cards: vec![] }
    }

    #[test]
    fn three_handed_role_based_mapping_matches_scenario_one() {
        let hand = three_handed();
        let payload = OcrBPayload {
            players: vec![
                player("Alice", Some(Role::Button)),
                player("Bob", Some(Role::SmallBlind)),
                player("Carol", Some(Role::BigBlind)),
            ],
            hero: player("Carol", Some(Role::BigBlind)),
            board: vec![],
        };
        let outcome = derive_mapping(&hand, &payload, &HashSet::new(), &PipelineConfig::default());
        assert!(!outcome.conflict);
        assert_eq!(outcome.mapping.get("a11111"), Some(&"Bob".to_string()));
        assert_eq!(outcome.mapping.get("b22222"), Some(&"Carol".to_string()));
        assert_eq!(outcome.mapping.get("hero"), Some(&"Alice".to_string()));
    }

    #[test]
    fn d_only_indicator_derives_sb_and_bb_by_rotation() {
        let hand = three_handed();
        let payload = OcrBPayload {
            players: vec![player("Alice", Some(Role::Button)), player("Bob", None), player("Carol", None)],
            hero: player("Carol", None),
            board: vec![],
        };
        let outcome = derive_mapping(&hand, &payload, &HashSet::new(), &PipelineConfig::default());
        assert!(!outcome.conflict);
        assert_eq!(outcome.mapping.get("a11111"), Some(&"Bob".to_string()));
        assert_eq!(outcome.mapping.get("b22222"), Some(&"Carol".to_string()));
    }

    #[test]
    fn heads_up_binds_both_seats_from_scenario_three() {
        let hand = Hand {
            hand_id: "2".into(),
            source_file: "t.txt".into(),
            table_id: "T1".into(),
            timestamp: Utc::now(),
            seats: vec![
                Seat::new(1, "hero", 200).with_role(Role::Button).with_role(Role::SmallBlind),
                Seat::new(2, "ff00ee", 200).with_role(Role::BigBlind),
            ],
            board: vec![],
            actions: vec![],
            hero_hole_cards: vec![],
            raw_text: String::new(),
        };
        let payload = OcrBPayload {
            players: vec![player("Dana", Some(Role::Button)), player("Erin", Some(Role::BigBlind))],
            hero: player("Dana", Some(Role::Button)),
            board: vec![],
        };
        let outcome = derive_mapping(&hand, &payload, &HashSet::new(), &PipelineConfig::default());
        assert!(!outcome.conflict);
        assert_eq!(outcome.mapping.get("hero"), Some(&"Dana".to_string()));
        assert_eq!(outcome.mapping.get("ff00ee"), Some(&"Erin".to_string()));
    }

    #[test]
    fn duplicate_name_within_one_hand_voids_the_mapping() {
        let hand = three_handed();
        let payload = OcrBPayload {
            players: vec![
                player("Hank", Some(Role::Button)),
                player("Hank", Some(Role::SmallBlind)),
                player("Ivy", Some(Role::BigBlind)),
            ],
            hero: player("Ivy", Some(Role::BigBlind)),
            board: vec![],
        };
        let outcome = derive_mapping(&hand, &payload, &HashSet::new(), &PipelineConfig::default());
        assert!(outcome.conflict);
        assert!(outcome.mapping.is_empty());
    }

    #[test]
    fn truncated_name_completes_via_fuzzy_match_against_known_names() {
        let hand = three_handed();
        let payload = OcrBPayload {
            players: vec![
                player("Alice", Some(Role::Button)),
                player("Carolin...", Some(Role::SmallBlind)),
                player("Carol", Some(Role::BigBlind)),
            ],
            hero: player("Carol", Some(Role::BigBlind)),
            board: vec![],
        };
        let mut known = HashSet::new();
        known.insert("Carolina".to_string());
        let outcome = derive_mapping(&hand, &payload, &known, &PipelineConfig::default());
        assert_eq!(outcome.mapping.get("a11111"), Some(&"Carolina".to_string()));
    }
}
