//! Fallback scoring and validation gates. Two signals from the weight
//! table below — hero hole cards and the visible board — only have ground
//! truth once the parser captures a hand's "Dealt to" line and the OCR-B
//! payload carries its own `hole_cards`/`board` fields; player-name
//! intersection has no ground truth before mapping runs (hands only carry
//! anonymized identifiers) and always contributes zero here.

use crate::config::PipelineConfig;
use crate::domain::{Hand, Screenshot};
use std::collections::HashSet;

const WEIGHT_HOLE_CARDS: u8 = 40;
const WEIGHT_BOARD: u8 = 30;
const WEIGHT_ROLE_AGREEMENT: u8 = 15;
const WEIGHT_HERO_STACK: u8 = 5;

pub fn score_candidate(hand: &Hand, shot: &Screenshot) -> u8 {
    let mut total: u32 = 0;
    let Some(payload) = shot.ocr_b_payload() else {
        return 0;
    };

    if !hand.hero_hole_cards.is_empty() && !payload.hero.hole_cards.is_empty() {
        if as_set(&hand.hero_hole_cards) == as_set(&payload.hero.hole_cards) {
            total += WEIGHT_HOLE_CARDS as u32;
        }
    }
    if !hand.board.is_empty() && !payload.board.is_empty() {
        if as_set(&hand.board) == as_set(&payload.board) {
            total += WEIGHT_BOARD as u32;
        }
    }
    if let (Some(hero_seat), Some(hero_role)) =
        (hand.hero_seat(), payload.hero.role)
    {
        if hero_seat.roles.contains(&hero_role) {
            total += WEIGHT_ROLE_AGREEMENT as u32;
        }
    }
    if let Some(hero_seat) = hand.hero_seat() {
        if hero_seat.starting_stack == payload.hero.stack {
            total += WEIGHT_HERO_STACK as u32;
        }
    }
    total.min(100) as u8
}

fn as_set(cards: &[String]) -> HashSet<&str> {
    cards.iter().map(String::as_str).collect()
}

/// Validation gates. When OCR-B isn't available yet only the trivial form
/// of the seat-count gate applies — it always passes here since OCR-A
/// never surfaces a player count in this port's contract.
pub fn passes_gates(hand: &Hand, shot: &Screenshot, config: &PipelineConfig) -> bool {
    let Some(payload) = shot.ocr_b_payload() else {
        return true;
    };
    if payload.players.len() != hand.seats.len() {
        return false;
    }
    if let Some(hero_seat) = hand.hero_seat() {
        if !within_tolerance(hero_seat.starting_stack, payload.hero.stack, config.hero_stack_tolerance) {
            return false;
        }
    }
    let mut hand_stacks: Vec<u64> = hand
        .seats
        .iter()
        .filter(|s| !s.is_hero())
        .map(|s| s.starting_stack)
        .collect();
    let mut shot_stacks: Vec<u64> = payload
        .players
        .iter()
        .filter(|p| Some(p.name.as_str()) != Some(payload.hero.name.as_str()) || p.role != payload.hero.role)
        .map(|p| p.stack)
        .collect();
    if hand_stacks.is_empty() {
        return true;
    }
    hand_stacks.sort_unstable_by(|a, b| b.cmp(a));
    shot_stacks.sort_unstable_by(|a, b| b.cmp(a));
    let pairs = hand_stacks.len().min(shot_stacks.len());
    let matching = (0..pairs)
        .filter(|&i| within_tolerance(hand_stacks[i], shot_stacks[i], config.other_stacks_tolerance))
        .count();
    (matching as f64) >= (hand_stacks.len() as f64) * config.other_stacks_min_fraction
}

fn within_tolerance(hand_value: u64, shot_value: u64, tolerance: f64) -> bool {
    if hand_value == 0 {
        return shot_value == 0;
    }
    let diff = (hand_value as f64 - shot_value as f64).abs();
    diff / hand_value as f64 <= tolerance
}
