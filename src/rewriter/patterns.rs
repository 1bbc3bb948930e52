//! Ordered literal + word-boundary matchers, never a single alternation.
//! Each pattern below captures one anonymized identifier by name (`id`)
//! inside a context literal; substitution replaces only the captured
//! group, leaving the surrounding literal untouched, so a replacement
//! that itself contains regex metacharacters never escapes its slot.

use regex::Regex;
use std::sync::OnceLock;

/// Fixed, most-specific-first substitution order.
pub struct Patterns {
    pub seat_declaration: Regex,
    pub posts_small_blind: Regex,
    pub posts_big_blind: Regex,
    pub posts_ante: Regex,
    pub dealt_to: Regex,
    pub action_verbs: Regex,
    pub showdown_verbs: Regex,
    pub collected: Regex,
    pub uncalled_bet: Regex,
    pub summary_seat: Regex,
}

static PATTERNS: OnceLock<Patterns> = OnceLock::new();

pub fn get() -> &'static Patterns {
    PATTERNS.get_or_init(Patterns::compile)
}

impl Patterns {
    fn compile() -> Self {
        Self {
            seat_declaration: Regex::new(r"(?m)^(Seat \d+: )(?P<id>\S+)( \(\$?\d+ in chips\))").unwrap(),
            posts_small_blind: Regex::new(r"(?m)^(?P<id>\S+)(: posts small blind)").unwrap(),
            posts_big_blind: Regex::new(r"(?m)^(?P<id>\S+)(: posts big blind)").unwrap(),
            posts_ante: Regex::new(r"(?m)^(?P<id>\S+)(: posts the ante)").unwrap(),
            dealt_to: Regex::new(r"(?m)^(Dealt to )(?P<id>\S+)( \[)").unwrap(),
            action_verbs: Regex::new(
                r"(?m)^(?P<id>\S+)(: (?:folds|calls|raises|bets|checks)\b)",
            )
            .unwrap(),
            showdown_verbs: Regex::new(r"(?m)^(?P<id>\S+)(: (?:shows|mucks)\b)").unwrap(),
            collected: Regex::new(r"(?m)^(?P<id>\S+)( collected)").unwrap(),
            uncalled_bet: Regex::new(r"(Uncalled bet \(\$\d+\) returned to )(?P<id>\S+)").unwrap(),
            summary_seat: Regex::new(r"(?m)^(Seat \d+: )(?P<id>\S+)(\s)").unwrap(),
        }
    }
}
