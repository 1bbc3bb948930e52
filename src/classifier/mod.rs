//! Classifier: a pure scan for residual anonymized-identifier shapes in
//! rewritten text, then an optional validator-port downgrade. No async
//! here except the single validator call, which the pipeline awaits at
//! the stage boundary.

use crate::domain::Classification;
use crate::ports::{ValidationOutcome, ValidatorPort};
use regex::Regex;
use std::sync::OnceLock;

static RESIDUAL: OnceLock<Regex> = OnceLock::new();

/// A 6-8 hex-character token, or the reserved hero placeholder, not
/// glued to a longer run of name characters on either side: a hex-looking
/// substring embedded inside a real name (itself one continuous run of
/// word characters) has no word boundary at either edge, so it never
/// matches here.
fn residual_pattern() -> &'static Regex {
    RESIDUAL.get_or_init(|| Regex::new(r"\b[0-9a-fA-F]{6,8}\b|\bhero\b").unwrap())
}

/// Scans one hand's rewritten text for a residual identifier shape.
pub fn classify_text(text: &str) -> Classification {
    if residual_pattern().is_match(text) {
        Classification::Residual
    } else {
        Classification::Clean
    }
}

/// Runs the pure scan, then consults the optional validator for a `Clean`
/// verdict: the validator may further demote a clean hand. It is called
/// as a pure pass/reasons function and is not retried.
pub async fn classify(text: &str, validator: &dyn ValidatorPort) -> Classification {
    match classify_text(text) {
        Classification::Residual => Classification::Residual,
        Classification::Clean => match validator.validate(text).await {
            ValidationOutcome::Ok => Classification::Clean,
            ValidationOutcome::Violations(violations) => {
                for v in violations {
                    log::warn!("validator demoted a clean hand: {} ({})", v.kind, v.detail);
                }
                Classification::Residual
            }
        },
    }
}

/// Whole files are classified by the worst hand they contain.
pub fn classify_file<'a>(hands: impl IntoIterator<Item = &'a Classification>) -> Classification {
    if hands.into_iter().any(|c| *c == Classification::Residual) {
        Classification::Residual
    } else {
        Classification::Clean
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::NullValidator;

    #[test]
    fn a_fully_rewritten_hand_is_clean() {
        let text = "Seat 1: Bob (200 in chips)\nSeat 2: Carol (200 in chips)\n";
        assert_eq!(classify_text(text), Classification::Clean);
    }

    #[test]
    fn a_leftover_hex_token_is_residual() {
        let text = "Seat 1: a11111 (200 in chips)\nSeat 2: Carol (200 in chips)\n";
        assert_eq!(classify_text(text), Classification::Residual);
    }

    #[test]
    fn a_leftover_hero_placeholder_is_residual() {
        let text = "Seat 3: hero (200 in chips)\n";
        assert_eq!(classify_text(text), Classification::Residual);
    }

    #[test]
    fn worst_hand_in_a_file_determines_the_file_classification() {
        let hands = vec![Classification::Clean, Classification::Residual, Classification::Clean];
        assert_eq!(classify_file(hands.iter()), Classification::Residual);
    }

    #[tokio::test]
    async fn an_unavailable_validator_never_downgrades_a_clean_hand() {
        let text = "Seat 1: Bob (200 in chips)\n";
        assert_eq!(classify(text, &NullValidator).await, Classification::Clean);
    }
}
