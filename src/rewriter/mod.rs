//! Rewriter: replaces every occurrence of a mapped anonymized identifier
//! in a hand's raw text with its real name, in the fixed
//! most-specific-first order. Idempotent: an identifier only substitutes
//! when the captured token is a key of `mapping`, so a second pass over
//! already-rewritten text (now holding real names, not anonymized ids)
//! finds nothing left to replace.

mod patterns;

use regex::Regex;
use std::collections::HashMap;

/// Applies every pattern, in order, to `text` using `mapping` (anonymized
/// identifier → real name). Identifiers absent from `mapping` are left
/// untouched, exactly as they appear in the source.
pub fn rewrite(text: &str, mapping: &HashMap<String, String>) -> String {
    let p = patterns::get();
    let mut out = text.to_string();
    for regex in [
        &p.seat_declaration,
        &p.posts_small_blind,
        &p.posts_big_blind,
        &p.posts_ante,
        &p.dealt_to,
        &p.action_verbs,
        &p.showdown_verbs,
        &p.collected,
        &p.uncalled_bet,
        &p.summary_seat,
    ] {
        out = substitute_id(regex, &out, mapping);
    }
    out
}

/// Replaces only the `id` capture group of every match, leaving the rest of
/// the matched literal (and anything outside the match) untouched.
fn substitute_id(regex: &Regex, text: &str, mapping: &HashMap<String, String>) -> String {
    let mut result = String::with_capacity(text.len());
    let mut last_end = 0;
    for caps in regex.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        let id = caps.name("id").unwrap();
        let Some(name) = mapping.get(id.as_str()) else {
            continue;
        };
        result.push_str(&text[last_end..whole.start()]);
        result.push_str(&text[whole.start()..id.start()]);
        result.push_str(name);
        result.push_str(&text[id.end()..whole.end()]);
        last_end = whole.end();
    }
    result.push_str(&text[last_end..]);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const HAND: &str = "Hand #100: Hold'em No Limit ($1/$2) - 2024/01/15 21:03:45 UTC\n\
Table 'T1' 6-max Seat #3 is the button\n\
Seat 1: a11111 (200 in chips)\n\
Seat 2: b22222 (200 in chips)\n\
Seat 3: hero (200 in chips)\n\
Dealt to hero [Ah Kd]\n\
a11111: posts small blind 1\n\
b22222: posts big blind 2\n\
a11111: folds\n\
hero: shows [Ah Kd]\n\
b22222 collected 3 from pot\n\
Uncalled bet ($1) returned to hero\n\
*** SUMMARY ***\n\
Seat 1: a11111 folded before Flop\n\
Seat 2: b22222 collected (3)\n\
Seat 3: hero won\n";

    fn mapping() -> HashMap<String, String> {
        [
            ("a11111".to_string(), "Bob".to_string()),
            ("b22222".to_string(), "Carol".to_string()),
            ("hero".to_string(), "Alice".to_string()),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn rewrites_every_pattern_occurrence() {
        let rewritten = rewrite(HAND, &mapping());
        assert!(rewritten.contains("Seat 1: Bob (200 in chips)"));
        assert!(rewritten.contains("Seat 3: Alice (200 in chips)"));
        assert!(rewritten.contains("Dealt to Alice ["));
        assert!(rewritten.contains("Bob: posts small blind"));
        assert!(rewritten.contains("Carol: posts big blind"));
        assert!(rewritten.contains("Bob: folds"));
        assert!(rewritten.contains("Alice: shows"));
        assert!(rewritten.contains("Carol collected"));
        assert!(rewritten.contains("Uncalled bet ($1) returned to Alice"));
        assert!(rewritten.contains("Seat 1: Bob folded"));
        assert!(!rewritten.contains("a11111"));
        assert!(!rewritten.contains("b22222"));
        assert!(!rewritten.contains("hero"));
    }

    #[test]
    fn an_empty_mapping_is_a_no_op() {
        assert_eq!(rewrite(HAND, &HashMap::new()), HAND);
    }

    #[test]
    fn applying_twice_is_idempotent() {
        let once = rewrite(HAND, &mapping());
        let twice = rewrite(&once, &mapping());
        assert_eq!(once, twice);
    }

    #[test]
    fn uncalled_bet_with_a_dollar_amount_is_rewritten() {
        let text = "Uncalled bet ($8) returned to hero\n";
        let rewritten = rewrite(text, &mapping());
        assert_eq!(rewritten, "Uncalled bet ($8) returned to Alice\n");
    }

    #[test]
    fn an_identifier_that_is_a_substring_of_another_does_not_cross_match() {
        let text = "Seat 1: ab1 (100 in chips)\nSeat 2: ab12 (100 in chips)\n";
        let mut m = HashMap::new();
        m.insert("ab1".to_string(), "Short".to_string());
        let rewritten = rewrite(text, &m);
        assert!(rewritten.contains("Seat 1: Short (100 in chips)"));
        assert!(rewritten.contains("Seat 2: ab12 (100 in chips)"));
    }
}
