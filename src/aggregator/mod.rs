//! Table aggregator: unions every per-hand mapping into one
//! [`TableMapping`] per table, grouped by the identity-normalized table
//! identifier of the hand that produced it. A sequential fold, since this
//! stage runs only after every per-hand mapping is already in hand.

mod normalize;

use crate::domain::{Hand, TableMapping};
use std::collections::HashMap;

pub use normalize::same_table;

/// One hand's contribution: its table identifier plus the anonymized-name
/// mapping derived for it (empty when that hand's own mapping was voided
/// by a duplicate-name conflict — folding an empty map is a no-op).
pub struct Contribution<'a> {
    pub hand: &'a Hand,
    pub mapping: HashMap<String, String>,
}

/// Groups contributions by table (string-equal-after-normalization, not a
/// literal `table_id` hash) and folds each group's mappings into a
/// [`TableMapping`]. The first hand seen for a cluster lends its raw
/// `table_id` as the record's canonical id.
pub fn aggregate(contributions: &[Contribution<'_>]) -> HashMap<String, TableMapping> {
    let mut tables: Vec<TableMapping> = Vec::new();

    for contribution in contributions {
        let table_id = &contribution.hand.table_id;
        let existing = tables.iter_mut().find(|t| same_table(&t.table_id, table_id));
        let table = match existing {
            Some(t) => t,
            None => {
                tables.push(TableMapping::new(table_id.clone()));
                tables.last_mut().unwrap()
            }
        };
        table.merge(&contribution.mapping);
    }

    tables
        .into_iter()
        .map(|t| (t.table_id.clone(), t))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Action, ActionKind, Seat};
    use chrono::Utc;

    fn hand(table_id: &str) -> Hand {
        Hand {
            hand_id: "1".into(),
            source_file: "t.txt".into(),
            table_id: table_id.into(),
            timestamp: Utc::now(),
            seats: vec![Seat::new(1, "cc11dd", 200)],
            board: vec![],
            actions: vec![Action::new("cc11dd", ActionKind::Folds, None)],
            hero_hole_cards: vec![],
            raw_text: String::new(),
        }
    }

    fn mapping(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn accepts_an_identifier_agreed_across_two_screenshots() {
        let h = hand("T1");
        let contributions = vec![
            Contribution { hand: &h, mapping: mapping(&[("cc11dd", "Frank")]) },
            Contribution { hand: &h, mapping: mapping(&[("cc11dd", "Frank")]) },
        ];
        let tables = aggregate(&contributions);
        let t1 = tables.get("T1").unwrap();
        assert_eq!(t1.accepted.get("cc11dd"), Some(&"Frank".to_string()));
        assert!(t1.conflicts.is_empty());
    }

    #[test]
    fn a_third_disagreeing_screenshot_voids_the_identifier_and_records_a_conflict() {
        let h = hand("T1");
        let contributions = vec![
            Contribution { hand: &h, mapping: mapping(&[("cc11dd", "Frank")]) },
            Contribution { hand: &h, mapping: mapping(&[("cc11dd", "Frank")]) },
            Contribution { hand: &h, mapping: mapping(&[("cc11dd", "Greg")]) },
        ];
        let tables = aggregate(&contributions);
        let t1 = tables.get("T1").unwrap();
        assert!(!t1.accepted.contains_key("cc11dd"));
        assert!(t1.conflicts.contains_key("cc11dd"));
    }

    #[test]
    fn merge_order_does_not_change_the_accepted_union() {
        let h = hand("T1");
        let forward = vec![
            Contribution { hand: &h, mapping: mapping(&[("a", "Alice")]) },
            Contribution { hand: &h, mapping: mapping(&[("b", "Bob")]) },
            Contribution { hand: &h, mapping: mapping(&[("a", "Alice")]) },
        ];
        let reverse: Vec<Contribution> = forward
            .iter()
            .rev()
            .map(|c| Contribution { hand: c.hand, mapping: c.mapping.clone() })
            .collect();
        let a = aggregate(&forward);
        let b = aggregate(&reverse);
        assert_eq!(a.get("T1").unwrap().accepted, b.get("T1").unwrap().accepted);
    }

    #[test]
    fn two_synthetic_unknown_tables_do_not_cross_contaminate() {
        let h1 = hand("unknown_table_1");
        let h2 = hand("unknown_table_2");
        let contributions = vec![
            Contribution { hand: &h1, mapping: mapping(&[("cc11dd", "Frank")]) },
            Contribution { hand: &h2, mapping: mapping(&[("cc11dd", "Greg")]) },
        ];
        let tables = aggregate(&contributions);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables["unknown_table_1"].accepted.get("cc11dd"), Some(&"Frank".to_string()));
        assert_eq!(tables["unknown_table_2"].accepted.get("cc11dd"), Some(&"Greg".to_string()));
    }

    #[test]
    fn trailing_whitespace_and_shared_instance_suffix_are_normalized_away() {
        let padded = hand("Main Table (3) ");
        let bare = hand("Main Table (3)");
        let contributions = vec![
            Contribution { hand: &padded, mapping: mapping(&[("cc11dd", "Frank")]) },
            Contribution { hand: &bare, mapping: mapping(&[("cc11dd", "Frank")]) },
        ];
        let tables = aggregate(&contributions);
        assert_eq!(tables.len(), 1);
    }
}
