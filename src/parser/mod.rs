//! Hand-history text parser. Text-driven: header line → seat block →
//! streets block made of action lines. A hand whose header cannot be
//! parsed is skipped with a warning; one malformed hand never poisons the
//! rest of the file.

mod patterns;

use crate::domain::{Action, ActionKind, Hand, Role, Seat};
use crate::error::PipelineError;
use chrono::{DateTime, NaiveDateTime, Utc};
use patterns::Patterns;
use std::collections::HashMap;

pub struct ParseOutcome {
    pub hands: Vec<Hand>,
    pub warnings: Vec<PipelineError>,
}

/// Splits `content` into per-hand blocks on the header pattern and parses
/// each independently. `file_key` seeds the stable `unknown_table_<N>`
/// counter for this file.
pub fn parse_file(file_name: &str, content: &str, file_key: u64) -> ParseOutcome {
    let patterns = Patterns::get();
    let mut hands = Vec::new();
    let mut warnings = Vec::new();
    let mut unknown_table_seq = 0u64;

    for block in split_into_hand_blocks(content, patterns) {
        match parse_one_hand(&block, patterns, file_key, &mut unknown_table_seq) {
            Ok(mut hand) => {
                hand.source_file = file_name.to_string();
                hands.push(hand);
            }
            Err(reason) => warnings.push(PipelineError::InputParse {
                file: file_name.to_string(),
                reason,
            }),
        }
    }
    ParseOutcome { hands, warnings }
}

fn split_into_hand_blocks<'a>(content: &'a str, patterns: &Patterns) -> Vec<&'a str> {
    let mut starts: Vec<usize> = patterns
        .header
        .find_iter(content)
        .map(|m| m.start())
        .collect();
    if starts.is_empty() {
        return Vec::new();
    }
    starts.push(content.len());
    starts
        .windows(2)
        .map(|w| content[w[0]..w[1]].trim_end())
        .filter(|b| !b.is_empty())
        .collect()
}

fn parse_one_hand(
    block: &str,
    patterns: &Patterns,
    file_key: u64,
    unknown_table_seq: &mut u64,
) -> Result<Hand, String> {
    let header = patterns
        .header
        .captures(block)
        .ok_or_else(|| "missing or malformed header line".to_string())?;
    let raw_hand_id = header.name("hand_id").unwrap().as_str();
    let hand_id = Hand::normalize_hand_id(raw_hand_id);
    let timestamp = parse_timestamp(header.name("timestamp").unwrap().as_str())
        .ok_or_else(|| "unparseable header timestamp".to_string())?;

    let table_id = match patterns.table.captures(block) {
        Some(caps) => caps.name("table_id").unwrap().as_str().trim().to_string(),
        None => {
            let id = format!("unknown_table_{file_key}_{unknown_table_seq}");
            *unknown_table_seq += 1;
            id
        }
    };
    let header_button_seat: Option<u32> = patterns
        .table
        .captures(block)
        .and_then(|c| c.name("button_seat"))
        .and_then(|m| m.as_str().parse().ok());

    let mut seats: Vec<Seat> = patterns
        .seat_line
        .captures_iter(block)
        .filter_map(|c| {
            let number: u32 = c.name("seat_no")?.as_str().parse().ok()?;
            let anon_id = c.name("anon_id")?.as_str().to_string();
            let stack: u64 = c.name("stack")?.as_str().parse().ok()?;
            Some(Seat::new(number, anon_id, stack))
        })
        .collect();
    if seats.is_empty() {
        return Err("no parseable seat lines".to_string());
    }

    let mut actions = Vec::new();
    for caps in patterns.action_line.captures_iter(block) {
        let actor = caps.name("actor").unwrap().as_str().to_string();
        let verb = caps.name("verb").unwrap().as_str();
        let amount: Option<u64> = caps.name("amount").and_then(|m| m.as_str().parse().ok());
        let kind = match verb {
            "posts small blind" => ActionKind::PostsSmallBlind,
            "posts big blind" => ActionKind::PostsBigBlind,
            "posts the ante" => ActionKind::PostsAnte,
            "folds" => ActionKind::Folds,
            "calls" => ActionKind::Calls,
            "raises to" => ActionKind::RaisesTo,
            "bets" => ActionKind::Bets,
            "checks" => ActionKind::Checks,
            "shows" => ActionKind::Shows,
            "mucks" => ActionKind::Mucks,
            _ => continue,
        };
        actions.push(Action::new(actor, kind, amount));
    }
    for caps in patterns.collected_line.captures_iter(block) {
        let actor = caps.name("actor").unwrap().as_str().to_string();
        let amount: Option<u64> = caps.name("amount").and_then(|m| m.as_str().parse().ok());
        actions.push(Action::new(actor, ActionKind::Collected, amount));
    }
    for caps in patterns.uncalled_line.captures_iter(block) {
        let actor = caps.name("actor").unwrap().as_str().to_string();
        let amount: Option<u64> = caps.name("amount").and_then(|m| m.as_str().parse().ok());
        actions.push(Action::new(actor, ActionKind::UncalledReturn, amount));
    }

    let board: Vec<String> = patterns
        .board_cards
        .captures_iter(block)
        .flat_map(|c| {
            c.name("cards")
                .unwrap()
                .as_str()
                .split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect();

    assign_roles(&mut seats, &actions, header_button_seat, block, patterns);

    let hero_hole_cards = patterns
        .dealt_to
        .captures(block)
        .map(|c| {
            c.name("cards")
                .unwrap()
                .as_str()
                .split_whitespace()
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let hand = Hand {
        hand_id,
        source_file: String::new(),
        table_id,
        timestamp,
        seats,
        board,
        actions,
        hero_hole_cards,
        raw_text: block.to_string(),
    };
    hand.validate()?;
    Ok(hand)
}

/// Small blind / big blind roles come from who posted them; the button
/// comes from the header's "Seat #N is the button" or the summary's button
/// marker. Heads-up hands tag a single seat with both blind roles.
fn assign_roles(
    seats: &mut [Seat],
    actions: &[Action],
    header_button_seat: Option<u32>,
    block: &str,
    patterns: &Patterns,
) {
    let sb_actor = actions
        .iter()
        .find(|a| a.kind == ActionKind::PostsSmallBlind)
        .map(|a| a.seat_anon_id.clone());
    let bb_actor = actions
        .iter()
        .find(|a| a.kind == ActionKind::PostsBigBlind)
        .map(|a| a.seat_anon_id.clone());

    let button_seat_no = header_button_seat.or_else(|| {
        patterns
            .summary_button
            .captures(block)
            .and_then(|c| c.name("seat_no"))
            .and_then(|m| m.as_str().parse().ok())
    });

    let by_number: HashMap<u32, usize> = seats
        .iter()
        .enumerate()
        .map(|(i, s)| (s.number, i))
        .collect();

    if let Some(sb) = sb_actor {
        if let Some(seat) = seats.iter_mut().find(|s| s.anon_id == sb) {
            if !seat.roles.contains(&Role::SmallBlind) {
                seat.roles.push(Role::SmallBlind);
            }
        }
    }
    if let Some(bb) = bb_actor {
        if let Some(seat) = seats.iter_mut().find(|s| s.anon_id == bb) {
            if !seat.roles.contains(&Role::BigBlind) {
                seat.roles.push(Role::BigBlind);
            }
        }
    }
    if let Some(no) = button_seat_no {
        if let Some(&idx) = by_number.get(&no) {
            if !seats[idx].roles.contains(&Role::Button) {
                seats[idx].roles.push(Role::Button);
            }
        }
    } else if seats.len() == 2 {
        // Heads-up without an explicit button marker: the small blind is
        // also the button.
        if let Some(seat) = seats.iter_mut().find(|s| s.roles.contains(&Role::SmallBlind)) {
            if !seat.roles.contains(&Role::Button) {
                seat.roles.push(Role::Button);
            }
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, "%Y/%m/%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;

    const SAMPLE: &str = "Hand #HD100200300: Hold'em No Limit ($1/$2) - 2024/01/15 21:03:45 UTC\n\
Table 'Ring 5' 6-max Seat #3 is the button\n\
Seat 1: a11111 ($200 in chips)\n\
Seat 2: b22222 ($200 in chips)\n\
Seat 3: hero ($200 in chips)\n\
Dealt to hero [Ah Kd]\n\
a11111: posts small blind $1\n\
b22222: posts big blind $2\n\
hero: raises to $6\n\
a11111: folds\n\
b22222: calls $4\n\
*** FLOP *** [Ah Kd 2c]\n\
b22222: checks\n\
hero: bets $8\n\
b22222: folds\n\
Uncalled bet ($8) returned to hero\n\
hero collected $14 from pot\n\
*** SUMMARY ***\n\
Seat 1: a11111 folded before Flop\n\
Seat 2: b22222 folded on the Flop\n\
Seat 3: hero collected ($14)\n";

    #[test]
    fn parses_a_single_hand_with_roles() {
        let outcome = parse_file("sample.txt", SAMPLE, 0);
        assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
        assert_eq!(outcome.hands.len(), 1);
        let hand = &outcome.hands[0];
        assert_eq!(hand.hand_id, "100200300");
        assert_eq!(hand.table_id, "Ring 5");
        assert_eq!(hand.seats.len(), 3);
        assert!(hand.seat("a11111").unwrap().has_role(Role::SmallBlind));
        assert!(hand.seat("b22222").unwrap().has_role(Role::BigBlind));
        assert!(hand.seat("hero").unwrap().has_role(Role::Button));
        assert_eq!(hand.board, vec!["Ah", "Kd", "2c"]);
        assert_eq!(hand.hero_hole_cards, vec!["Ah", "Kd"]);
    }

    #[test]
    fn heads_up_tags_both_roles_on_one_seat() {
        let raw = "Hand #HD1: Hold'em No Limit ($1/$2) - 2024/01/15 21:03:45 UTC\n\
Seat 1: hero ($200 in chips)\n\
Seat 2: ff00ee ($200 in chips)\n\
hero: posts small blind $1\n\
ff00ee: posts big blind $2\n\
hero: folds\n\
*** SUMMARY ***\n\
Seat 1: hero folded before Flop\n\
Seat 2: ff00ee collected ($2)\n";
        let outcome = parse_file("hu.txt", raw, 1);
        assert_eq!(outcome.hands.len(), 1);
        let hand = &outcome.hands[0];
        let hero = hand.seat("hero").unwrap();
        assert!(hero.has_role(Role::Button));
        assert!(hero.has_role(Role::SmallBlind));
    }

    #[test]
    fn skips_a_malformed_hand_without_poisoning_the_file() {
        let malformed = "Hand #HD999: Hold'em No Limit ($1/$2) - 2024/01/15 21:03:45 UTC\n\
garbled seat block, no recognizable seat lines here\n";
        let raw = format!("{malformed}\n{SAMPLE}");
        let outcome = parse_file("mixed.txt", &raw, 2);
        assert_eq!(outcome.hands.len(), 1);
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[test]
    fn missing_table_identifier_synthesizes_stable_unknown_table() {
        let raw = "Hand #HD1: Hold'em No Limit ($1/$2) - 2024/01/15 21:03:45 UTC\n\
Seat 1: hero ($200 in chips)\n\
Seat 2: ff00ee ($200 in chips)\n\
hero: posts small blind $1\n\
ff00ee: posts big blind $2\n\
*** SUMMARY ***\n\
Seat 1: hero\nSeat 2: ff00ee\n";
        let a = parse_file("f.txt", raw, 7).hands;
        let b = parse_file("f.txt", raw, 7).hands;
        assert_eq!(a[0].table_id, b[0].table_id);
        assert!(a[0].table_id.starts_with("unknown_table_"));
    }
}
