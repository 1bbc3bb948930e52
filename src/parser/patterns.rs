use regex::Regex;
use std::sync::OnceLock;

/// Compiled once per process. These patterns accept the variant
/// documented in `parser::tests` and are the single place a new variant
/// gets added.
pub struct Patterns {
    pub header: Regex,
    pub table: Regex,
    pub seat_line: Regex,
    pub action_line: Regex,
    pub collected_line: Regex,
    pub uncalled_line: Regex,
    pub board_cards: Regex,
    pub summary_button: Regex,
    pub dealt_to: Regex,
}

impl Patterns {
    pub fn get() -> &'static Patterns {
        static PATTERNS: OnceLock<Patterns> = OnceLock::new();
        PATTERNS.get_or_init(Patterns::compile)
    }

    fn compile() -> Self {
        Self {
            header: Regex::new(
                r"Hand #(?P<hand_id>\S+): .* - (?P<timestamp>\d{4}/\d{2}/\d{2} \d{2}:\d{2}:\d{2})",
            )
            .unwrap(),
            table: Regex::new(
                r"(?m)^Table '(?P<table_id>[^']+)'.*?(?:Seat #(?P<button_seat>\d+) is the button)?$",
            )
            .unwrap(),
            seat_line: Regex::new(
                r"(?m)^Seat (?P<seat_no>\d+): (?P<anon_id>\S+) \(\$(?P<stack>\d+) in chips\)",
            )
            .unwrap(),
            action_line: Regex::new(
                r"(?m)^(?P<actor>\S+): (?P<verb>posts small blind|posts big blind|posts the ante|folds|calls|raises to|bets|checks|shows|mucks)(?: \$(?P<amount>\d+))?",
            )
            .unwrap(),
            collected_line: Regex::new(r"(?m)^(?P<actor>\S+) collected \$(?P<amount>\d+)").unwrap(),
            uncalled_line: Regex::new(
                r"(?m)^Uncalled bet \(\$(?P<amount>\d+)\) returned to (?P<actor>\S+)",
            )
            .unwrap(),
            board_cards: Regex::new(r"\*\*\* (?:FLOP|TURN|RIVER) \*\*\* \[(?P<cards>[^\]]+)\]")
                .unwrap(),
            summary_button: Regex::new(r"(?m)^Seat (?P<seat_no>\d+): \S+.*\(button\)").unwrap(),
            dealt_to: Regex::new(r"(?m)^Dealt to (?P<anon_id>\S+) \[(?P<cards>[^\]]+)\]").unwrap(),
        }
    }
}
