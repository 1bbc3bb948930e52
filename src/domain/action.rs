use serde::{Deserialize, Serialize};

/// One action line. `seat_anon_id` is the actor identifier recognized
/// alongside the verb.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub seat_anon_id: String,
    pub kind: ActionKind,
    pub amount: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    PostsSmallBlind,
    PostsBigBlind,
    PostsAnte,
    Folds,
    Calls,
    RaisesTo,
    Bets,
    Checks,
    Shows,
    Mucks,
    Collected,
    UncalledReturn,
}

impl Action {
    pub fn new(seat_anon_id: impl Into<String>, kind: ActionKind, amount: Option<u64>) -> Self {
        Self {
            seat_anon_id: seat_anon_id.into(),
            kind,
            amount,
        }
    }
}
