use serde::{Deserialize, Serialize};

/// Positional role. At most one seat per hand carries each role, except in
/// heads-up hands where the button seat and the small-blind seat coincide
/// and must carry both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Button,
    SmallBlind,
    BigBlind,
}

/// The reserved identifier marking the uploading user's own seat.
pub const HERO_PLACEHOLDER: &str = "hero";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    /// 1-based, unique within a hand.
    pub number: u32,
    /// Opaque per-seat token: typically 6-8 hex characters, or
    /// [`HERO_PLACEHOLDER`] for the uploading user's own seat.
    pub anon_id: String,
    pub starting_stack: u64,
    /// A seat may carry more than one role only in the heads-up case
    /// (button and small blind coincide).
    pub roles: Vec<Role>,
}

impl Seat {
    pub fn new(number: u32, anon_id: impl Into<String>, starting_stack: u64) -> Self {
        Self {
            number,
            anon_id: anon_id.into(),
            starting_stack,
            roles: Vec::new(),
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        if !self.roles.contains(&role) {
            self.roles.push(role);
        }
        self
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_hero(&self) -> bool {
        self.anon_id == HERO_PLACEHOLDER
    }
}
