//! Data model: `Hand`, `Seat`, `Screenshot`, `MatchRecord`, `TableMapping`,
//! `Job`. Plain records throughout, with the parsing/classification logic
//! that touches them living in their owning modules rather than here.

mod action;
mod hand;
mod job;
mod match_record;
mod screenshot;
mod seat;
mod table_mapping;

pub use action::{Action, ActionKind};
pub use hand::Hand;
pub use job::{Classification, Job, JobRecord, JobStage, RewrittenFile, RewrittenHand, ScreenshotOutcome};
pub use match_record::MatchRecord;
pub use screenshot::{OcrAOutcome, OcrBOutcome, OcrBPayload, PlayerRecord, Screenshot, ScreenshotSource};
pub use seat::{Role, Seat};
pub use table_mapping::TableMapping;
