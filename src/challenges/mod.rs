//! Locally computed achievements: which champions satisfy each custom
//! challenge for a player, recomputed from the stored match history.

mod engine;
mod kind;

pub use engine::{AchievementRebuilder, AggregationReport, PuuidLocks, qualifying_champions};
pub use kind::ChallengeKind;
