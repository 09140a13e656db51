//! Refresh jobs: what they are, how they are queued, and how a refresh
//! request fans out into them.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::challenges::AggregationReport;
use crate::error::AppError;
use crate::sync::{MatchSyncStats, RiotId};

mod handlers;
mod pipeline;
mod queue;

pub use pipeline::{JobReport, RefreshOptions, RefreshPipeline, RefreshReport};
pub use queue::{JobExecutor, JobHandle, JobQueue, JobResult, QueueSettings};

/// Every stage of a summoner refresh. Lower priority values are scheduled
/// first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    UpdateSummonerOnly,
    UpdateChampionDetails,
    UpdateChallengesConfig,
    UpdateMastery,
    UpdateMatches,
    UpdateChallenges,
    RunChallengesComputation,
}

impl JobKind {
    pub const ALL: [JobKind; 7] = [
        Self::UpdateSummonerOnly,
        Self::UpdateChampionDetails,
        Self::UpdateChallengesConfig,
        Self::UpdateMastery,
        Self::UpdateMatches,
        Self::UpdateChallenges,
        Self::RunChallengesComputation,
    ];

    pub fn priority(&self) -> u8 {
        match self {
            Self::UpdateSummonerOnly => 1,
            Self::UpdateChampionDetails => 2,
            Self::UpdateChallengesConfig => 3,
            Self::UpdateMastery => 4,
            Self::UpdateMatches => 5,
            Self::UpdateChallenges => 20,
            Self::RunChallengesComputation => 21,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::UpdateSummonerOnly => "update-summoner-only",
            Self::UpdateChampionDetails => "update-champion-details",
            Self::UpdateChallengesConfig => "update-challenges-config",
            Self::UpdateMastery => "update-mastery",
            Self::UpdateMatches => "update-matches",
            Self::UpdateChallenges => "update-challenges",
            Self::RunChallengesComputation => "run-challenges-computation",
        }
    }

    /// Jobs that read what `update-matches` wrote and therefore only start
    /// once it has finished.
    pub fn depends_on_matches(&self) -> bool {
        matches!(self, Self::UpdateChallenges | Self::RunChallengesComputation)
    }

    /// Jobs working on one player's data. They start once
    /// `update-summoner-only` has resolved the player's puuid.
    pub fn depends_on_summoner(&self) -> bool {
        matches!(self, Self::UpdateMastery | Self::UpdateMatches) || self.depends_on_matches()
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Uniqueness token of a job: `kind:gameName:tagLine:timestampMillis`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct JobId(String);

impl JobId {
    pub fn new(kind: JobKind, target: &RiotId, at: DateTime<Utc>) -> Self {
        Self(format!(
            "{}:{}:{}:{}",
            kind.name(),
            target.game_name,
            target.tag_line,
            at.timestamp_millis()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity and flags carried by every job of one refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPayload {
    pub target: RiotId,
    pub force_refresh: bool,
    /// Page through the whole reachable match history instead of the
    /// latest page only.
    pub exhaustive_matches: bool,
    /// Puuid resolved by `update-summoner-only`. Per-player jobs load the
    /// summoner by it, so a renamed account keeps working under its old name.
    #[serde(default)]
    pub puuid: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: JobId,
    pub kind: JobKind,
    pub payload: JobPayload,
}

impl Job {
    pub fn new(kind: JobKind, payload: JobPayload, at: DateTime<Utc>) -> Self {
        Self {
            id: JobId::new(kind, &payload.target, at),
            kind,
            payload,
        }
    }
}

/// What a successful job produced, one variant per kind.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutput {
    Summoner {
        puuid: String,
        riot_id: String,
        new_username: Option<String>,
    },
    ChampionDetails {
        stored: usize,
    },
    ChallengesConfig {
        stored: usize,
    },
    Mastery {
        stored: usize,
    },
    Matches(MatchSyncStats),
    Achievements(AggregationReport),
    ChallengeScores {
        challenges: usize,
    },
}

/// Cloneable outcome of a failed job, observed by every awaiter.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} failed: {message}")]
pub struct JobFailure {
    pub kind: JobKind,
    pub message: String,
    /// Worth another attempt later.
    pub transient: bool,
    pub retry_after: Option<Duration>,
}

impl JobFailure {
    pub fn from_error(kind: JobKind, error: &AppError) -> Self {
        let retry_after = match error {
            AppError::Riot(e) => e.retry_after(),
            _ => None,
        };
        Self {
            kind,
            message: error.to_string(),
            transient: error.is_transient(),
            retry_after,
        }
    }

    pub fn permanent(kind: JobKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            transient: false,
            retry_after: None,
        }
    }

    pub(crate) fn cancelled(kind: JobKind) -> Self {
        Self::permanent(kind, QueueError::Closed.to_string())
    }

    pub(crate) fn dropped(kind: JobKind) -> Self {
        Self::permanent(kind, QueueError::Dropped.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("job queue is shut down")]
    Closed,
    #[error("job was dropped before completing")]
    Dropped,
}
