use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::MatchSubset;
use crate::riot::types::ParticipantDto;

/// Start of the 2024 split 3 season, 2024-09-18T00:00:00Z.
const SPLIT_3_2024_START_MS: i64 = 1_726_617_600_000;

/// Locally computed challenges. Each one owns an achievement table holding
/// the champions that satisfy it for a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChallengeKind {
    /// Win a Summoner's Rift game with every champion.
    JackOfAllChamps,
    /// Win an Arena game with every champion.
    ChampionOcean,
    /// Win with every champion since 2024 split 3 started.
    ChampionOcean2024Split3,
    /// Take first place in Arena with every champion.
    AdaptToAllSituations,
    /// Win a Summoner's Rift game without dying, with every champion.
    Invincible,
}

impl ChallengeKind {
    pub const ALL: [ChallengeKind; 5] = [
        Self::JackOfAllChamps,
        Self::ChampionOcean,
        Self::ChampionOcean2024Split3,
        Self::AdaptToAllSituations,
        Self::Invincible,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JackOfAllChamps => "jack-of-all-champs",
            Self::ChampionOcean => "champion-ocean",
            Self::ChampionOcean2024Split3 => "champion-ocean-2024-split3",
            Self::AdaptToAllSituations => "adapt-to-all-situations",
            Self::Invincible => "invincible",
        }
    }

    pub(crate) fn table_name(&self) -> &'static str {
        match self {
            Self::JackOfAllChamps => "challenge_heroes",
            Self::ChampionOcean => "challenges_champion_ocean",
            Self::ChampionOcean2024Split3 => "challenges_champion_ocean_2024_split3",
            Self::AdaptToAllSituations => "challenges_adapt_to_all_situations",
            Self::Invincible => "challenges_invincible",
        }
    }

    pub fn subset(&self) -> MatchSubset {
        match self {
            Self::JackOfAllChamps | Self::Invincible => MatchSubset::SummonersRift,
            Self::ChampionOcean | Self::AdaptToAllSituations => MatchSubset::Arena,
            Self::ChampionOcean2024Split3 => MatchSubset::StartedSince(
                DateTime::<Utc>::from_timestamp_millis(SPLIT_3_2024_START_MS)
                    .unwrap_or(DateTime::UNIX_EPOCH),
            ),
        }
    }

    /// Whether one participation counts toward this challenge.
    pub fn qualifies(&self, participant: &ParticipantDto) -> bool {
        match self {
            Self::JackOfAllChamps | Self::ChampionOcean | Self::ChampionOcean2024Split3 => {
                participant.win
            }
            Self::AdaptToAllSituations => participant.placement == 1,
            Self::Invincible => participant.win && participant.deaths == 0,
        }
    }
}

impl fmt::Display for ChallengeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChallengeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown challenge: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in ChallengeKind::ALL {
            assert_eq!(kind.as_str().parse::<ChallengeKind>().unwrap(), kind);
        }
        assert!("nope".parse::<ChallengeKind>().is_err());
    }

    #[test]
    fn split_cutoff_is_september_18th() {
        let MatchSubset::StartedSince(at) = ChallengeKind::ChampionOcean2024Split3.subset() else {
            panic!("expected a time-bounded subset");
        };
        assert_eq!(at.to_rfc3339(), "2024-09-18T00:00:00+00:00");
    }
}
