//! Updaters that pull data from the Riot API into the store. Job handlers
//! and the read facade both go through [`SyncContext`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::challenges::{AchievementRebuilder, AggregationReport, PuuidLocks};
use crate::config::Config;
use crate::db::Repository;
use crate::error::AppError;
use crate::riot::{Platform, RiotApi};

mod mastery;
mod matches;
mod player_challenges;
mod reference;
mod summoner;

pub use matches::MatchSyncStats;
pub use summoner::Resolution;

/// A player as the UI addresses them: display name, tag and platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RiotId {
    pub game_name: String,
    pub tag_line: String,
    pub platform: Platform,
}

impl RiotId {
    pub fn new(game_name: impl Into<String>, tag_line: impl Into<String>, platform: Platform) -> Self {
        Self {
            game_name: game_name.into(),
            tag_line: tag_line.into(),
            platform,
        }
    }
}

impl fmt::Display for RiotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.game_name, self.tag_line)
    }
}

#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub stale_after: chrono::Duration,
    pub match_page_size: u32,
    pub max_match_pages: u32,
}

impl SyncSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            stale_after: chrono::Duration::from_std(config.summoner_stale_after)
                .unwrap_or_else(|_| chrono::Duration::hours(1)),
            match_page_size: config.match_page_size.clamp(1, 100),
            max_match_pages: config.max_match_pages.max(1),
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[derive(Debug, Clone)]
pub struct SyncContext {
    db: Repository,
    riot: Arc<dyn RiotApi>,
    settings: SyncSettings,
    achievements: AchievementRebuilder,
}

impl SyncContext {
    pub fn new(db: Repository, riot: Arc<dyn RiotApi>, settings: SyncSettings) -> Self {
        let achievements = AchievementRebuilder::new(db.clone(), PuuidLocks::default());
        Self {
            db,
            riot,
            settings,
            achievements,
        }
    }

    pub fn db(&self) -> &Repository {
        &self.db
    }

    pub fn achievements(&self) -> &AchievementRebuilder {
        &self.achievements
    }

    /// Force a summoner refresh, fetch the whole reachable match history,
    /// then rebuild every achievement set.
    #[instrument(skip(self, target), fields(riot_id = %target))]
    pub async fn refresh_and_rebuild_all(
        &self,
        target: &RiotId,
    ) -> Result<AggregationReport, AppError> {
        let resolution = self.resolve(target, true).await?;
        let stats = self.sync_matches(&resolution.summoner, true).await?;
        info!(fetched = stats.fetched, "🏆 Match history ready for aggregation");

        Ok(self.achievements.rebuild_all(&resolution.summoner.puuid).await)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::challenges::ChallengeKind;
    use crate::test_support::{FakeRiot, memory_repository, participant, rift_match};

    #[test]
    fn riot_id_displays_with_hash() {
        let id = RiotId::new("Foo", "EUW", Platform::EUW1);
        assert_eq!(id.to_string(), "Foo#EUW");
    }

    #[test]
    fn settings_clamp_page_size() {
        let config = Config {
            match_page_size: 500,
            max_match_pages: 0,
            ..Config::default()
        };
        let settings = SyncSettings::from_config(&config);
        assert_eq!(settings.match_page_size, 100);
        assert_eq!(settings.max_match_pages, 1);
    }

    #[tokio::test]
    async fn refresh_and_rebuild_all_pulls_matches_first() {
        let db = memory_repository().await;
        let riot = FakeRiot::new();
        riot.add_account("P", "Foo", "EUW");
        riot.add_match("P", rift_match("EUW1_1", 10, vec![participant("P", 103, true)]));
        riot.add_match("P", rift_match("EUW1_2", 20, vec![participant("P", 7, false)]));

        let ctx = SyncContext::new(db.clone(), riot.clone(), SyncSettings::default());
        let report = ctx
            .refresh_and_rebuild_all(&RiotId::new("Foo", "EUW", Platform::EUW1))
            .await
            .unwrap();

        assert!(report.success());
        assert_eq!(
            db.achievement_champions(ChallengeKind::JackOfAllChamps, "P")
                .await
                .unwrap()
                .into_iter()
                .collect::<Vec<_>>(),
            vec![103]
        );
        let summoner = db.get_summoner_by_puuid("P").await.unwrap().unwrap();
        assert!(!summoner.is_stale(Utc::now(), chrono::Duration::minutes(1)));
    }
}
