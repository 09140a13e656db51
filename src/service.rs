//! Read facade consumed by the route layer.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::challenges::ChallengeKind;
use crate::db::{ChallengeConfigEntry, ChallengeProgress, ChampionMastery, Repository, StoredMatch};
use crate::error::AppError;
use crate::jobs::{RefreshOptions, RefreshPipeline, RefreshReport};
use crate::riot::Platform;
use crate::sync::{Resolution, RiotId, SyncContext};

#[derive(Debug, Clone)]
pub struct StatsService {
    sync: SyncContext,
    pipeline: RefreshPipeline,
}

impl StatsService {
    pub fn new(sync: SyncContext, pipeline: RefreshPipeline) -> Self {
        Self { sync, pipeline }
    }

    fn db(&self) -> &Repository {
        self.sync.db()
    }

    /// Summoner by Riot ID, served from cache while fresh. `NotFound` and
    /// rate limits reach the caller unchanged.
    pub async fn summoner(
        &self,
        game_name: &str,
        tag_line: &str,
        platform: Platform,
        force: bool,
    ) -> Result<Resolution, AppError> {
        self.sync
            .resolve(&RiotId::new(game_name, tag_line, platform), force)
            .await
    }

    pub async fn last_mastery_update(&self, puuid: &str) -> Result<Option<DateTime<Utc>>, AppError> {
        self.db().last_mastery_update(puuid).await
    }

    /// Riot-scored challenge progress keyed by challenge id. `None` when the
    /// player is unknown or was never synced; an empty map when synced
    /// without any challenge.
    #[instrument(skip(self))]
    pub async fn player_progress(
        &self,
        game_name: &str,
        tag_line: &str,
        platform: Platform,
    ) -> Result<Option<HashMap<i64, ChallengeProgress>>, AppError> {
        let Some(summoner) = self
            .db()
            .get_summoner_by_riot_id(game_name, tag_line, platform)
            .await?
        else {
            return Ok(None);
        };

        self.db().get_challenge_progress(&summoner.puuid).await
    }

    pub async fn challenge_configs(&self, locale: &str) -> Result<Vec<ChallengeConfigEntry>, AppError> {
        self.db().list_challenge_configs(locale).await
    }

    pub async fn champion_set(
        &self,
        kind: ChallengeKind,
        puuid: &str,
    ) -> Result<BTreeSet<i64>, AppError> {
        self.db().achievement_champions(kind, puuid).await
    }

    pub async fn masteries(&self, puuid: &str) -> Result<Vec<ChampionMastery>, AppError> {
        self.db().get_masteries(puuid).await
    }

    pub async fn recent_matches(&self, puuid: &str, limit: u32) -> Result<Vec<StoredMatch>, AppError> {
        self.db().recent_matches(puuid, limit).await
    }

    pub async fn refresh(
        &self,
        target: RiotId,
        options: RefreshOptions,
    ) -> Result<RefreshReport, AppError> {
        Ok(self.pipeline.refresh(target, options).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::jobs::{JobQueue, QueueSettings};
    use crate::sync::SyncSettings;
    use crate::test_support::{FakeRiot, memory_repository, participant, rift_match};

    async fn service(riot: Arc<FakeRiot>) -> StatsService {
        let db = memory_repository().await;
        let sync = SyncContext::new(db, riot, SyncSettings::default());
        let queue = JobQueue::new(QueueSettings {
            workers: 2,
            max_attempts: 1,
            backoff: Duration::from_millis(1),
        });
        queue.start(Arc::new(sync.clone()));
        StatsService::new(sync, RefreshPipeline::new(queue))
    }

    #[tokio::test]
    async fn progress_is_none_before_the_first_sync() {
        let riot = FakeRiot::new();
        riot.add_account("P", "Foo", "EUW");
        let service = service(riot).await;

        assert!(
            service
                .player_progress("Foo", "EUW", Platform::EUW1)
                .await
                .unwrap()
                .is_none()
        );

        service
            .summoner("Foo", "EUW", Platform::EUW1, false)
            .await
            .unwrap();
        assert!(
            service
                .player_progress("Foo", "EUW", Platform::EUW1)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn full_refresh_fills_every_read_endpoint() {
        let riot = FakeRiot::new();
        riot.add_account("P", "Foo", "EUW");
        riot.set_masteries("P", vec![crate::test_support::mastery(103, 9_000)]);
        riot.add_match("P", rift_match("EUW1_1", 0, vec![participant("P", 103, true)]));
        let service = service(riot).await;

        let report = service
            .refresh(
                RiotId::new("Foo", "EUW", Platform::EUW1),
                RefreshOptions::critical().with_matches(),
            )
            .await
            .unwrap();
        assert!(report.success());

        let progress = service
            .player_progress("foo", "euw", Platform::EUW1)
            .await
            .unwrap()
            .unwrap();
        assert!(progress.contains_key(&401106));
        assert!(service.last_mastery_update("P").await.unwrap().is_some());
        assert_eq!(service.masteries("P").await.unwrap().len(), 1);
        assert_eq!(service.recent_matches("P", 5).await.unwrap().len(), 1);
        assert_eq!(service.challenge_configs("en_US").await.unwrap().len(), 1);
        assert_eq!(
            service
                .champion_set(ChallengeKind::JackOfAllChamps, "P")
                .await
                .unwrap(),
            BTreeSet::from([103])
        );
    }
}
