use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, instrument, warn};

use super::ChallengeKind;
use crate::db::{Repository, StoredMatch};
use crate::error::AppError;
use crate::riot::Platform;

/// Distinct champions of `puuid` that satisfy `kind` across `matches`.
/// Matches outside the kind's subset are ignored.
pub fn qualifying_champions(
    kind: ChallengeKind,
    puuid: &str,
    matches: &[StoredMatch],
) -> BTreeSet<i64> {
    let subset = kind.subset();
    matches
        .iter()
        .filter(|m| subset.contains(m))
        .flat_map(|m| m.participants.iter())
        .filter(|p| p.puuid == puuid && kind.qualifies(p))
        .map(|p| p.champion_id)
        .collect()
}

/// One async mutex per puuid so rebuilds of the same player never interleave.
#[derive(Debug, Clone, Default)]
pub struct PuuidLocks {
    inner: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl PuuidLocks {
    pub async fn lock(&self, puuid: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.retain(|_, m| Arc::strong_count(m) > 1);
            map.entry(puuid.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }
}

/// Outcome of running every challenge rebuild for one player.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationReport {
    pub outcomes: Vec<(ChallengeKind, Result<usize, String>)>,
}

impl AggregationReport {
    pub fn success(&self) -> bool {
        self.outcomes.iter().all(|(_, r)| r.is_ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = ChallengeKind> + '_ {
        self.outcomes
            .iter()
            .filter(|(_, r)| r.is_err())
            .map(|(kind, _)| *kind)
    }
}

#[derive(Debug, Clone)]
pub struct AchievementRebuilder {
    db: Repository,
    locks: PuuidLocks,
}

impl AchievementRebuilder {
    pub fn new(db: Repository, locks: PuuidLocks) -> Self {
        Self { db, locks }
    }

    /// Recompute and fully replace the champion set of `kind` for `puuid`.
    #[instrument(skip(self))]
    pub async fn rebuild(&self, kind: ChallengeKind, puuid: &str) -> Result<BTreeSet<i64>, AppError> {
        let _guard = self.locks.lock(puuid).await;

        let matches = self.db.matches_for(puuid, kind.subset()).await?;
        let champions = qualifying_champions(kind, puuid, &matches);

        self.db
            .replace_achievement_champions(kind, puuid, &champions)
            .await?;

        info!(
            scanned = matches.len(),
            champions = champions.len(),
            "🏆 Achievement set rebuilt"
        );
        Ok(champions)
    }

    /// Same as [`Self::rebuild`] but addressed by Riot ID. Fails fast when
    /// the summoner is not cached.
    pub async fn rebuild_by_riot_id(
        &self,
        kind: ChallengeKind,
        game_name: &str,
        tag_line: &str,
        platform: Platform,
    ) -> Result<BTreeSet<i64>, AppError> {
        let summoner = self
            .db
            .get_summoner_by_riot_id(game_name, tag_line, platform)
            .await?
            .ok_or_else(|| AppError::SummonerNotFound {
                game_name: game_name.to_string(),
                tag_line: tag_line.to_string(),
            })?;

        self.rebuild(kind, &summoner.puuid).await
    }

    /// Run every challenge rebuild in sequence. A failing kind does not stop
    /// the others.
    #[instrument(skip(self))]
    pub async fn rebuild_all(&self, puuid: &str) -> AggregationReport {
        let mut report = AggregationReport::default();

        for kind in ChallengeKind::ALL {
            let outcome = match self.rebuild(kind, puuid).await {
                Ok(champions) => Ok(champions.len()),
                Err(e) => {
                    warn!(error = %e, kind = %kind, "🏆 ⚠️ Achievement rebuild failed");
                    Err(e.to_string())
                }
            };
            report.outcomes.push((kind, outcome));
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::db::MatchSubset;
    use crate::riot::types::ParticipantDto;
    use crate::test_support::{
        arena_match, memory_repository, participant, rift_match, seed_summoner, store_match,
        stored,
    };

    const SPLIT_3_MS: i64 = 1_726_617_600_000;

    fn flawless(puuid: &str, champion_id: i64) -> ParticipantDto {
        ParticipantDto {
            puuid: puuid.to_string(),
            champion_id,
            champion_name: String::new(),
            team_id: 100,
            win: true,
            kills: 3,
            deaths: 0,
            assists: 4,
            placement: 1,
        }
    }

    #[test]
    fn predicates_follow_each_kind() {
        // Champion 1 wins flawlessly in Arena (1st place) and on the Rift.
        // Champion 2 only wins on the Rift with deaths.
        let mut rift_loss_free = flawless("T", 1);
        rift_loss_free.placement = 0;
        let mut rift_with_deaths = flawless("T", 2);
        rift_with_deaths.deaths = 4;
        rift_with_deaths.placement = 0;

        let matches = vec![
            stored(&arena_match("A", SPLIT_3_MS - 1, vec![flawless("T", 1)])),
            stored(&rift_match(
                "R",
                SPLIT_3_MS - 1,
                vec![rift_loss_free, rift_with_deaths],
            )),
        ];

        let expect = |kind, champions: &[i64]| {
            assert_eq!(
                qualifying_champions(kind, "T", &matches),
                champions.iter().copied().collect::<BTreeSet<_>>(),
                "{kind}"
            );
        };

        expect(ChallengeKind::JackOfAllChamps, &[1, 2]);
        expect(ChallengeKind::ChampionOcean, &[1]);
        expect(ChallengeKind::AdaptToAllSituations, &[1]);
        expect(ChallengeKind::Invincible, &[1]);
        // Both matches predate the split.
        expect(ChallengeKind::ChampionOcean2024Split3, &[]);
    }

    #[test]
    fn jack_of_all_champs_ignores_arena_wins() {
        let matches = vec![stored(&arena_match("A", 0, vec![flawless("T", 1)]))];
        assert!(qualifying_champions(ChallengeKind::JackOfAllChamps, "T", &matches).is_empty());
        assert_eq!(
            qualifying_champions(ChallengeKind::ChampionOcean, "T", &matches),
            BTreeSet::from([1])
        );
    }

    #[test]
    fn arena_placement_without_first_is_excluded() {
        let mut second = flawless("T", 9);
        second.placement = 2;
        let matches = vec![stored(&arena_match("A", 0, vec![second]))];

        assert!(
            qualifying_champions(ChallengeKind::AdaptToAllSituations, "T", &matches).is_empty()
        );
        assert_eq!(
            qualifying_champions(ChallengeKind::ChampionOcean, "T", &matches),
            BTreeSet::from([9])
        );
    }

    #[test]
    fn split_window_counts_any_mode_after_cutoff() {
        let matches = vec![
            stored(&arena_match("A", SPLIT_3_MS, vec![flawless("T", 1)])),
            stored(&rift_match("R", SPLIT_3_MS + 10, vec![participant("T", 2, true)])),
            stored(&rift_match("Old", SPLIT_3_MS - 10, vec![participant("T", 3, true)])),
        ];

        assert_eq!(
            qualifying_champions(ChallengeKind::ChampionOcean2024Split3, "T", &matches),
            BTreeSet::from([1, 2])
        );
    }

    #[test]
    fn duplicates_collapse_and_other_players_are_ignored() {
        let matches = vec![
            stored(&rift_match("R1", 0, vec![participant("T", 103, true)])),
            stored(&rift_match(
                "R2",
                1,
                vec![participant("T", 103, true), participant("other", 7, true)],
            )),
        ];

        assert_eq!(
            qualifying_champions(ChallengeKind::JackOfAllChamps, "T", &matches),
            BTreeSet::from([103])
        );
    }

    #[tokio::test]
    async fn rebuild_is_idempotent() {
        let db = memory_repository().await;
        seed_summoner(&db, "T", "Foo", "EUW", Utc::now()).await;
        store_match(&db, &rift_match("R1", 0, vec![participant("T", 103, true)])).await;
        store_match(&db, &rift_match("R2", 1, vec![participant("T", 103, true)])).await;
        store_match(&db, &rift_match("R3", 2, vec![participant("T", 22, false)])).await;

        let rebuilder = AchievementRebuilder::new(db.clone(), PuuidLocks::default());
        let first = rebuilder
            .rebuild(ChallengeKind::JackOfAllChamps, "T")
            .await
            .unwrap();
        let second = rebuilder
            .rebuild(ChallengeKind::JackOfAllChamps, "T")
            .await
            .unwrap();

        assert_eq!(first, BTreeSet::from([103]));
        assert_eq!(first, second);
        assert_eq!(
            db.achievement_champions(ChallengeKind::JackOfAllChamps, "T")
                .await
                .unwrap(),
            BTreeSet::from([103])
        );
    }

    #[tokio::test]
    async fn rebuild_replaces_previous_set() {
        let db = memory_repository().await;
        seed_summoner(&db, "T", "Foo", "EUW", Utc::now()).await;
        db.replace_achievement_champions(ChallengeKind::JackOfAllChamps, "T", &BTreeSet::from([1, 2]))
            .await
            .unwrap();
        store_match(&db, &rift_match("R1", 0, vec![participant("T", 2, true)])).await;
        store_match(&db, &rift_match("R2", 1, vec![participant("T", 3, true)])).await;

        let rebuilder = AchievementRebuilder::new(db.clone(), PuuidLocks::default());
        rebuilder
            .rebuild(ChallengeKind::JackOfAllChamps, "T")
            .await
            .unwrap();

        assert_eq!(
            db.achievement_champions(ChallengeKind::JackOfAllChamps, "T")
                .await
                .unwrap(),
            BTreeSet::from([2, 3])
        );
    }

    #[tokio::test]
    async fn rebuild_by_unknown_riot_id_fails_fast() {
        let db = memory_repository().await;
        let rebuilder = AchievementRebuilder::new(db, PuuidLocks::default());

        let res = rebuilder
            .rebuild_by_riot_id(ChallengeKind::Invincible, "Ghost", "000", Platform::EUW1)
            .await;

        assert!(matches!(res, Err(AppError::SummonerNotFound { .. })));
    }

    #[tokio::test]
    async fn rebuild_all_reports_every_kind() {
        let db = memory_repository().await;
        seed_summoner(&db, "T", "Foo", "EUW", Utc::now()).await;
        store_match(&db, &arena_match("A", SPLIT_3_MS, vec![flawless("T", 5)])).await;

        let rebuilder = AchievementRebuilder::new(db.clone(), PuuidLocks::default());
        let report = rebuilder.rebuild_all("T").await;

        assert!(report.success());
        assert_eq!(report.outcomes.len(), ChallengeKind::ALL.len());
        assert_eq!(report.failed().count(), 0);
        assert_eq!(
            db.achievement_champions(ChallengeKind::AdaptToAllSituations, "T")
                .await
                .unwrap(),
            BTreeSet::from([5])
        );
        assert!(
            db.matches_for("T", MatchSubset::SummonersRift)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn concurrent_rebuilds_of_one_player_serialize() {
        let db = memory_repository().await;
        seed_summoner(&db, "T", "Foo", "EUW", Utc::now()).await;
        for i in 0..5 {
            store_match(
                &db,
                &rift_match(&format!("R{i}"), i, vec![participant("T", i + 1, true)]),
            )
            .await;
        }

        let rebuilder = AchievementRebuilder::new(db.clone(), PuuidLocks::default());
        let runs = (0..4).map(|_| rebuilder.rebuild(ChallengeKind::JackOfAllChamps, "T"));
        for result in futures::future::join_all(runs).await {
            assert_eq!(result.unwrap().len(), 5);
        }

        assert_eq!(
            db.achievement_champions(ChallengeKind::JackOfAllChamps, "T")
                .await
                .unwrap(),
            BTreeSet::from([1, 2, 3, 4, 5])
        );
    }
}
