use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite};

use super::models::{MatchRow, MatchSubset, StoredMatch, to_millis};
use super::repository::Repository;
use crate::error::AppError;
use crate::riot::types::{ARENA_QUEUE_IDS, InfoDto, ParticipantDto, SUMMONERS_RIFT_MAP_ID};

const MATCH_COLUMNS: &str = "mi.match_id, mi.game_id, mi.game_creation, mi.game_start_timestamp, \
    mi.game_end_timestamp, mi.game_duration, mi.game_mode, mi.game_version, mi.map_id, \
    mi.queue_id, mi.participants";

impl Repository {
    // === Match operations ===

    /// Which of `match_ids` are already stored.
    pub async fn existing_match_ids(&self, match_ids: &[String]) -> Result<HashSet<String>, AppError> {
        if match_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT match_id FROM matches WHERE match_id IN (");
        let mut separated = builder.separated(", ");
        for id in match_ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let ids: Vec<String> = builder
            .build_query_scalar()
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.into_iter().collect())
    }

    /// Store a freshly fetched match. Matches are immutable once stored, so a
    /// second insert of the same id is a no-op.
    pub async fn insert_match(
        &self,
        match_id: &str,
        info: &InfoDto,
        participants: &[ParticipantDto],
        fetched_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let participants_json = serde_json::to_string(participants)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO matches (match_id, fetched_at) VALUES (?, ?) ON CONFLICT(match_id) DO NOTHING")
            .bind(match_id)
            .bind(to_millis(fetched_at))
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO match_info (
                match_id, game_id, game_creation, game_start_timestamp, game_end_timestamp,
                game_duration, game_mode, game_version, map_id, queue_id, participants
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(match_id) DO NOTHING
            "#,
        )
        .bind(match_id)
        .bind(info.game_id)
        .bind(info.game_creation)
        .bind(info.game_start_timestamp)
        .bind(info.game_end_timestamp)
        .bind(info.game_duration)
        .bind(&info.game_mode)
        .bind(&info.game_version)
        .bind(info.map_id)
        .bind(info.queue_id)
        .bind(participants_json)
        .execute(&mut *tx)
        .await?;

        // Link every participant we already know about.
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "INSERT OR IGNORE INTO match_summoners (match_id, puuid) SELECT ",
        );
        builder
            .push_bind(match_id)
            .push(", puuid FROM summoners WHERE puuid IN (");
        let mut separated = builder.separated(", ");
        for p in participants {
            separated.push_bind(&p.puuid);
        }
        separated.push_unseparated(")");
        if !participants.is_empty() {
            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn link_summoner_to_matches(
        &self,
        puuid: &str,
        match_ids: &[String],
    ) -> Result<(), AppError> {
        if match_ids.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("INSERT OR IGNORE INTO match_summoners (match_id, puuid) ");
        builder.push_values(match_ids, |mut b, id| {
            b.push_bind(id).push_bind(puuid);
        });
        builder.build().execute(&self.pool).await?;
        Ok(())
    }

    /// Every stored match of `puuid` in `subset`, newest first.
    pub async fn matches_for(
        &self,
        puuid: &str,
        subset: MatchSubset,
    ) -> Result<Vec<StoredMatch>, AppError> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {MATCH_COLUMNS} FROM match_info mi \
             INNER JOIN match_summoners ms ON ms.match_id = mi.match_id \
             WHERE ms.puuid = "
        ));
        builder.push_bind(puuid);

        match subset {
            MatchSubset::All => {}
            MatchSubset::SummonersRift => {
                builder.push(" AND mi.map_id = ").push_bind(SUMMONERS_RIFT_MAP_ID);
            }
            MatchSubset::Arena => {
                builder.push(" AND mi.queue_id IN (");
                let mut separated = builder.separated(", ");
                for queue_id in ARENA_QUEUE_IDS {
                    separated.push_bind(queue_id);
                }
                separated.push_unseparated(")");
            }
            MatchSubset::StartedSince(at) => {
                builder
                    .push(" AND mi.game_start_timestamp >= ")
                    .push_bind(to_millis(at));
            }
        }
        builder.push(" ORDER BY mi.game_start_timestamp DESC");

        let rows: Vec<MatchRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(StoredMatch::try_from).collect()
    }

    pub async fn recent_matches(&self, puuid: &str, limit: u32) -> Result<Vec<StoredMatch>, AppError> {
        let rows = sqlx::query_as::<_, MatchRow>(&format!(
            r#"
            SELECT {MATCH_COLUMNS} FROM match_info mi
            INNER JOIN match_summoners ms ON ms.match_id = mi.match_id
            WHERE ms.puuid = ?
            ORDER BY mi.game_start_timestamp DESC
            LIMIT ?
            "#
        ))
        .bind(puuid)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(StoredMatch::try_from).collect()
    }
}
