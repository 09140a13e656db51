use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::models::{Summoner, SummonerUpsert, to_millis};
use crate::error::AppError;
use crate::riot::Platform;

pub(super) const SUMMONER_COLUMNS: &str = "puuid, game_name, tag_line, region, profile_icon_id, \
    summoner_level, revision_date, updated_at";

#[derive(Clone, Debug)]
pub struct Repository {
    pub(super) pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // === Summoner operations ===

    /// Insert or refresh a summoner keyed on its puuid. Name, tag and region
    /// are overwritten with the values given, so renamed accounts self-heal.
    pub async fn upsert_summoner(&self, summoner: &SummonerUpsert<'_>) -> Result<Summoner, AppError> {
        let query = format!(
            r#"
            INSERT INTO summoners
                (puuid, game_name, tag_line, region, profile_icon_id, summoner_level, revision_date, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(puuid) DO UPDATE SET
                game_name = excluded.game_name,
                tag_line = excluded.tag_line,
                region = excluded.region,
                profile_icon_id = excluded.profile_icon_id,
                summoner_level = excluded.summoner_level,
                revision_date = excluded.revision_date,
                updated_at = excluded.updated_at
            RETURNING {SUMMONER_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, Summoner>(&query)
            .bind(summoner.puuid)
            .bind(summoner.game_name)
            .bind(summoner.tag_line)
            .bind(summoner.platform.as_str())
            .bind(summoner.profile_icon_id)
            .bind(summoner.summoner_level)
            .bind(summoner.revision_date)
            .bind(to_millis(summoner.updated_at))
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn get_summoner_by_puuid(&self, puuid: &str) -> Result<Option<Summoner>, AppError> {
        let summoner = sqlx::query_as::<_, Summoner>(&format!(
            "SELECT {SUMMONER_COLUMNS} FROM summoners WHERE puuid = ?"
        ))
        .bind(puuid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(summoner)
    }

    /// Soft lookup by Riot ID. Case-insensitive; may return a row whose
    /// owner has since renamed.
    pub async fn get_summoner_by_riot_id(
        &self,
        game_name: &str,
        tag_line: &str,
        platform: Platform,
    ) -> Result<Option<Summoner>, AppError> {
        let summoner = sqlx::query_as::<_, Summoner>(&format!(
            r#"
            SELECT {SUMMONER_COLUMNS} FROM summoners
            WHERE game_name = ? COLLATE NOCASE
              AND tag_line = ? COLLATE NOCASE
              AND region = ?
            ORDER BY updated_at DESC
            LIMIT 1
            "#
        ))
        .bind(game_name)
        .bind(tag_line)
        .bind(platform.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(summoner)
    }

    /// Summoners whose last refresh and last sweep both happened before
    /// `older_than`. Never swept rows come first, then the least recently
    /// swept, so rows that keep failing cannot hold the whole batch.
    pub async fn find_stale_summoners(
        &self,
        older_than: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Summoner>, AppError> {
        let summoners = sqlx::query_as::<_, Summoner>(&format!(
            r#"
            SELECT {SUMMONER_COLUMNS} FROM summoners
            WHERE updated_at < ?
              AND (swept_at IS NULL OR swept_at < ?)
            ORDER BY COALESCE(swept_at, 0) ASC, updated_at ASC
            LIMIT ?
            "#
        ))
        .bind(to_millis(older_than))
        .bind(to_millis(older_than))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(summoners)
    }

    /// Record that the sweeper queued a refresh for `puuids` at `at`.
    pub async fn mark_swept(&self, puuids: &[String], at: DateTime<Utc>) -> Result<(), AppError> {
        if puuids.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE summoners SET swept_at = ");
        builder.push_bind(to_millis(at)).push(" WHERE puuid IN (");
        let mut separated = builder.separated(", ");
        for puuid in puuids {
            separated.push_bind(puuid);
        }
        separated.push_unseparated(")");
        builder.build().execute(&self.pool).await?;
        Ok(())
    }
}
