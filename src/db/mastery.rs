use chrono::{DateTime, Utc};

use super::models::{ChampionMastery, from_millis, to_millis};
use super::repository::Repository;
use crate::error::AppError;
use crate::riot::types::ChampionMasteryDto;

impl Repository {
    // === Champion mastery operations ===

    /// Overwrite the mastery rows of `puuid` with the values just fetched.
    pub async fn upsert_masteries(
        &self,
        puuid: &str,
        masteries: &[ChampionMasteryDto],
        updated_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        for m in masteries {
            sqlx::query(
                r#"
                INSERT INTO champion_mastery (
                    champion_id, puuid, champion_level, champion_points, last_play_time,
                    tokens_earned, points_since_last_level, points_until_next_level, updated_at
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(champion_id, puuid) DO UPDATE SET
                    champion_level = excluded.champion_level,
                    champion_points = excluded.champion_points,
                    last_play_time = excluded.last_play_time,
                    tokens_earned = excluded.tokens_earned,
                    points_since_last_level = excluded.points_since_last_level,
                    points_until_next_level = excluded.points_until_next_level,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(m.champion_id)
            .bind(puuid)
            .bind(m.champion_level)
            .bind(m.champion_points)
            .bind(m.last_play_time)
            .bind(m.tokens_earned)
            .bind(m.champion_points_since_last_level)
            .bind(m.champion_points_until_next_level)
            .bind(to_millis(updated_at))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_masteries(&self, puuid: &str) -> Result<Vec<ChampionMastery>, AppError> {
        let rows = sqlx::query_as::<_, ChampionMastery>(
            r#"
            SELECT champion_id, puuid, champion_level, champion_points, last_play_time,
                   tokens_earned, points_since_last_level, points_until_next_level, updated_at
            FROM champion_mastery
            WHERE puuid = ?
            ORDER BY champion_points DESC
            "#,
        )
        .bind(puuid)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn last_mastery_update(&self, puuid: &str) -> Result<Option<DateTime<Utc>>, AppError> {
        let latest: Option<i64> =
            sqlx::query_scalar("SELECT MAX(updated_at) FROM champion_mastery WHERE puuid = ?")
                .bind(puuid)
                .fetch_one(&self.pool)
                .await?;
        Ok(latest.map(from_millis))
    }
}
