use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, Transaction};

use super::models::{ChallengeProgress, to_millis};
use super::repository::Repository;
use crate::error::AppError;
use crate::riot::types::PlayerChallengesDto;

/// Insert the parent `challenges` row of `puuid` when it does not exist yet.
pub(super) async fn ensure_challenges_row(
    tx: &mut Transaction<'_, Sqlite>,
    puuid: &str,
) -> Result<(), AppError> {
    sqlx::query("INSERT INTO challenges (puuid) VALUES (?) ON CONFLICT(puuid) DO NOTHING")
        .bind(puuid)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

impl Repository {
    // === Riot-scored challenge data ===

    /// Store the player's Riot challenge scoring. Per-challenge and
    /// per-category rows are replaced as a whole.
    pub async fn store_player_challenges(
        &self,
        puuid: &str,
        data: &PlayerChallengesDto,
        updated_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        ensure_challenges_row(&mut tx, puuid).await?;

        sqlx::query(
            r#"
            INSERT INTO challenges_details (puuid, updated_at) VALUES (?, ?)
            ON CONFLICT(puuid) DO UPDATE SET updated_at = excluded.updated_at
            "#,
        )
        .bind(puuid)
        .bind(to_millis(updated_at))
        .execute(&mut *tx)
        .await?;

        let total = &data.total_points;
        sqlx::query(
            r#"
            INSERT INTO total_points (puuid, level, current, max, percentile) VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(puuid) DO UPDATE SET
                level = excluded.level,
                current = excluded.current,
                max = excluded.max,
                percentile = excluded.percentile
            "#,
        )
        .bind(puuid)
        .bind(&total.level)
        .bind(total.current)
        .bind(total.max)
        .bind(total.percentile)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM category_points WHERE puuid = ?")
            .bind(puuid)
            .execute(&mut *tx)
            .await?;
        for (category, points) in &data.category_points {
            sqlx::query(
                "INSERT INTO category_points (puuid, category, level, current, max, percentile) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(puuid)
            .bind(category)
            .bind(&points.level)
            .bind(points.current)
            .bind(points.max)
            .bind(points.percentile)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM challenge WHERE puuid = ?")
            .bind(puuid)
            .execute(&mut *tx)
            .await?;
        for challenge in &data.challenges {
            sqlx::query(
                r#"
                INSERT INTO challenge (puuid, challenge_id, percentile, level, value, achieved_time)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(puuid, challenge_id) DO NOTHING
                "#,
            )
            .bind(puuid)
            .bind(challenge.challenge_id)
            .bind(challenge.percentile)
            .bind(&challenge.level)
            .bind(challenge.value)
            .bind(challenge.achieved_time)
            .execute(&mut *tx)
            .await?;
        }

        let prefs = &data.preferences;
        sqlx::query(
            r#"
            INSERT INTO preferences (puuid, banner_accent, title, challenge_ids) VALUES (?, ?, ?, ?)
            ON CONFLICT(puuid) DO UPDATE SET
                banner_accent = excluded.banner_accent,
                title = excluded.title,
                challenge_ids = excluded.challenge_ids
            "#,
        )
        .bind(puuid)
        .bind(&prefs.banner_accent)
        .bind(&prefs.title)
        .bind(serde_json::to_string(&prefs.challenge_ids)?)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Progress per challenge id. `None` when the player was never synced,
    /// an empty map when synced with no challenge rows.
    pub async fn get_challenge_progress(
        &self,
        puuid: &str,
    ) -> Result<Option<HashMap<i64, ChallengeProgress>>, AppError> {
        let synced: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM challenges_details WHERE puuid = ?")
                .bind(puuid)
                .fetch_optional(&self.pool)
                .await?;
        if synced.is_none() {
            return Ok(None);
        }

        let rows = sqlx::query_as::<_, ChallengeProgress>(
            "SELECT challenge_id, percentile, level, value, achieved_time FROM challenge WHERE puuid = ?",
        )
        .bind(puuid)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(
            rows.into_iter().map(|row| (row.challenge_id, row)).collect(),
        ))
    }
}
