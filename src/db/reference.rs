use chrono::{DateTime, Utc};

use super::models::{ChallengeConfigEntry, ChampionDetails, to_millis};
use super::repository::Repository;
use crate::error::AppError;
use crate::riot::types::{ChallengeConfigDto, ChampionListDto};

const CHAMPION_DETAILS_VERSION: &str = "champion_details";

impl Repository {
    // === Global reference data ===

    /// Replace champion reference data with the given patch's list.
    pub async fn replace_champion_details(
        &self,
        champions: &ChampionListDto,
        updated_at: DateTime<Utc>,
    ) -> Result<usize, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut stored = 0;

        for champion in champions.data.values() {
            let Ok(id) = champion.key.parse::<i64>() else {
                tracing::warn!(key = %champion.key, "🗄️ ⚠️ Skipping champion with non-numeric key");
                continue;
            };

            sqlx::query(
                r#"
                INSERT INTO champion_details (id, key, name, title, tags, image, stats, version)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    key = excluded.key,
                    name = excluded.name,
                    title = excluded.title,
                    tags = excluded.tags,
                    image = excluded.image,
                    stats = excluded.stats,
                    version = excluded.version
                "#,
            )
            .bind(id)
            .bind(&champion.id)
            .bind(&champion.name)
            .bind(&champion.title)
            .bind(champion.tags.join(","))
            .bind(&champion.image.full)
            .bind(serde_json::to_string(&champion.stats)?)
            .bind(&champions.version)
            .execute(&mut *tx)
            .await?;
            stored += 1;
        }

        sqlx::query(
            r#"
            INSERT INTO static_versions (name, version, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET version = excluded.version, updated_at = excluded.updated_at
            "#,
        )
        .bind(CHAMPION_DETAILS_VERSION)
        .bind(&champions.version)
        .bind(to_millis(updated_at))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(stored)
    }

    pub async fn champion_details_version(&self) -> Result<Option<String>, AppError> {
        let version = sqlx::query_scalar("SELECT version FROM static_versions WHERE name = ?")
            .bind(CHAMPION_DETAILS_VERSION)
            .fetch_optional(&self.pool)
            .await?;
        Ok(version)
    }

    pub async fn get_champion_details(&self) -> Result<Vec<ChampionDetails>, AppError> {
        let rows = sqlx::query_as::<_, ChampionDetails>(
            "SELECT id, key, name, title, tags, image, version FROM champion_details ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Refresh the global challenge definitions and their localizations.
    pub async fn upsert_challenges_config(
        &self,
        configs: &[ChallengeConfigDto],
        updated_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        for config in configs {
            sqlx::query(
                r#"
                INSERT INTO challenges_config (id, state, leaderboard, thresholds, updated_at)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    state = excluded.state,
                    leaderboard = excluded.leaderboard,
                    thresholds = excluded.thresholds,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(config.id)
            .bind(&config.state)
            .bind(config.leaderboard)
            .bind(serde_json::to_string(&config.thresholds)?)
            .bind(to_millis(updated_at))
            .execute(&mut *tx)
            .await?;

            for (locale, names) in &config.localized_names {
                sqlx::query(
                    r#"
                    INSERT INTO challenge_localization
                        (challenge_id, locale, name, description, short_description)
                    VALUES (?, ?, ?, ?, ?)
                    ON CONFLICT(challenge_id, locale) DO UPDATE SET
                        name = excluded.name,
                        description = excluded.description,
                        short_description = excluded.short_description
                    "#,
                )
                .bind(config.id)
                .bind(locale)
                .bind(&names.name)
                .bind(&names.description)
                .bind(&names.short_description)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    /// Challenge definitions with names in `locale` when available.
    pub async fn list_challenge_configs(
        &self,
        locale: &str,
    ) -> Result<Vec<ChallengeConfigEntry>, AppError> {
        let rows = sqlx::query_as::<_, ChallengeConfigEntry>(
            r#"
            SELECT c.id, c.state, c.leaderboard, c.thresholds,
                   l.name, l.description, l.short_description
            FROM challenges_config c
            LEFT JOIN challenge_localization l ON l.challenge_id = c.id AND l.locale = ?
            ORDER BY c.id
            "#,
        )
        .bind(locale)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
