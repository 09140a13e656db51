use std::collections::BTreeSet;

use sqlx::{QueryBuilder, Sqlite};

use super::challenges::ensure_challenges_row;
use super::repository::Repository;
use crate::challenges::ChallengeKind;
use crate::error::AppError;

impl Repository {
    // === Custom achievement sets ===

    /// Replace the champion set of `kind` for `puuid` in one transaction:
    /// delete, ensure the parent row, then insert ignoring conflicts.
    pub async fn replace_achievement_champions(
        &self,
        kind: ChallengeKind,
        puuid: &str,
        champions: &BTreeSet<i64>,
    ) -> Result<(), AppError> {
        let table = kind.table_name();
        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!("DELETE FROM {table} WHERE puuid = ?"))
            .bind(puuid)
            .execute(&mut *tx)
            .await?;

        ensure_challenges_row(&mut tx, puuid).await?;

        if !champions.is_empty() {
            let mut builder: QueryBuilder<Sqlite> =
                QueryBuilder::new(format!("INSERT OR IGNORE INTO {table} (puuid, champion_id) "));
            builder.push_values(champions, |mut b, champion_id| {
                b.push_bind(puuid).push_bind(*champion_id);
            });
            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn achievement_champions(
        &self,
        kind: ChallengeKind,
        puuid: &str,
    ) -> Result<BTreeSet<i64>, AppError> {
        let ids: Vec<i64> = sqlx::query_scalar(&format!(
            "SELECT champion_id FROM {} WHERE puuid = ? ORDER BY champion_id",
            kind.table_name()
        ))
        .bind(puuid)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().collect())
    }
}
