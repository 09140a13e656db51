use chrono::Utc;
use tracing::{debug, info, instrument};

use super::SyncContext;
use crate::error::AppError;
use crate::riot::Platform;

impl SyncContext {
    /// Refresh champion reference data when Data Dragon published a new
    /// patch. Returns the number of champions written, 0 when up to date.
    #[instrument(skip(self))]
    pub async fn sync_champion_details(&self) -> Result<usize, AppError> {
        let latest = self.riot.get_latest_version().await?;

        if self.db.champion_details_version().await?.as_deref() == Some(latest.as_str()) {
            debug!(version = %latest, "📚 Champion details already current");
            return Ok(0);
        }

        let champions = self.riot.get_champion_details(&latest).await?;
        let stored = self
            .db
            .replace_champion_details(&champions, Utc::now())
            .await?;

        info!(version = %latest, stored, "📚 ✅ Champion details updated");
        Ok(stored)
    }

    /// Refresh the global challenge definitions from `platform`.
    #[instrument(skip(self))]
    pub async fn sync_challenges_config(&self, platform: Platform) -> Result<usize, AppError> {
        let configs = self.riot.get_challenges_config(platform).await?;
        self.db
            .upsert_challenges_config(&configs, Utc::now())
            .await?;

        info!(count = configs.len(), "📚 ✅ Challenge config updated");
        Ok(configs.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::SyncSettings;
    use crate::test_support::{FakeRiot, memory_repository};

    #[tokio::test]
    async fn champion_details_skip_known_version() {
        let db = memory_repository().await;
        let riot = FakeRiot::new();
        let ctx = SyncContext::new(db.clone(), riot.clone(), SyncSettings::default());

        assert_eq!(ctx.sync_champion_details().await.unwrap(), 2);
        assert_eq!(ctx.sync_champion_details().await.unwrap(), 0);

        assert_eq!(db.get_champion_details().await.unwrap().len(), 2);
        assert_eq!(riot.calls_to("get_champion_details"), 1);
    }

    #[tokio::test]
    async fn challenges_config_is_stored() {
        let db = memory_repository().await;
        let ctx = SyncContext::new(db.clone(), FakeRiot::new(), SyncSettings::default());

        assert_eq!(ctx.sync_challenges_config(Platform::EUW1).await.unwrap(), 1);

        let configs = db.list_challenge_configs("en_US").await.unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].name.as_deref(), Some("Invincible"));
    }
}
