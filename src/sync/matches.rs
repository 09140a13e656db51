use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::SyncContext;
use crate::db::Summoner;
use crate::error::AppError;
use crate::riot::ApiError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchSyncStats {
    /// Match ids listed by Riot.
    pub listed: usize,
    /// Matches downloaded and stored.
    pub fetched: usize,
    /// Matches already stored, only linked to the summoner.
    pub linked: usize,
    /// Matches Riot listed but could not return.
    pub missing: usize,
}

impl SyncContext {
    /// Store the summoner's new matches. Best effort reads a single page of
    /// ids; exhaustive keeps paging until Riot runs out or the page cap.
    #[instrument(skip_all, fields(puuid = %summoner.puuid, exhaustive = exhaustive))]
    pub async fn sync_matches(
        &self,
        summoner: &Summoner,
        exhaustive: bool,
    ) -> Result<MatchSyncStats, AppError> {
        let region = summoner.platform()?.to_region();
        let page_size = self.settings.match_page_size;
        let pages = if exhaustive {
            self.settings.max_match_pages
        } else {
            1
        };

        let mut stats = MatchSyncStats::default();

        for page in 0..pages {
            let ids = self
                .riot
                .get_match_ids(&summoner.puuid, region, page * page_size, page_size)
                .await?;
            stats.listed += ids.len();

            let existing = self.db.existing_match_ids(&ids).await?;
            let known: Vec<String> = ids.iter().filter(|id| existing.contains(*id)).cloned().collect();
            self.db
                .link_summoner_to_matches(&summoner.puuid, &known)
                .await?;
            stats.linked += known.len();

            for match_id in ids.iter().filter(|id| !existing.contains(*id)) {
                let data = match self.riot.get_match(match_id, region).await {
                    Ok(data) => data,
                    Err(ApiError::NotFound) => {
                        warn!(match_id, "🎮 ⚠️ Listed match not found upstream");
                        stats.missing += 1;
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                };

                let participants = data.info.validated_participants(match_id);
                self.db
                    .insert_match(match_id, &data.info, &participants, Utc::now())
                    .await?;
                stats.fetched += 1;
            }

            if (ids.len() as u32) < page_size {
                break;
            }
        }

        if stats.fetched > 0 {
            info!(
                fetched = stats.fetched,
                linked = stats.linked,
                "🎮 ✅ Matches synced"
            );
        } else {
            debug!(listed = stats.listed, "🎮 No new matches");
        }

        Ok(stats)
    }
}
