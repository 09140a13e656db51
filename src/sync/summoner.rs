use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use super::{RiotId, SyncContext};
use crate::db::{Summoner, SummonerUpsert};
use crate::error::AppError;
use crate::riot::ApiError;
use crate::riot::types::AccountDto;

/// Result of resolving a Riot ID to a stored summoner.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub summoner: Summoner,
    /// Whether the Riot API was called.
    pub refreshed: bool,
    /// Current `gameName#tagLine` when the requested name belongs to a
    /// renamed account. The caller should redirect to it.
    pub new_username: Option<String>,
}

impl SyncContext {
    pub async fn resolve(&self, target: &RiotId, force: bool) -> Result<Resolution, AppError> {
        self.resolve_at(target, force, Utc::now()).await
    }

    /// Cached summoner for `target` if fresh at `now`, otherwise refreshed
    /// from Riot. A name that stopped resolving upstream is recovered through
    /// the puuid cached under that name.
    #[instrument(skip(self, target, now), fields(riot_id = %target))]
    pub async fn resolve_at(
        &self,
        target: &RiotId,
        force: bool,
        now: DateTime<Utc>,
    ) -> Result<Resolution, AppError> {
        let cached = self
            .db
            .get_summoner_by_riot_id(&target.game_name, &target.tag_line, target.platform)
            .await?;

        if let Some(summoner) = &cached {
            if !force && !summoner.is_stale(now, self.settings.stale_after) {
                debug!(puuid = %summoner.puuid, "👤 Using cached summoner");
                return Ok(Resolution {
                    summoner: summoner.clone(),
                    refreshed: false,
                    new_username: None,
                });
            }
        }

        let account_region = target.platform.to_region().account_region();

        let (account, renamed) = match self.fetch_account(target, cached.as_ref()).await {
            Ok(account) => (account, false),
            Err(AppError::StaleIdentity { puuid, .. }) => {
                warn!(%puuid, "👤 ⚠️ Riot ID no longer resolves, retrying by puuid");
                let account = self
                    .riot
                    .get_account_by_puuid(&puuid, account_region)
                    .await
                    .map_err(|e| not_found_as_missing(e, target))?;
                (account, true)
            }
            Err(e) => return Err(e),
        };

        let summoner = self.store_summoner(&account, target, now).await?;

        let new_username = renamed.then(|| summoner.riot_id());
        if let Some(name) = &new_username {
            info!(new_username = %name, "👤 Summoner renamed");
        }

        Ok(Resolution {
            summoner,
            refreshed: true,
            new_username,
        })
    }

    /// Account lookup by name. A 404 on a name we have cached surfaces as
    /// [`AppError::StaleIdentity`].
    async fn fetch_account(
        &self,
        target: &RiotId,
        cached: Option<&Summoner>,
    ) -> Result<AccountDto, AppError> {
        let region = target.platform.to_region().account_region();
        match self
            .riot
            .get_account_by_riot_id(&target.game_name, &target.tag_line, region)
            .await
        {
            Ok(account) => Ok(account),
            Err(ApiError::NotFound) => match cached {
                Some(summoner) => Err(AppError::StaleIdentity {
                    game_name: target.game_name.clone(),
                    tag_line: target.tag_line.clone(),
                    puuid: summoner.puuid.clone(),
                }),
                None => Err(missing(target)),
            },
            Err(e) => Err(e.into()),
        }
    }

    /// Fetch the profile of `account` and upsert it keyed on the puuid, with
    /// the name Riot currently reports.
    async fn store_summoner(
        &self,
        account: &AccountDto,
        target: &RiotId,
        now: DateTime<Utc>,
    ) -> Result<Summoner, AppError> {
        let profile = self
            .riot
            .get_summoner_by_puuid(&account.puuid, target.platform)
            .await
            .map_err(|e| not_found_as_missing(e, target))?;

        let summoner = self
            .db
            .upsert_summoner(&SummonerUpsert {
                puuid: &account.puuid,
                game_name: account.game_name.as_deref().unwrap_or(&target.game_name),
                tag_line: account.tag_line.as_deref().unwrap_or(&target.tag_line),
                platform: target.platform,
                profile_icon_id: profile.profile_icon_id,
                summoner_level: profile.summoner_level,
                revision_date: profile.revision_date,
                updated_at: now,
            })
            .await?;

        info!(puuid = %summoner.puuid, level = summoner.summoner_level, "👤 ✅ Summoner refreshed");
        Ok(summoner)
    }
}

fn missing(target: &RiotId) -> AppError {
    AppError::SummonerNotFound {
        game_name: target.game_name.clone(),
        tag_line: target.tag_line.clone(),
    }
}

fn not_found_as_missing(e: ApiError, target: &RiotId) -> AppError {
    match e {
        ApiError::NotFound => missing(target),
        other => other.into(),
    }
}
