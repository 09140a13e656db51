//! Periodically queues background refreshes for summoners whose cached
//! profile went stale.

use std::time::Duration;

use chrono::Utc;
use futures::{StreamExt, stream};
use tokio::time::interval;
use tracing::{Span, debug, error, info, instrument, warn};

use crate::db::{Repository, Summoner};
use crate::error::AppError;
use crate::jobs::{RefreshOptions, RefreshPipeline};
use crate::sync::RiotId;

const MAX_CONCURRENT_REFRESHES: usize = 10;
const MAX_SUMMONERS_PER_SWEEP: u32 = 200;

pub struct StaleSweeper {
    db: Repository,
    pipeline: RefreshPipeline,
    stale_after: chrono::Duration,
    every: Duration,
}

impl StaleSweeper {
    pub fn new(
        db: Repository,
        pipeline: RefreshPipeline,
        stale_after: Duration,
        every: Duration,
    ) -> Self {
        Self {
            db,
            pipeline,
            stale_after: chrono::Duration::from_std(stale_after)
                .unwrap_or_else(|_| chrono::Duration::hours(1)),
            every,
        }
    }

    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(&self) {
        let mut interval = interval(self.every);

        info!(every_secs = self.every.as_secs(), "🔄 Stale summoner sweeper started");

        loop {
            interval.tick().await;

            if let Err(e) = self.sweep_once().await {
                error!(error = ?e, "🔄 ❌ Sweep cycle failed");
            }
        }
    }

    /// Queue one background refresh per stale summoner: nothing awaited and a
    /// single page of matches. Returns how many were queued.
    #[instrument(skip_all, fields(summoner_count))]
    pub async fn sweep_once(&self) -> Result<usize, AppError> {
        let older_than = Utc::now() - self.stale_after;
        let summoners = self
            .db
            .find_stale_summoners(older_than, MAX_SUMMONERS_PER_SWEEP)
            .await?;

        if summoners.is_empty() {
            debug!("🔄 No stale summoners, skipping sweep");
            return Ok(0);
        }

        // Rows whose refresh keeps failing never get a new `updated_at`.
        let puuids: Vec<String> = summoners.iter().map(|s| s.puuid.clone()).collect();
        self.db.mark_swept(&puuids, Utc::now()).await?;

        Span::current().record("summoner_count", summoners.len());
        info!(count = summoners.len(), "🔄 Refreshing {} stale summoner(s)", summoners.len());

        let queued = stream::iter(summoners)
            .map(|summoner| async move { self.queue_refresh(&summoner).await })
            .buffer_unordered(MAX_CONCURRENT_REFRESHES)
            .fold(0, |total, queued| async move { total + usize::from(queued) })
            .await;

        Ok(queued)
    }

    async fn queue_refresh(&self, summoner: &Summoner) -> bool {
        let platform = match summoner.platform() {
            Ok(platform) => platform,
            Err(e) => {
                warn!(error = %e, puuid = %summoner.puuid, "🔄 ⚠️ Stored region is invalid");
                return false;
            }
        };
        let target = RiotId::new(&summoner.game_name, &summoner.tag_line, platform);

        match self
            .pipeline
            .refresh(target, RefreshOptions::background().forced())
            .await
        {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, riot_id = %summoner.riot_id(), "🔄 ⚠️ Could not queue refresh");
                false
            }
        }
    }
}
