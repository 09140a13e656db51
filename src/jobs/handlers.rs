use async_trait::async_trait;
use tracing::{info, warn};

use super::queue::{JobExecutor, JobResult};
use super::{Job, JobFailure, JobKind, JobOutput};
use crate::db::Summoner;
use crate::error::AppError;
use crate::sync::SyncContext;

#[async_trait]
impl JobExecutor for SyncContext {
    async fn execute(&self, job: &Job) -> JobResult {
        self.handle(job)
            .await
            .map_err(|e| JobFailure::from_error(job.kind, &e))
            .and_then(|output| match output {
                JobOutput::Achievements(report) if !report.success() => {
                    let failed: Vec<&str> = report.failed().map(|kind| kind.as_str()).collect();
                    Err(JobFailure::permanent(
                        job.kind,
                        format!("achievement rebuild failed for {}", failed.join(", ")),
                    ))
                }
                output => Ok(output),
            })
    }
}

impl SyncContext {
    async fn handle(&self, job: &Job) -> Result<JobOutput, AppError> {
        let payload = &job.payload;

        match job.kind {
            JobKind::UpdateSummonerOnly => {
                let resolution = self.resolve(&payload.target, payload.force_refresh).await?;
                Ok(JobOutput::Summoner {
                    riot_id: resolution.summoner.riot_id(),
                    puuid: resolution.summoner.puuid,
                    new_username: resolution.new_username,
                })
            }
            JobKind::UpdateChampionDetails => Ok(JobOutput::ChampionDetails {
                stored: self.sync_champion_details().await?,
            }),
            JobKind::UpdateChallengesConfig => Ok(JobOutput::ChallengesConfig {
                stored: self.sync_challenges_config(payload.target.platform).await?,
            }),
            JobKind::UpdateMastery => {
                let summoner = self.identity(job).await?;
                Ok(JobOutput::Mastery {
                    stored: self.sync_masteries(&summoner).await?,
                })
            }
            JobKind::UpdateMatches => {
                let summoner = self.identity(job).await?;
                let stats = self
                    .sync_matches(&summoner, payload.exhaustive_matches)
                    .await?;
                Ok(JobOutput::Matches(stats))
            }
            JobKind::UpdateChallenges => {
                let summoner = self.identity(job).await?;
                Ok(JobOutput::Achievements(
                    self.achievements().rebuild_all(&summoner.puuid).await,
                ))
            }
            JobKind::RunChallengesComputation => {
                let summoner = self.identity(job).await?;
                Ok(JobOutput::ChallengeScores {
                    challenges: self.sync_player_challenges(&summoner).await?,
                })
            }
        }
    }

    /// The summoner a per-player job works on: the row of the puuid the
    /// summoner job resolved, or the Riot ID resolved again without one.
    async fn identity(&self, job: &Job) -> Result<Summoner, AppError> {
        if let Some(puuid) = &job.payload.puuid {
            if let Some(summoner) = self.db().get_summoner_by_puuid(puuid).await? {
                return Ok(summoner);
            }
            warn!(%puuid, job = %job.kind, "👤 ⚠️ Resolved summoner is not stored");
        }

        let resolution = self.resolve(&job.payload.target, false).await?;
        if let Some(name) = &resolution.new_username {
            info!(job = %job.kind, new_username = %name, "👤 Job target was renamed");
        }
        Ok(resolution.summoner)
    }
}
