use std::collections::BTreeSet;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use super::queue::{JobHandle, JobQueue, JobResult};
use super::{Job, JobFailure, JobId, JobKind, JobOutput, JobPayload, QueueError};
use crate::sync::RiotId;

/// Which jobs of a refresh the caller waits for, and how they run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshOptions {
    /// Refresh the summoner even when the cached row is fresh.
    pub force_refresh: bool,
    /// Fetch the whole reachable match history instead of one page.
    pub wait_for_matches: bool,
    pub await_jobs: BTreeSet<JobKind>,
}

impl RefreshOptions {
    /// Wait for the summoner, the reference data and the masteries.
    pub fn critical() -> Self {
        Self {
            await_jobs: BTreeSet::from([
                JobKind::UpdateSummonerOnly,
                JobKind::UpdateChampionDetails,
                JobKind::UpdateChallengesConfig,
                JobKind::UpdateMastery,
            ]),
            ..Self::default()
        }
    }

    /// Additionally wait for the exhaustive match sync and everything
    /// computed from it.
    pub fn with_matches(mut self) -> Self {
        self.wait_for_matches = true;
        self.await_jobs.extend([
            JobKind::UpdateMatches,
            JobKind::UpdateChallenges,
            JobKind::RunChallengesComputation,
        ]);
        self
    }

    pub fn forced(mut self) -> Self {
        self.force_refresh = true;
        self
    }

    /// Nothing awaited.
    pub fn background() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobReport {
    pub kind: JobKind,
    pub job_id: JobId,
    pub outcome: JobResult,
}

/// Outcome of every awaited job of one refresh request.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshReport {
    pub target: RiotId,
    pub jobs: Vec<JobReport>,
}

impl RefreshReport {
    /// True when no awaited job failed. Jobs already committed stay committed
    /// either way.
    pub fn success(&self) -> bool {
        self.jobs.iter().all(|job| job.outcome.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &JobFailure> {
        self.jobs.iter().filter_map(|job| job.outcome.as_ref().err())
    }

    pub fn outcome(&self, kind: JobKind) -> Option<&JobResult> {
        self.jobs
            .iter()
            .find(|job| job.kind == kind)
            .map(|job| &job.outcome)
    }

    /// New `gameName#tagLine` reported by the summoner job, if renamed.
    pub fn new_username(&self) -> Option<&str> {
        match self.outcome(JobKind::UpdateSummonerOnly) {
            Some(Ok(JobOutput::Summoner { new_username, .. })) => new_username.as_deref(),
            _ => None,
        }
    }
}

/// Fans a refresh request out into prioritized jobs.
#[derive(Debug, Clone)]
pub struct RefreshPipeline {
    queue: JobQueue,
}

impl RefreshPipeline {
    pub fn new(queue: JobQueue) -> Self {
        Self { queue }
    }

    pub fn queue(&self) -> &JobQueue {
        &self.queue
    }

    /// Queue every refresh job for `target` and wait for the ones listed in
    /// `options.await_jobs`. Per-player jobs start once the summoner job has
    /// resolved the puuid, challenge jobs once the match job has finished,
    /// whether or not anyone waits for them.
    #[instrument(skip(self, target, options), fields(riot_id = %target))]
    pub async fn refresh(
        &self,
        target: RiotId,
        options: RefreshOptions,
    ) -> Result<RefreshReport, QueueError> {
        let payload = JobPayload {
            target: target.clone(),
            force_refresh: options.force_refresh,
            exhaustive_matches: options.wait_for_matches,
            puuid: None,
        };

        let now = Utc::now();
        let mut handles = Vec::with_capacity(JobKind::ALL.len());
        for kind in JobKind::ALL.into_iter().filter(|k| !k.depends_on_summoner()) {
            handles.push(self.queue.enqueue(Job::new(kind, payload.clone(), now))?);
        }

        let summoner = handles
            .iter()
            .find(|h| h.kind() == JobKind::UpdateSummonerOnly)
            .cloned();
        let awaits_player = options.await_jobs.iter().any(JobKind::depends_on_summoner);
        let awaits_dependents = options.await_jobs.iter().any(JobKind::depends_on_matches);

        if let Some(summoner) = summoner {
            if awaits_player {
                handles.extend(
                    chain_player_jobs(&self.queue, summoner, &payload, awaits_dependents).await?,
                );
            } else {
                let queue = self.queue.clone();
                let payload = payload.clone();
                tokio::spawn(async move {
                    if let Err(e) = chain_player_jobs(&queue, summoner, &payload, false).await {
                        warn!(error = %e, "🧵 ⚠️ Could not queue player jobs");
                    }
                });
            }
        }

        let mut report = RefreshReport {
            target,
            jobs: Vec::new(),
        };
        for handle in handles {
            if !options.await_jobs.contains(&handle.kind()) {
                continue;
            }
            let kind = handle.kind();
            let job_id = handle.id().clone();
            let outcome = handle.wait().await;
            report.jobs.push(JobReport {
                kind,
                job_id,
                outcome,
            });
        }

        if report.success() {
            info!(awaited = report.jobs.len(), "🧵 ✅ Refresh completed");
        } else {
            let failed: Vec<String> = report.failures().map(|f| f.kind.to_string()).collect();
            warn!(failed = ?failed, "🧵 ⚠️ Refresh partially failed");
        }

        Ok(report)
    }
}

/// Wait for the summoner job, then queue the per-player jobs carrying the
/// puuid it resolved. When it failed they resolve the Riot ID themselves.
async fn chain_player_jobs(
    queue: &JobQueue,
    summoner: JobHandle,
    payload: &JobPayload,
    await_dependents: bool,
) -> Result<Vec<JobHandle>, QueueError> {
    let payload = match summoner.wait().await {
        Ok(JobOutput::Summoner { puuid, .. }) => JobPayload {
            puuid: Some(puuid),
            ..payload.clone()
        },
        Ok(_) => payload.clone(),
        Err(failure) => {
            debug!(error = %failure, "🧵 Summoner job failed, player jobs resolve the Riot ID");
            payload.clone()
        }
    };

    let now = Utc::now();
    let mut handles = Vec::new();
    for kind in JobKind::ALL
        .into_iter()
        .filter(|k| k.depends_on_summoner() && !k.depends_on_matches())
    {
        handles.push(queue.enqueue(Job::new(kind, payload.clone(), now))?);
    }

    let Some(matches) = handles
        .iter()
        .find(|h| h.kind() == JobKind::UpdateMatches)
        .cloned()
    else {
        return Ok(handles);
    };

    if await_dependents {
        handles.extend(chain_after_matches(queue, matches, &payload).await?);
    } else {
        let queue = queue.clone();
        tokio::spawn(async move {
            if let Err(e) = chain_after_matches(&queue, matches, &payload).await {
                warn!(error = %e, "🧵 ⚠️ Could not queue challenge jobs");
            }
        });
    }

    Ok(handles)
}

/// Wait for the match job, then queue the jobs computed from matches. They
/// run even if the match sync failed, over whatever history is stored.
async fn chain_after_matches(
    queue: &JobQueue,
    matches: JobHandle,
    payload: &JobPayload,
) -> Result<Vec<JobHandle>, QueueError> {
    if let Err(failure) = matches.wait().await {
        debug!(error = %failure, "🧵 Match sync failed, computing challenges from stored history");
    }

    let now = Utc::now();
    JobKind::ALL
        .into_iter()
        .filter(JobKind::depends_on_matches)
        .map(|kind| queue.enqueue(Job::new(kind, payload.clone(), now)))
        .collect()
}
