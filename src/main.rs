use std::sync::Arc;

use riftstats::db::{self, Repository};
use riftstats::jobs::{JobQueue, QueueSettings, RefreshPipeline};
use riftstats::poller::StaleSweeper;
use riftstats::riot::RiotClient;
use riftstats::sync::{SyncContext, SyncSettings};
use riftstats::{AppError, Config, logging};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    logging::init();

    if let Err(e) = run().await {
        error!(error = %e, "❌ Fatal error");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let config = Config::from_env()?;
    info!("🐙 Starting...");

    let pool = db::connect(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    let repository = Repository::new(pool.clone());

    let riot = RiotClient::new(&config);
    let metrics = riot.metrics();
    tokio::spawn(async move { metrics.log_loop().await });

    let sync = SyncContext::new(
        repository.clone(),
        Arc::new(riot),
        SyncSettings::from_config(&config),
    );

    let queue = JobQueue::new(QueueSettings::from_config(&config));
    let workers = queue.start(Arc::new(sync));
    let pipeline = RefreshPipeline::new(queue.clone());

    let sweeper = config.sweep_interval.map(|every| {
        StaleSweeper::new(repository, pipeline, config.summoner_stale_after, every).start()
    });

    if tokio::signal::ctrl_c().await.is_err() {
        error!("❌ Could not listen for shutdown signal");
    }
    info!("🛑 Shutting down");

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    queue.shutdown();
    futures::future::join_all(workers).await;
    pool.close().await;

    info!("👋 Bye");
    Ok(())
}
