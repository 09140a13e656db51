use std::env;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub riot_api_key: String,
    pub database_url: String,
    pub riot_rate_limit_per_second: NonZeroU32,
    pub riot_rate_limit_per_two_minutes: NonZeroU32,
    pub riot_request_timeout: Duration,
    pub riot_base_url: Option<String>,
    pub ddragon_base_url: String,
    pub worker_count: usize,
    pub job_max_attempts: u32,
    pub job_backoff: Duration,
    pub summoner_stale_after: Duration,
    pub sweep_interval: Option<Duration>,
    pub match_page_size: u32,
    pub max_match_pages: u32,
}

impl Config {
    const DEFAULT_DATABASE_URL: &'static str = "sqlite:riftstats.db?mode=rwc";
    const DEFAULT_DDRAGON_BASE_URL: &'static str = "https://ddragon.leagueoflegends.com";
    const DEFAULT_RIOT_RATE_LIMIT_PER_SECOND: u32 = 20;
    const DEFAULT_RIOT_RATE_LIMIT_PER_TWO_MINUTES: u32 = 100;
    const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
    const DEFAULT_WORKER_COUNT: usize = 4;
    const DEFAULT_JOB_MAX_ATTEMPTS: u32 = 3;
    const DEFAULT_JOB_BACKOFF_MS: u64 = 2_000;
    const DEFAULT_SUMMONER_STALE_SECS: u64 = 3_600;
    const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 900;
    const DEFAULT_MATCH_PAGE_SIZE: u32 = 20;
    const DEFAULT_MAX_MATCH_PAGES: u32 = 10;

    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let riot_api_key = env::var("RIOT_API_KEY")
            .map_err(|_| AppError::Config("RIOT_API_KEY must be set".into()))?;

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| Self::DEFAULT_DATABASE_URL.into());

        let riot_rate_limit_per_second = nonzero_or(
            "RIOT_RATE_LIMIT_PER_SECOND",
            Self::DEFAULT_RIOT_RATE_LIMIT_PER_SECOND,
        );
        let riot_rate_limit_per_two_minutes = nonzero_or(
            "RIOT_RATE_LIMIT_PER_TWO_MINUTES",
            Self::DEFAULT_RIOT_RATE_LIMIT_PER_TWO_MINUTES,
        );

        let riot_base_url = env::var("RIOT_BASE_URL").ok().filter(|v| !v.is_empty());
        let ddragon_base_url =
            env::var("DDRAGON_BASE_URL").unwrap_or_else(|_| Self::DEFAULT_DDRAGON_BASE_URL.into());

        let sweep_interval_secs = parse_or("SWEEP_INTERVAL_SECS", Self::DEFAULT_SWEEP_INTERVAL_SECS);

        Ok(Self {
            riot_api_key,
            database_url,
            riot_rate_limit_per_second,
            riot_rate_limit_per_two_minutes,
            riot_request_timeout: Duration::from_secs(parse_or(
                "RIOT_REQUEST_TIMEOUT_SECS",
                Self::DEFAULT_REQUEST_TIMEOUT_SECS,
            )),
            riot_base_url,
            ddragon_base_url,
            worker_count: parse_or("WORKER_COUNT", Self::DEFAULT_WORKER_COUNT).max(1),
            job_max_attempts: parse_or("JOB_MAX_ATTEMPTS", Self::DEFAULT_JOB_MAX_ATTEMPTS).max(1),
            job_backoff: Duration::from_millis(parse_or(
                "JOB_BACKOFF_MS",
                Self::DEFAULT_JOB_BACKOFF_MS,
            )),
            summoner_stale_after: Duration::from_secs(parse_or(
                "SUMMONER_STALE_SECS",
                Self::DEFAULT_SUMMONER_STALE_SECS,
            )),
            sweep_interval: (sweep_interval_secs > 0)
                .then(|| Duration::from_secs(sweep_interval_secs)),
            match_page_size: parse_or("MATCH_PAGE_SIZE", Self::DEFAULT_MATCH_PAGE_SIZE)
                .clamp(1, 100),
            max_match_pages: parse_or("MAX_MATCH_PAGES", Self::DEFAULT_MAX_MATCH_PAGES).max(1),
        })
    }
}

impl Default for Config {
    /// Defaults without any environment lookup. The API key is left empty.
    fn default() -> Self {
        Self {
            riot_api_key: String::new(),
            database_url: Self::DEFAULT_DATABASE_URL.into(),
            riot_rate_limit_per_second: nonzero(Self::DEFAULT_RIOT_RATE_LIMIT_PER_SECOND),
            riot_rate_limit_per_two_minutes: nonzero(Self::DEFAULT_RIOT_RATE_LIMIT_PER_TWO_MINUTES),
            riot_request_timeout: Duration::from_secs(Self::DEFAULT_REQUEST_TIMEOUT_SECS),
            riot_base_url: None,
            ddragon_base_url: Self::DEFAULT_DDRAGON_BASE_URL.into(),
            worker_count: Self::DEFAULT_WORKER_COUNT,
            job_max_attempts: Self::DEFAULT_JOB_MAX_ATTEMPTS,
            job_backoff: Duration::from_millis(Self::DEFAULT_JOB_BACKOFF_MS),
            summoner_stale_after: Duration::from_secs(Self::DEFAULT_SUMMONER_STALE_SECS),
            sweep_interval: Some(Duration::from_secs(Self::DEFAULT_SWEEP_INTERVAL_SECS)),
            match_page_size: Self::DEFAULT_MATCH_PAGE_SIZE,
            max_match_pages: Self::DEFAULT_MAX_MATCH_PAGES,
        }
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn nonzero_or(key: &str, default: u32) -> NonZeroU32 {
    NonZeroU32::new(parse_or(key, default)).unwrap_or_else(|| nonzero(default))
}

fn nonzero(value: u32) -> NonZeroU32 {
    NonZeroU32::new(value).unwrap_or(NonZeroU32::MIN)
}
