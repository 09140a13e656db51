use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::header::RETRY_AFTER;
use serde::de::DeserializeOwned;
use tracing::trace;

use super::error::{ApiError, RiotApiResponse};
use super::metrics::RequestMetrics;
use super::region::{Platform, Region};
use crate::config::Config;

/// Shared Riot API client. Cloning is cheap and every clone draws from the
/// same rate-limit budget.
#[derive(Clone)]
pub struct RiotClient {
    http: reqwest::Client,
    per_second: Arc<DefaultDirectRateLimiter>,
    per_two_minutes: Arc<DefaultDirectRateLimiter>,
    /// Riot API Key
    key: Arc<str>,
    timeout: Duration,
    base_url: Option<String>,
    ddragon_base_url: String,
    metrics: Arc<RequestMetrics>,
}

impl fmt::Debug for RiotClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RiotClient")
            .field("timeout", &self.timeout)
            .field("base_url", &self.base_url)
            .field("requests", &self.metrics.requests())
            .finish()
    }
}

impl RiotClient {
    pub fn new(config: &Config) -> Self {
        let per_second = Quota::per_second(config.riot_rate_limit_per_second)
            .allow_burst(config.riot_rate_limit_per_second);

        let two_minute_budget = config.riot_rate_limit_per_two_minutes;
        let per_two_minutes = Quota::with_period(Duration::from_secs(120) / two_minute_budget.get())
            .unwrap_or_else(|| Quota::per_minute(two_minute_budget))
            .allow_burst(two_minute_budget);

        Self {
            http: reqwest::Client::new(),
            per_second: Arc::new(RateLimiter::direct(per_second)),
            per_two_minutes: Arc::new(RateLimiter::direct(per_two_minutes)),
            key: config.riot_api_key.as_str().into(),
            timeout: config.riot_request_timeout,
            base_url: config.riot_base_url.clone(),
            ddragon_base_url: config.ddragon_base_url.trim_end_matches('/').to_string(),
            metrics: RequestMetrics::new(),
        }
    }

    pub fn metrics(&self) -> Arc<RequestMetrics> {
        self.metrics.clone()
    }

    pub(super) fn platform_url(&self, platform: Platform) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| platform.base_url())
    }

    pub(super) fn region_url(&self, region: Region) -> String {
        self.base_url.clone().unwrap_or_else(|| region.base_url())
    }

    pub(super) fn ddragon_url(&self) -> &str {
        &self.ddragon_base_url
    }

    /// Authenticated GET against the Riot API, gated by the shared limiter.
    pub(super) async fn get<T: DeserializeOwned>(&self, url: &str) -> RiotApiResponse<T> {
        // Ensure we do not exceed the Riot API rate limits before doing any request
        self.per_second.until_ready().await;
        self.per_two_minutes.until_ready().await;
        self.metrics.inc();

        trace!(url, "🛰️ GET");
        let request = self.http.get(url).header("X-Riot-Token", self.key.as_ref());
        self.send(request).await
    }

    /// Unauthenticated GET for Data Dragon static files. Not rate limited.
    pub(super) async fn get_static<T: DeserializeOwned>(&self, url: &str) -> RiotApiResponse<T> {
        trace!(url, "🛰️ GET static");
        self.send(self.http.get(url)).await
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> RiotApiResponse<T> {
        let call = async {
            let res = request.send().await?;
            let status = res.status();

            if !status.is_success() {
                let retry_after = res
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .map(Duration::from_secs);
                let err = ApiError::from_status(status, retry_after);
                if matches!(err, ApiError::RateLimited { .. }) {
                    self.metrics.inc_rate_limited();
                }
                return Err(err);
            }

            let bytes = res.bytes().await?;
            serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
        };

        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| ApiError::Timeout)?
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    fn client_for(server: &MockServer, timeout: Duration) -> RiotClient {
        let config = Config {
            riot_api_key: "RGAPI-TEST".into(),
            riot_base_url: Some(server.base_url()),
            ddragon_base_url: server.base_url(),
            riot_request_timeout: timeout,
            ..Config::default()
        };
        RiotClient::new(&config)
    }

    #[tokio::test]
    async fn too_many_requests_maps_to_rate_limited() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/riot/account/v1/accounts/by-riot-id/Foo/EUW");
                then.status(429).header("Retry-After", "3");
            })
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        let res = client
            .get_account_by_riot_id("Foo", "EUW", Region::Europe)
            .await;

        match res {
            Err(ApiError::RateLimited { retry_after }) => {
                assert_eq!(retry_after, Some(Duration::from_secs(3)))
            }
            other => panic!("expected rate limit, got {other:?}"),
        }
        assert_eq!(client.metrics().rate_limited(), 1);
    }

    #[tokio::test]
    async fn missing_account_maps_to_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/riot/account/v1/accounts/by-riot-id/Nobody/000");
                then.status(404);
            })
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        let res = client
            .get_account_by_riot_id("Nobody", "000", Region::Europe)
            .await;

        assert!(matches!(res, Err(ApiError::NotFound)));
    }

    #[tokio::test]
    async fn server_error_maps_to_unexpected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/lol/challenges/v1/challenges/config");
                then.status(503);
            })
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        let res = client.get_challenges_config(Platform::EUW1).await;

        assert!(matches!(
            res,
            Err(ApiError::Unexpected { status }) if status.as_u16() == 503
        ));
    }

    #[tokio::test]
    async fn slow_upstream_maps_to_timeout() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/versions.json");
                then.status(200)
                    .delay(Duration::from_millis(500))
                    .json_body(json!(["14.19.1"]));
            })
            .await;

        let client = client_for(&server, Duration::from_millis(50));
        let res = client.get_latest_version().await;

        assert!(matches!(res, Err(ApiError::Timeout)));
    }

    #[tokio::test]
    async fn successful_call_sends_api_key() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/riot/account/v1/accounts/by-puuid/P")
                    .header("X-Riot-Token", "RGAPI-TEST");
                then.status(200)
                    .json_body(json!({ "puuid": "P", "gameName": "Bar", "tagLine": "EUW" }));
            })
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        let account = client
            .get_account_by_puuid("P", Region::Europe)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(account.game_name.as_deref(), Some("Bar"));
    }

    #[tokio::test]
    async fn garbage_body_maps_to_decode_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/versions.json");
                then.status(200).body("not json");
            })
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        assert!(matches!(
            client.get_latest_version().await,
            Err(ApiError::Decode(_))
        ));
    }

    #[tokio::test]
    #[ignore = "API Key required"]
    async fn live_account_lookup_works() {
        let config = Config::from_env().unwrap();
        let client = RiotClient::new(&config);

        let account = client
            .get_account_by_riot_id("Chalop", "3012", Region::Europe)
            .await
            .unwrap();

        assert!(!account.puuid.is_empty());
    }
}
