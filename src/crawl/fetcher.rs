//! HTTP fetching and the courtesy delay
//!
//! The crawl runs strictly sequentially against one site, so politeness
//! is a randomized delay before every request rather than a scheduler.

use crate::config::CrawlerConfig;
use crate::CrawlError;
use rand::Rng;
use reqwest::Client;
use std::time::Duration;

/// Raw result of one fetch
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// HTTP status code
    pub status: u16,

    /// Response body
    pub body: String,
}

/// Capability interface over the HTTP transport
///
/// Injected into the coordinator so tests can serve canned pages.
#[allow(async_fn_in_trait)]
pub trait Fetcher {
    async fn get(&self, url: &str) -> crate::Result<FetchResponse>;
}

/// Production fetcher backed by reqwest
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds a client with the configured user agent and sane timeouts
    pub fn new(user_agent: &str) -> crate::Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> crate::Result<FetchResponse> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| CrawlError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|source| CrawlError::Http {
            url: url.to_string(),
            source,
        })?;

        Ok(FetchResponse { status, body })
    }
}

/// Sleeps for the configured base delay plus half-normal jitter
pub async fn courtesy_delay(config: &CrawlerConfig) {
    tokio::time::sleep(Duration::from_millis(delay_ms(config))).await;
}

/// Delay in milliseconds: `min(cap, base + |N(0, sigma)|)`
fn delay_ms(config: &CrawlerConfig) -> u64 {
    let jitter = half_normal(config.delay_sigma_ms as f64);
    (config.delay_base_ms as f64 + jitter).min(config.delay_cap_ms as f64) as u64
}

/// Samples `|N(0, sigma)|` via the Box-Muller transform
fn half_normal(sigma: f64) -> f64 {
    let mut rng = rand::thread_rng();
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
    (z * sigma).abs()
}
