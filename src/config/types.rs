use serde::Deserialize;

/// Main configuration structure for Taxocrawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    pub site: SiteConfig,
    pub output: OutputConfig,
}

/// Crawl loop behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum loop iterations per run; reaching the cap pauses the
    /// crawl, it does not fail it
    #[serde(rename = "max-iterations", default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Base courtesy delay before each fetch (milliseconds)
    #[serde(rename = "delay-base-ms", default = "default_delay_base_ms")]
    pub delay_base_ms: u64,

    /// Standard deviation of the half-normal delay jitter (milliseconds)
    #[serde(rename = "delay-sigma-ms", default = "default_delay_sigma_ms")]
    pub delay_sigma_ms: u64,

    /// Hard cap on the delay (milliseconds)
    #[serde(rename = "delay-cap-ms", default = "default_delay_cap_ms")]
    pub delay_cap_ms: u64,
}

/// Target site configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Site root, e.g. "https://www.biolib.cz"
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Taxon id used to seed an empty frontier (14871 is Plantae)
    #[serde(rename = "seed-taxon-id", default = "default_seed_taxon_id")]
    pub seed_taxon_id: i64,

    /// User agent sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

/// Output and persistence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite taxon database
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the frontier queue file
    #[serde(rename = "queue-path")]
    pub queue_path: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            delay_base_ms: default_delay_base_ms(),
            delay_sigma_ms: default_delay_sigma_ms(),
            delay_cap_ms: default_delay_cap_ms(),
        }
    }
}

fn default_max_iterations() -> u32 {
    5000
}

fn default_delay_base_ms() -> u64 {
    100
}

fn default_delay_sigma_ms() -> u64 {
    700
}

fn default_delay_cap_ms() -> u64 {
    1600
}

fn default_seed_taxon_id() -> i64 {
    14871
}
