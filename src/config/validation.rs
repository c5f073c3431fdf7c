//! Configuration validation

use crate::config::types::Config;
use crate::ConfigError;
use url::Url;

/// Validates a parsed configuration
///
/// Checks everything the type system cannot: URL shape, positive ids and
/// non-empty paths. Returns the first problem found.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let base = Url::parse(&config.site.base_url)
        .map_err(|e| ConfigError::Validation(format!("invalid base-url: {}", e)))?;
    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base-url must be http(s), got {}",
            base.scheme()
        )));
    }

    if config.site.seed_taxon_id <= 0 {
        return Err(ConfigError::Validation(
            "seed-taxon-id must be positive".to_string(),
        ));
    }

    if config.site.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent must not be empty".to_string(),
        ));
    }

    if config.crawler.max_iterations == 0 {
        return Err(ConfigError::Validation(
            "max-iterations must be at least 1".to_string(),
        ));
    }

    if config.crawler.delay_cap_ms < config.crawler.delay_base_ms {
        return Err(ConfigError::Validation(
            "delay-cap-ms must not be below delay-base-ms".to_string(),
        ));
    }

    if config.output.database_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "database-path must not be empty".to_string(),
        ));
    }

    if config.output.queue_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "queue-path must not be empty".to_string(),
        ));
    }

    Ok(())
}
