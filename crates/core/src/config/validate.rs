use super::{types::Config, ConfigError};

/// Validate configuration before any run starts.
///
/// Every violation is collected and reported in one error rather than one
/// at a time.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut problems = Vec::new();

    if config.source.catalog_url.trim().is_empty() {
        problems.push("source.catalog_url must not be empty".to_string());
    } else if !is_http_url(&config.source.catalog_url) {
        problems.push("source.catalog_url must be an http(s) URL".to_string());
    }

    if config.source.registration_url.trim().is_empty() {
        problems.push("source.registration_url must not be empty".to_string());
    } else if !is_http_url(&config.source.registration_url) {
        problems.push("source.registration_url must be an http(s) URL".to_string());
    }

    if config.collector.batch_size == 0 {
        problems.push("collector.batch_size must be >= 1".to_string());
    }
    if config.collector.max_threads == 0 {
        problems.push("collector.max_threads must be >= 1".to_string());
    }
    if config.collector.interval_secs == 0 {
        problems.push("collector.interval_secs must be >= 1".to_string());
    }
    if config.collector.retry_attempts == 0 {
        problems.push("collector.retry_attempts must be >= 1".to_string());
    }
    if config.collector.http_timeout_secs == 0 {
        problems.push("collector.http_timeout_secs must be >= 1".to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(problems.join("; ")))
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
