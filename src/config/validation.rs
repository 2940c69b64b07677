use crate::config::types::{
    Config, CrawlerConfig, RateLimiterConfig, RetryConfig, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_seeds(&config.seeds)?;
    validate_crawler_config(&config.crawler)?;
    validate_retry_config(&config.retry)?;
    validate_rate_limiter_config(&config.rate_limiter)?;
    validate_user_agent_config(&config.user_agent)?;
    Ok(())
}

fn validate_seeds(seeds: &[String]) -> Result<(), ConfigError> {
    if seeds.is_empty() {
        return Err(ConfigError::Validation(
            "at least one seed URL is required".to_string(),
        ));
    }

    for seed in seeds {
        let url = Url::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "Seed URL '{}' must use HTTP or HTTPS",
                seed
            )));
        }
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(
            "max_pages must be >= 1".to_string(),
        ));
    }

    if config.concurrency_limit < 1 {
        return Err(ConfigError::Validation(format!(
            "concurrency_limit must be >= 1, got {}",
            config.concurrency_limit
        )));
    }

    non_negative("delay_between_batches", config.delay_between_batches)
}

fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if !config.retry_delay_base.is_finite() || config.retry_delay_base <= 1.0 {
        return Err(ConfigError::Validation(format!(
            "retry_delay_base must be > 1.0, got {}",
            config.retry_delay_base
        )));
    }

    positive("initial_timeout", config.initial_timeout)?;
    non_negative("timeout_increment", config.timeout_increment)?;
    non_negative("identity_retry_delay", config.identity_retry_delay)?;
    non_negative("timeout_retry_delay", config.timeout_retry_delay)
}

fn validate_rate_limiter_config(config: &RateLimiterConfig) -> Result<(), ConfigError> {
    match config {
        RateLimiterConfig::None => Ok(()),
        RateLimiterConfig::TokenBucket { capacity, window } => {
            if *capacity == 0 {
                return Err(ConfigError::Validation(
                    "token bucket capacity must be >= 1".to_string(),
                ));
            }
            positive("window", *window)
        }
        RateLimiterConfig::SlidingWindow {
            max_requests,
            window,
        } => {
            if *max_requests == 0 {
                return Err(ConfigError::Validation(
                    "sliding window max_requests must be >= 1".to_string(),
                ));
            }
            positive("window", *window)
        }
        RateLimiterConfig::LeakyBucket { rate } => positive("rate", *rate),
    }
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.agents.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent pool cannot be empty".to_string(),
        ));
    }

    if config.agents.iter().any(|agent| agent.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "user-agent strings cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn positive(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "{} must be > 0, got {}",
            name, value
        )))
    }
}

fn non_negative(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "{} must be >= 0, got {}",
            name, value
        )))
    }
}
