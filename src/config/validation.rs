use crate::config::types::{
    BrowserConfig, Config, CrawlerConfig, FetchConfig, OutputConfig, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_fetch_config(&config.fetch)?;
    validate_browser_config(&config.browser)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.detail_concurrency < 1 || config.detail_concurrency > 64 {
        return Err(ConfigError::Validation(format!(
            "detail_concurrency must be between 1 and 64, got {}",
            config.detail_concurrency
        )));
    }

    if config.max_listing_pages < 1 {
        return Err(ConfigError::Validation(
            "max_listing_pages must be >= 1".to_string(),
        ));
    }

    if config.minimum_request_interval > 60_000 {
        return Err(ConfigError::Validation(format!(
            "minimum_request_interval must be <= 60000ms, got {}ms",
            config.minimum_request_interval
        )));
    }

    Ok(())
}

fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.request_timeout == 0 {
        return Err(ConfigError::Validation(
            "request_timeout must be at least 1 second".to_string(),
        ));
    }

    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.initial_backoff > config.max_backoff {
        return Err(ConfigError::Validation(format!(
            "initial_backoff ({}ms) cannot exceed max_backoff ({}ms)",
            config.initial_backoff, config.max_backoff
        )));
    }

    if !config.backoff_multiplier.is_finite() || config.backoff_multiplier < 1.0 {
        return Err(ConfigError::Validation(format!(
            "backoff_multiplier must be >= 1.0, got {}",
            config.backoff_multiplier
        )));
    }

    Ok(())
}

fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if !config.enabled {
        return Ok(());
    }

    if config.pool_size < 1 || config.pool_size > 16 {
        return Err(ConfigError::Validation(format!(
            "browser pool_size must be between 1 and 16, got {}",
            config.pool_size
        )));
    }

    if config.ready_timeout == 0 {
        return Err(ConfigError::Validation(
            "browser ready_timeout must be at least 1 second".to_string(),
        ));
    }

    Ok(())
}

fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.export_dir.is_empty() {
        return Err(ConfigError::Validation(
            "export_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crawler() -> CrawlerConfig {
        CrawlerConfig {
            detail_concurrency: 8,
            max_listing_pages: 50,
            minimum_request_interval: 500,
        }
    }

    #[test]
    fn test_validate_crawler_bounds() {
        assert!(validate_crawler_config(&crawler()).is_ok());

        let mut config = crawler();
        config.detail_concurrency = 0;
        assert!(validate_crawler_config(&config).is_err());

        let mut config = crawler();
        config.detail_concurrency = 65;
        assert!(validate_crawler_config(&config).is_err());

        let mut config = crawler();
        config.max_listing_pages = 0;
        assert!(validate_crawler_config(&config).is_err());
    }

    #[test]
    fn test_validate_fetch_backoff_order() {
        let mut config = FetchConfig::default();
        assert!(validate_fetch_config(&config).is_ok());

        config.initial_backoff = 20_000;
        assert!(validate_fetch_config(&config).is_err());
    }

    #[test]
    fn test_validate_fetch_attempts() {
        let mut config = FetchConfig::default();
        config.max_attempts = 0;
        assert!(validate_fetch_config(&config).is_err());

        config.max_attempts = 1;
        assert!(validate_fetch_config(&config).is_ok());
    }

    #[test]
    fn test_validate_fetch_multiplier() {
        let mut config = FetchConfig::default();
        config.backoff_multiplier = 0.5;
        assert!(validate_fetch_config(&config).is_err());

        config.backoff_multiplier = f64::NAN;
        assert!(validate_fetch_config(&config).is_err());
    }

    #[test]
    fn test_disabled_browser_skips_checks() {
        let config = BrowserConfig {
            enabled: false,
            pool_size: 0,
            ready_timeout: 0,
            headless: true,
        };
        assert!(validate_browser_config(&config).is_ok());

        let config = BrowserConfig {
            enabled: true,
            ..config
        };
        assert!(validate_browser_config(&config).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("admin@sub.example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
    }
}
