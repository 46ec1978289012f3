use crate::config::types::{
    Config, RequestSettings, SpanSettings, StorageSettings, TimeoutSettings,
};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_request_settings(&config.request)?;
    validate_timeout_settings(&config.timeouts)?;
    validate_storage_settings(&config.storage)?;
    validate_span_settings(&config.scraper)?;
    Ok(())
}

/// Validates pacing and budget settings
fn validate_request_settings(settings: &RequestSettings) -> Result<(), ConfigError> {
    if settings.min_interval_ms == 0 {
        return Err(ConfigError::Validation(
            "request.min-interval-ms must be at least 1".to_string(),
        ));
    }

    if settings.max_requests_weekday == 0 {
        return Err(ConfigError::Validation(
            "request.max-requests-weekday must be at least 1".to_string(),
        ));
    }

    if settings.max_requests_weekend == 0 {
        return Err(ConfigError::Validation(
            "request.max-requests-weekend must be at least 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates timeout settings
fn validate_timeout_settings(settings: &TimeoutSettings) -> Result<(), ConfigError> {
    if settings.scraping_secs == 0 {
        return Err(ConfigError::Validation(
            "timeouts.scraping-secs must be at least 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates storage settings
fn validate_storage_settings(settings: &StorageSettings) -> Result<(), ConfigError> {
    if settings.root.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "storage.root cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the configured span, if any.
///
/// Tokens are parsed when the span is resolved; here only the pairing is
/// checked, because a lone start or end has no usable meaning.
fn validate_span_settings(settings: &SpanSettings) -> Result<(), ConfigError> {
    if settings.start_month.is_some() != settings.end_month.is_some() {
        return Err(ConfigError::Validation(
            "scraper.start-month and scraper.end-month must be set together".to_string(),
        ));
    }

    if settings.start_date.is_some() != settings.end_date.is_some() {
        return Err(ConfigError::Validation(
            "scraper.start-date and scraper.end-date must be set together".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = Config::default();
        config.request.min_interval_ms = 0;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_zero_budgets_rejected() {
        let mut config = Config::default();
        config.request.max_requests_weekday = 0;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.request.max_requests_weekend = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.timeouts.scraping_secs = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_storage_root_rejected() {
        let mut config = Config::default();
        config.storage.root = std::path::PathBuf::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_lone_span_endpoints_rejected() {
        let mut config = Config::default();
        config.scraper.start_month = Some("2024-11".to_string());
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.scraper.end_date = Some("2024-11-30".to_string());
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_complete_span_pairs_accepted() {
        let mut config = Config::default();
        config.scraper.start_month = Some("2024-11".to_string());
        config.scraper.end_month = Some("2024-12".to_string());
        config.scraper.start_date = Some("2024-11-01".to_string());
        config.scraper.end_date = Some("2024-11-30".to_string());
        assert!(validate(&config).is_ok());
    }
}
