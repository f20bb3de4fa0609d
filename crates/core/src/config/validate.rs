use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Cache key is not empty and TTL is positive
/// - Refresh page is 1-indexed
/// - Artwork search requests at least one result
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.cache.key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "cache.key cannot be empty".to_string(),
        ));
    }

    if config.cache.ttl_hours == 0 {
        return Err(ConfigError::ValidationError(
            "cache.ttl_hours must be at least 1".to_string(),
        ));
    }

    if config.refresh.page == 0 {
        return Err(ConfigError::ValidationError(
            "refresh.page is 1-indexed and cannot be 0".to_string(),
        ));
    }

    if config.artwork.search_limit == 0 {
        return Err(ConfigError::ValidationError(
            "artwork.search_limit cannot be 0".to_string(),
        ));
    }

    Ok(())
}
