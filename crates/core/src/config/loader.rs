use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for environment overrides.
const ENV_PREFIX: &str = "PODCACHE_";

/// Separator between nested keys in an environment override name.
const ENV_KEY_SEPARATOR: &str = "__";

/// Providers in precedence order: the TOML file, then `PODCACHE_*`
/// environment variables. Keys missing from both take serde defaults.
///
/// `PODCACHE_CATALOG__API_KEY` sets `catalog.api_key` and
/// `PODCACHE_CACHE__REFRESH_MODE` sets `cache.refresh_mode`, so the catalog
/// secret never has to live in the file.
fn layered(path: &Path) -> Figment {
    Figment::from(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split(ENV_KEY_SEPARATOR))
}

/// Load configuration from `path` with environment overrides applied.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    layered(path)
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Parse configuration from a TOML string. No environment overrides.
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
