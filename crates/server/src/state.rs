use std::sync::Arc;
use podcache_core::{Config, Environment, PopularPodcasts, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    podcasts: Arc<PopularPodcasts>,
}

impl AppState {
    pub fn new(config: Config, podcasts: Arc<PopularPodcasts>) -> Self {
        Self { config, podcasts }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn environment(&self) -> Environment {
        self.config.environment
    }

    pub fn podcasts(&self) -> &PopularPodcasts {
        self.podcasts.as_ref()
    }
}
