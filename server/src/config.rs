use std::time::Duration;

/// Shortest sweep period the reaper will run at
pub const MIN_REAP_INTERVAL: Duration = Duration::from_millis(1);

/// Runtime settings for the game server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Largest accepted number of rows or columns for a new board
    pub max_dimension: usize,
    /// Sessions untouched for longer than this are dropped
    pub session_ttl: Duration,
    /// How often idle sessions are looked for
    pub reap_interval: Duration,
    /// Fixed RNG seed for reproducible boards; random when `None`
    pub seed: Option<u64>,
}

impl ServerConfig {
    /// Sweep period actually used by the reaper, never zero
    pub fn reap_period(&self) -> Duration {
        self.reap_interval.max(MIN_REAP_INTERVAL)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_dimension: 256,
            session_ttl: Duration::from_secs(30 * 60),
            reap_interval: Duration::from_secs(60),
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = ServerConfig::default();
        assert!(config.max_dimension >= 30);
        assert!(config.reap_interval < config.session_ttl);
        assert!(config.seed.is_none());
        assert_eq!(config.reap_period(), config.reap_interval);
    }

    #[test]
    fn test_zero_reap_interval_is_clamped() {
        let config = ServerConfig {
            reap_interval: Duration::ZERO,
            ..ServerConfig::default()
        };
        assert_eq!(config.reap_period(), MIN_REAP_INTERVAL);
    }
}
