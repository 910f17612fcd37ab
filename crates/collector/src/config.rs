//! Collector configuration, read from the environment at startup.

use common::env::{optional_parsed, required, required_parsed, ConfigError};

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Broker address.
    pub nats_url: String,
    /// Deployment topic name.
    pub topic: String,
    /// Buffer flush threshold, at least 1.
    pub buffer_size: usize,
    /// Seconds to sleep between scrape cycles.
    pub scrape_interval_secs: u64,
    /// Ranked listing feed URL.
    pub listing_url: String,
    /// Timeout applied to every listing request.
    pub request_timeout_secs: u64,
    /// Prometheus exporter port.
    pub metrics_port: u16,
}

impl CollectorConfig {
    /// Load and validate the configuration. Any missing required value is
    /// a fatal startup error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let buffer_size: usize = required_parsed("COLLECTOR_BUFFER_SIZE")?;
        if buffer_size == 0 {
            return Err(ConfigError::Invalid {
                name: "COLLECTOR_BUFFER_SIZE",
                value: "0".to_string(),
                reason: "flush threshold must be at least 1".to_string(),
            });
        }

        Ok(Self {
            nats_url: required("NATS_URL")?,
            topic: required("BROKER_TOPIC")?,
            buffer_size,
            scrape_interval_secs: required_parsed("SCRAPE_INTERVAL_SECS")?,
            listing_url: required("LISTING_URL")?,
            request_timeout_secs: optional_parsed("REQUEST_TIMEOUT_SECS", 10)?,
            metrics_port: optional_parsed("METRICS_PORT", 9091)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test so the process-global environment is touched once.
    #[test]
    fn test_from_env_validates_required_values() {
        assert!(matches!(
            CollectorConfig::from_env(),
            Err(ConfigError::Missing(_))
        ));

        std::env::set_var("NATS_URL", "nats://localhost:4222");
        std::env::set_var("BROKER_TOPIC", "crypto");
        std::env::set_var("SCRAPE_INTERVAL_SECS", "10");
        std::env::set_var("LISTING_URL", "http://localhost:8080/listing");

        std::env::set_var("COLLECTOR_BUFFER_SIZE", "0");
        assert!(matches!(
            CollectorConfig::from_env(),
            Err(ConfigError::Invalid { name: "COLLECTOR_BUFFER_SIZE", .. })
        ));

        std::env::set_var("COLLECTOR_BUFFER_SIZE", "10");
        let config = CollectorConfig::from_env().unwrap();
        assert_eq!(config.buffer_size, 10);
        assert_eq!(config.scrape_interval_secs, 10);
        assert_eq!(config.request_timeout_secs, 10);

        for name in [
            "NATS_URL",
            "BROKER_TOPIC",
            "SCRAPE_INTERVAL_SECS",
            "LISTING_URL",
            "COLLECTOR_BUFFER_SIZE",
        ] {
            std::env::remove_var(name);
        }
    }
}
