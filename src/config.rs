use std::path::PathBuf;

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Chunk view distance applied to every fake player before spawn
    pub view_distance: u8,
    /// Milliseconds between ticks of the driving loop
    pub tick_interval_ms: u64,
    /// Path to the roster file loaded at startup
    pub roster_path: PathBuf,
    /// Ticks to wait before loading the roster, giving the host time to
    /// finish its own initialization
    pub roster_delay_ticks: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            view_distance: 4,
            tick_interval_ms: 50,
            roster_path: PathBuf::from("players.json"),
            roster_delay_ticks: 20,
        }
    }
}

impl ServiceConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(vd) = std::env::var("VIEW_DISTANCE") {
            if let Ok(parsed) = vd.parse::<u8>() {
                if parsed > 0 {
                    config.view_distance = parsed;
                } else {
                    tracing::warn!("VIEW_DISTANCE must be > 0, using default");
                }
            } else {
                tracing::warn!("Invalid VIEW_DISTANCE '{}', using default", vd);
            }
        }

        if let Ok(interval) = std::env::var("TICK_INTERVAL_MS") {
            if let Ok(parsed) = interval.parse::<u64>() {
                if parsed > 0 {
                    config.tick_interval_ms = parsed;
                } else {
                    tracing::warn!("TICK_INTERVAL_MS must be > 0, using default");
                }
            } else {
                tracing::warn!("Invalid TICK_INTERVAL_MS '{}', using default", interval);
            }
        }

        if let Ok(path) = std::env::var("ROSTER_PATH") {
            config.roster_path = PathBuf::from(path);
        }

        if let Ok(delay) = std::env::var("ROSTER_DELAY_TICKS") {
            if let Ok(parsed) = delay.parse::<u64>() {
                config.roster_delay_ticks = parsed;
            } else {
                tracing::warn!("Invalid ROSTER_DELAY_TICKS '{}', using default", delay);
            }
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        if self.view_distance == 0 {
            return Err("view_distance must be at least 1".to_string());
        }
        if self.tick_interval_ms == 0 {
            return Err("tick_interval_ms must be at least 1".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.view_distance, 4);
        assert_eq!(config.tick_interval_ms, 50);
        assert_eq!(config.roster_delay_ticks, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_view_distance() {
        let config = ServiceConfig {
            view_distance: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let config = ServiceConfig {
            tick_interval_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
