//! Persisted tracker configuration.
//!
//! # Responsibility
//! - Hold the per-store quota settings backing the rules timeline.
//!
//! # Invariants
//! - Quotas are non-negative and fit inside their calendar period.

use chrono::TimeDelta;

/// Quota configuration stored in the `config` key/value table.
///
/// A zero quota means the corresponding tracking feature is inert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub weekly_hours: TimeDelta,
    pub monthly_hours: TimeDelta,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            weekly_hours: TimeDelta::zero(),
            monthly_hours: TimeDelta::zero(),
        }
    }
}

impl Config {
    /// Validates quota bounds before persisting.
    ///
    /// # Errors
    /// Returns a human-readable message for the offending field.
    pub fn validate(&self) -> Result<(), String> {
        if self.weekly_hours < TimeDelta::zero() {
            return Err("weekly hours cannot be negative".to_string());
        }
        if self.weekly_hours > TimeDelta::days(7) {
            return Err("weekly hours must fit in a week".to_string());
        }
        if self.monthly_hours < TimeDelta::zero() {
            return Err("monthly hours cannot be negative".to_string());
        }
        if self.monthly_hours > TimeDelta::days(31) {
            return Err("monthly hours must fit in a month".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Config;
    use chrono::TimeDelta;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_negative_weekly_hours() {
        let config = Config {
            weekly_hours: TimeDelta::hours(-1),
            ..Config::default()
        };
        assert!(config.validate().unwrap_err().contains("negative"));
    }

    #[test]
    fn rejects_quota_larger_than_period() {
        let config = Config {
            weekly_hours: TimeDelta::days(8),
            ..Config::default()
        };
        assert!(config.validate().unwrap_err().contains("week"));

        let config = Config {
            monthly_hours: TimeDelta::days(32),
            ..Config::default()
        };
        assert!(config.validate().unwrap_err().contains("month"));
    }
}
