//! Aggregator configuration.

use std::fmt;
use std::time::Duration;

/// Configuration consumed by the aggregation core.
///
/// The two durations play different roles: `aggregation_period` is the
/// width of every bucket window, while `wait_period` is a trailing grace
/// delay that lets samples reported slightly after their nominal window
/// (a long operation timestamped at start, reported at completion) still
/// land before the window is flushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorConfig {
    /// Width of each aggregation window
    pub aggregation_period: Duration,
    /// Grace delay before a closed window becomes eligible for flushing
    pub wait_period: Duration,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            aggregation_period: Duration::from_secs(3),
            wait_period: Duration::from_secs(8),
        }
    }
}

impl AggregatorConfig {
    /// Check the invariants the collector relies on.
    ///
    /// The aggregation period must be a non-zero whole number of seconds:
    /// bucket IDs are quotients of whole unix seconds, so a fractional
    /// period cannot produce epoch-aligned windows.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.aggregation_period.is_zero() {
            return Err(ConfigError::ZeroAggregationPeriod);
        }
        if self.aggregation_period.subsec_nanos() != 0 {
            return Err(ConfigError::SubsecondAggregationPeriod(
                self.aggregation_period,
            ));
        }
        Ok(())
    }
}

/// An error type describing why a configuration is unusable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The aggregation period is zero
    ZeroAggregationPeriod,
    /// The aggregation period has a fractional-second component
    SubsecondAggregationPeriod(Duration),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroAggregationPeriod => {
                f.write_str("aggregation period must be greater than zero")
            }
            ConfigError::SubsecondAggregationPeriod(period) => write!(
                f,
                "aggregation period must be a whole number of seconds, got {period:?}"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
