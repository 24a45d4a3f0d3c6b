//! Metric identities.

use std::fmt;
use std::sync::Arc;

/// The kind of a metric, which selects the merge semantics applied when
/// samples of the same series are aggregated together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricType {
    /// Values are summed
    Counter,
    /// The most recent value wins; extents are tracked
    Gauge,
    /// The share of non-zero values is tracked
    Rate,
    /// The full distribution is kept for percentile queries
    Trend,
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricType::Counter => "counter",
            MetricType::Gauge => "gauge",
            MetricType::Rate => "rate",
            MetricType::Trend => "trend",
        };
        f.write_str(name)
    }
}

/// A named metric.
///
/// Metrics are interned by [`crate::Registry`] and shared as
/// [`Arc<Metric>`], so two series referring to the same metric compare
/// equal through the same registered definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Metric {
    /// The registered name
    pub name: String,
    /// The kind of this metric
    pub metric_type: MetricType,
}

impl Metric {
    pub(crate) fn new(name: impl Into<String>, metric_type: MetricType) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            metric_type,
        })
    }
}
