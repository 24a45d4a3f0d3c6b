//! Per-kind sample accumulators.
//!
//! One sink exists per distinct series inside a time bucket; every sample
//! for that series merges into it through [`Sink::add`]. The merge math is
//! chosen by the metric kind: counters sum, gauges keep the last value,
//! rates track the non-zero share, trends keep the distribution.

use std::cmp::Ordering;

use crate::metric::MetricType;

/// A mutable accumulator for one series within one time bucket.
#[derive(Debug, Clone, PartialEq)]
pub enum Sink {
    /// Sums values
    Counter(CounterSink),
    /// Keeps the last value and tracks extents
    Gauge(GaugeSink),
    /// Tracks the share of non-zero values
    Rate(RateSink),
    /// Keeps the distribution for percentile queries
    Trend(TrendSink),
}

impl Sink {
    /// Create the empty sink for a metric kind
    pub fn new(metric_type: MetricType) -> Self {
        match metric_type {
            MetricType::Counter => Sink::Counter(CounterSink::default()),
            MetricType::Gauge => Sink::Gauge(GaugeSink::default()),
            MetricType::Rate => Sink::Rate(RateSink::default()),
            MetricType::Trend => Sink::Trend(TrendSink::default()),
        }
    }

    /// Merge one sample value into the accumulator
    pub fn add(&mut self, value: f64) {
        match self {
            Sink::Counter(sink) => sink.add(value),
            Sink::Gauge(sink) => sink.add(value),
            Sink::Rate(sink) => sink.add(value),
            Sink::Trend(sink) => sink.add(value),
        }
    }
}

/// Accumulator that sums values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CounterSink {
    /// Sum of all added values
    pub sum: f64,
}

impl CounterSink {
    /// Add a value to the sum
    pub fn add(&mut self, value: f64) {
        self.sum += value;
    }
}

/// Accumulator that keeps the most recent value and its observed extents.
///
/// The minimum is tracked from the first observation; the maximum starts
/// at zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GaugeSink {
    /// The most recently added value
    pub value: f64,
    /// Smallest value observed
    pub min: f64,
    /// Largest value observed (at least zero)
    pub max: f64,
    min_set: bool,
}

impl GaugeSink {
    /// Replace the current value, updating the extents
    pub fn add(&mut self, value: f64) {
        self.value = value;
        if value > self.max {
            self.max = value;
        }
        if !self.min_set || value < self.min {
            self.min = value;
            self.min_set = true;
        }
    }
}

/// Accumulator that tracks how many added values were non-zero
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateSink {
    /// Count of non-zero values
    pub trues: u64,
    /// Count of all values
    pub total: u64,
}

impl RateSink {
    /// Count a value against the total
    pub fn add(&mut self, value: f64) {
        self.total += 1;
        if value != 0.0 {
            self.trues += 1;
        }
    }

    /// The share of non-zero values, or zero for an empty sink
    pub fn rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.trues as f64 / self.total as f64
        }
    }
}

/// Accumulator that keeps every added value so percentiles can be read
/// out of the full distribution.
///
/// Values are sorted lazily on the first percentile query after an add.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrendSink {
    values: Vec<f64>,
    sorted: bool,
    min: f64,
    max: f64,
    sum: f64,
}

impl TrendSink {
    /// Append a value to the distribution
    pub fn add(&mut self, value: f64) {
        if self.values.is_empty() {
            self.min = value;
            self.max = value;
        } else {
            if value < self.min {
                self.min = value;
            }
            if value > self.max {
                self.max = value;
            }
        }
        self.values.push(value);
        self.sorted = false;
        self.sum += value;
    }

    /// Number of values in the distribution
    pub fn count(&self) -> usize {
        self.values.len()
    }

    /// Smallest value, or zero for an empty sink
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Largest value, or zero for an empty sink
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Sum of all values
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Mean of the distribution, or zero for an empty sink
    pub fn avg(&self) -> f64 {
        if self.values.is_empty() {
            0.0
        } else {
            self.sum / self.values.len() as f64
        }
    }

    /// The `pct` percentile (in `0.0..=1.0`), linearly interpolated
    /// between adjacent order statistics.
    pub fn percentile(&mut self, pct: f64) -> f64 {
        match self.values.len() {
            0 => 0.0,
            1 => self.values[0],
            n => {
                if !self.sorted {
                    self.values
                        .sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Greater));
                    self.sorted = true;
                }
                let i = pct * (n as f64 - 1.0);
                let lower = self.values[i.floor() as usize];
                let upper = self.values[i.ceil() as usize];
                lower + (upper - lower) * (i - i.floor())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use assert2::check;
    use rstest::rstest;

    use crate::metric::MetricType;
    use crate::sink::{Sink, TrendSink};

    #[test]
    fn factory_matches_metric_type() {
        check!(matches!(
            Sink::new(MetricType::Counter),
            Sink::Counter(_)
        ));
        check!(matches!(Sink::new(MetricType::Gauge), Sink::Gauge(_)));
        check!(matches!(Sink::new(MetricType::Rate), Sink::Rate(_)));
        check!(matches!(Sink::new(MetricType::Trend), Sink::Trend(_)));
    }

    #[test]
    fn counter_sums() {
        let mut sink = Sink::new(MetricType::Counter);
        sink.add(3.5);
        sink.add(3.5);
        let Sink::Counter(counter) = sink else {
            panic!("expected counter")
        };
        check!(counter.sum == 7.0);
    }

    #[test]
    fn gauge_keeps_last_and_extents() {
        let mut sink = Sink::new(MetricType::Gauge);
        for value in [4.0, 9.0, 2.0] {
            sink.add(value);
        }
        let Sink::Gauge(gauge) = sink else {
            panic!("expected gauge")
        };
        check!(gauge.value == 2.0);
        check!(gauge.min == 2.0);
        check!(gauge.max == 9.0);
    }

    #[test]
    fn rate_counts_nonzero() {
        let mut sink = Sink::new(MetricType::Rate);
        for value in [1.0, 0.0, 1.0, 1.0] {
            sink.add(value);
        }
        let Sink::Rate(rate) = sink else {
            panic!("expected rate")
        };
        check!(rate.trues == 3);
        check!(rate.total == 4);
        check!(rate.rate() == 0.75);
    }

    #[rstest]
    #[case(0.0, 1.0)]
    #[case(0.5, 3.0)]
    #[case(0.9, 4.6)]
    #[case(1.0, 5.0)]
    fn trend_percentiles(#[case] pct: f64, #[case] expected: f64) {
        let mut trend = TrendSink::default();
        // insertion order must not matter
        for value in [5.0, 1.0, 4.0, 2.0, 3.0] {
            trend.add(value);
        }
        check!((trend.percentile(pct) - expected).abs() < 1e-9);
    }

    #[test]
    fn trend_summary_stats() {
        let mut trend = TrendSink::default();
        check!(trend.percentile(0.5) == 0.0);
        check!(trend.avg() == 0.0);

        for value in [2.0, 4.0] {
            trend.add(value);
        }
        check!(trend.count() == 2);
        check!(trend.min() == 2.0);
        check!(trend.max() == 4.0);
        check!(trend.sum() == 6.0);
        check!(trend.avg() == 3.0);
    }
}
