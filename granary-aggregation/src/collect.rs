//! Sample collection into fixed-width time buckets.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use granary_metrics::{Sample, Sink, TimeSeries};
use granary_timesource::TimeSource;
use hashbrown::HashMap;

use crate::config::{AggregatorConfig, ConfigError};

/// A closed aggregation window handed off for export.
///
/// Ownership moves to the queue and then to the consumer; nothing in the
/// pipeline mutates a bucket after it was flushed.
#[derive(Debug)]
pub struct TimeBucket {
    /// Midpoint of the window the sinks were aggregated in, which is a
    /// stable representative timestamp rather than the flush wall-clock
    /// time
    pub time: SystemTime,
    /// Aggregated state per series
    pub sinks: HashMap<TimeSeries, Sink>,
}

/// Groups samples into fixed-width, epoch-aligned windows and ages
/// windows out once they fall behind the grace delay.
///
/// Window `k` spans `[k * period, (k + 1) * period)` in unix seconds, so
/// bucketing is a pure function of the sample timestamp and the
/// configured period. All "current time" reads go through the injected
/// [`TimeSource`].
///
/// The collector holds no lock: every operation takes `&mut self`, so a
/// single logical writer owns ingestion and expiry. Producers that need
/// to feed it from many threads route samples through
/// [`crate::BackgroundCollector`].
#[derive(Debug)]
pub struct Collector {
    aggregation_period: Duration,
    wait_period: Duration,
    time_buckets: HashMap<i64, HashMap<TimeSeries, Sink>>,
    time_source: TimeSource,
}

impl Collector {
    /// Create a collector from validated configuration
    pub fn new(config: &AggregatorConfig, time_source: TimeSource) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            aggregation_period: config.aggregation_period,
            wait_period: config.wait_period,
            time_buckets: HashMap::new(),
            time_source,
        })
    }

    /// Merge one sample into the window its timestamp falls in.
    ///
    /// The per-series sink is created on first sight within the window,
    /// keyed by the sample's metric type. A sample whose window was
    /// already flushed re-creates the window under the same ID and ages
    /// out on a later scan; downstream consumers tolerate the occasional
    /// small stale bucket this produces.
    pub fn collect_sample(&mut self, sample: Sample) {
        let id = self.bucket_id(sample.timestamp);
        let sinks = self.time_buckets.entry(id).or_default();
        match sinks.get_mut(&sample.time_series) {
            Some(sink) => sink.add(sample.value),
            None => {
                let mut sink = Sink::new(sample.time_series.metric.metric_type);
                sink.add(sample.value);
                sinks.insert(sample.time_series, sink);
            }
        }
    }

    /// Remove and return every window that has aged past the grace
    /// delay.
    ///
    /// Returns an empty vector, without allocating, when nothing
    /// qualifies, so periodic callers treat "nothing to flush" as a
    /// cheap no-op. The order of the returned buckets is unspecified.
    pub fn expired_buckets(&mut self) -> Vec<TimeBucket> {
        let cutoff = self.bucket_cutoff_id();
        let expired_ids: Vec<i64> = self
            .time_buckets
            .keys()
            .copied()
            .filter(|id| *id <= cutoff)
            .collect();
        if expired_ids.is_empty() {
            return Vec::new();
        }

        let mut expired = Vec::with_capacity(expired_ids.len());
        for id in expired_ids {
            if let Some(sinks) = self.time_buckets.remove(&id) {
                expired.push(TimeBucket {
                    time: self.time_from_bucket_id(id),
                    sinks,
                });
            }
        }
        tracing::debug!(buckets = expired.len(), "flushing expired time buckets");
        expired
    }

    /// Zero the grace delay so every held window becomes eligible on the
    /// next [`Self::expired_buckets`] call.
    ///
    /// Used during shutdown to make the final drain immediate instead of
    /// time-gated.
    pub fn drop_expiring_delay(&mut self) {
        self.wait_period = Duration::ZERO;
    }

    // Sub-second precision is discarded before dividing, so the ID only
    // depends on whole unix seconds. Pre-epoch timestamps clamp to zero.
    fn bucket_id(&self, t: SystemTime) -> i64 {
        let unix_seconds = t.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs() as i64;
        unix_seconds / self.aggregation_period.as_secs() as i64
    }

    // The window midpoint, so consumers can reason about "when" without
    // picking an arbitrary edge.
    fn time_from_bucket_id(&self, id: i64) -> SystemTime {
        let start = Duration::from_secs(id as u64 * self.aggregation_period.as_secs());
        UNIX_EPOCH + start + self.aggregation_period / 2
    }

    // The wait period is subtracted from the full-precision clock value
    // before quantization: the grace window is measured in real seconds,
    // not in bucket counts.
    fn bucket_cutoff_id(&self) -> i64 {
        let horizon = self
            .time_source
            .system_time()
            .checked_sub(self.wait_period)
            .unwrap_or(UNIX_EPOCH);
        self.bucket_id(horizon)
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    use assert2::{check, let_assert};
    use granary_metrics::{CounterSink, MetricType, Registry, Sample, Sink, TimeSeries};
    use granary_timesource::{TimeSource, fakes::StaticTimeSource};
    use hashbrown::HashMap;
    use rstest::rstest;

    use crate::collect::Collector;
    use crate::config::AggregatorConfig;

    fn unix(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn collector_at(now: SystemTime) -> Collector {
        let config = AggregatorConfig {
            aggregation_period: Duration::from_secs(3),
            wait_period: Duration::from_secs(1),
        };
        Collector::new(&config, TimeSource::custom(StaticTimeSource::at_time(now))).unwrap()
    }

    fn counter_series(registry: &mut Registry, tag_value: &str) -> TimeSeries {
        let metric = registry.new_metric("metric1", MetricType::Counter).unwrap();
        TimeSeries {
            metric,
            tags: registry.root_tag_set().with("t1", tag_value),
        }
    }

    #[test]
    fn collect_sample_opens_one_bucket_per_window() {
        let mut registry = Registry::new();
        let series = counter_series(&mut registry, "v1");
        let mut collector = collector_at(unix(31));

        for secs in [10, 20, 30] {
            collector.collect_sample(Sample {
                time_series: series.clone(),
                value: 1.0,
                timestamp: unix(secs),
            });
        }

        check!(collector.time_buckets.len() == 3);
    }

    #[test]
    fn collect_sample_merges_same_series_within_a_window() {
        let mut registry = Registry::new();
        let series = counter_series(&mut registry, "v1");
        let mut collector = collector_at(unix(31));

        // timestamps 11, 12, 13: floor(11/3) = 3, floor(12/3) = floor(13/3) = 4
        for secs in [11, 12, 13] {
            collector.collect_sample(Sample {
                time_series: series.clone(),
                value: 3.5,
                timestamp: unix(secs),
            });
        }

        check!(collector.time_buckets.len() == 2);
        check!(collector.time_buckets.contains_key(&3));
        check!(collector.time_buckets.contains_key(&4));

        let_assert!(Some(Sink::Counter(counter)) = collector.time_buckets[&4].get(&series));
        check!(counter.sum == 7.0);
    }

    #[test]
    fn drop_expiring_delay_zeroes_the_wait_period() {
        let mut collector = collector_at(unix(0));
        collector.drop_expiring_delay();
        check!(collector.wait_period == Duration::ZERO);
    }

    #[test]
    fn no_bucket_expires_before_the_cutoff() {
        let mut collector = collector_at(unix(10));
        collector.time_buckets.insert(6, HashMap::new());

        check!(collector.expired_buckets().is_empty());
        check!(collector.time_buckets.len() == 1);
    }

    #[test]
    fn expired_buckets_hands_back_the_removed_sinks() {
        let mut registry = Registry::new();
        let ts1 = counter_series(&mut registry, "v1");
        let ts2 = counter_series(&mut registry, "v2");

        let mut collector = collector_at(unix(10));
        collector.time_buckets.insert(
            3,
            HashMap::from_iter([
                (ts1.clone(), Sink::Counter(CounterSink { sum: 10.0 })),
                (ts2.clone(), Sink::Counter(CounterSink { sum: 4.0 })),
            ]),
        );

        let expired = collector.expired_buckets();
        check!(expired.len() == 1);
        check!(expired[0].time > UNIX_EPOCH);
        check!(
            expired[0].sinks
                == HashMap::from_iter([
                    (ts1, Sink::Counter(CounterSink { sum: 10.0 })),
                    (ts2, Sink::Counter(CounterSink { sum: 4.0 })),
                ])
        );
    }

    #[test]
    fn only_buckets_at_or_below_the_cutoff_expire() {
        // now = 10s, wait = 1s: cutoff = floor(9/3) = 3
        let mut collector = collector_at(unix(10));
        for id in [3, 6, 9] {
            collector.time_buckets.insert(id, HashMap::new());
        }

        let expired = collector.expired_buckets();
        check!(expired.len() == 1);
        check!(collector.time_buckets.len() == 2);
        check!(!collector.time_buckets.contains_key(&3));

        // the reported time is the window midpoint: 3 * 3s + 1.5s
        check!(expired[0].time == unix(10) + Duration::from_millis(500));
    }

    #[rstest]
    #[case(0, 0)]
    #[case(2, 0)]
    #[case(3, 1)]
    #[case(28, 9)]
    #[case(59, 19)]
    fn bucket_id_is_the_window_quotient(#[case] unix_seconds: u64, #[case] expected: i64) {
        let collector = collector_at(unix(0));
        check!(collector.bucket_id(unix(unix_seconds)) == expected);
    }

    #[test]
    fn bucket_id_ignores_subsecond_precision() {
        let collector = collector_at(unix(0));
        check!(collector.bucket_id(unix(59) + Duration::from_nanos(7)) == 19);
    }

    #[test]
    fn bucket_id_is_monotonic() {
        let collector = collector_at(unix(0));
        let mut previous = collector.bucket_id(UNIX_EPOCH);
        for secs in 0..100 {
            let id = collector.bucket_id(unix(secs) + Duration::from_millis(secs % 17));
            check!(id >= previous);
            previous = id;
        }
    }

    #[test]
    fn time_from_bucket_id_is_the_window_midpoint() {
        let collector = collector_at(unix(0));

        // 49 * 3s + 1.5s
        check!(collector.time_from_bucket_id(49) == unix(148) + Duration::from_millis(500));

        for id in [0, 1, 49, 560967721] {
            let midpoint = collector.time_from_bucket_id(id);
            let window_start = unix(id as u64 * 3);
            check!(midpoint.duration_since(window_start).unwrap() == Duration::from_millis(1500));
        }
    }

    #[test]
    fn cutoff_subtracts_the_wait_before_quantizing() {
        // 2023-05-01T01:06:06.000000008Z
        let now = UNIX_EPOCH + Duration::new(1_682_903_166, 8);
        let collector = collector_at(now);

        // floor((now - 1s) / 3s) = floor(1682903165 / 3)
        check!(collector.bucket_cutoff_id() == 560_967_721);
    }

    #[test]
    fn late_sample_recreates_an_expired_bucket() {
        let mut registry = Registry::new();
        let series = counter_series(&mut registry, "v1");
        let mut collector = collector_at(unix(100));

        let late_sample = Sample {
            time_series: series.clone(),
            value: 1.0,
            timestamp: unix(11),
        };

        collector.collect_sample(late_sample.clone());
        check!(collector.expired_buckets().len() == 1);

        // same timestamp after its window was flushed: a fresh bucket
        // appears under the stale ID and flushes again later
        collector.collect_sample(late_sample);
        check!(collector.time_buckets.contains_key(&3));
        let expired = collector.expired_buckets();
        check!(expired.len() == 1);
        let_assert!(Some(Sink::Counter(counter)) = expired[0].sinks.get(&series));
        check!(counter.sum == 1.0);
    }
}
