//! Feed samples from a few producer threads through the background
//! collector, then drain the queue and print what was aggregated.
//!
//! Run with `RUST_LOG=debug` to see the expiry scans.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};

use granary_aggregation::{AggregatorConfig, BackgroundCollector, BucketQueue};
use granary_metrics::{MetricType, Registry, Sample, Sink, TimeSeries};
use granary_timesource::TimeSource;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut registry = Registry::new();
    let reqs = registry.new_metric("http_reqs", MetricType::Counter)?;
    let duration = registry.new_metric("http_req_duration", MetricType::Trend)?;

    let config = AggregatorConfig {
        aggregation_period: Duration::from_secs(1),
        wait_period: Duration::from_secs(1),
    };
    let queue = Arc::new(BucketQueue::new());
    let collector = BackgroundCollector::spawn(&config, TimeSource::System, Arc::clone(&queue))?;

    let producers: Vec<_> = (0..4u32)
        .map(|p| {
            let collector = collector.clone();
            let registry_tags = registry.root_tag_set();
            let reqs = reqs.clone();
            let duration = duration.clone();
            thread::spawn(move || {
                for i in 0..100u32 {
                    let status = if i % 10 == 0 { "500" } else { "200" };
                    let tags = registry_tags.with("status", status);
                    let now = SystemTime::now();
                    collector.send(Sample {
                        time_series: TimeSeries {
                            metric: reqs.clone(),
                            tags: tags.clone(),
                        },
                        value: 1.0,
                        timestamp: now,
                    });
                    collector.send(Sample {
                        time_series: TimeSeries {
                            metric: duration.clone(),
                            tags,
                        },
                        value: 5.0 + f64::from((p * 31 + i) % 7),
                        timestamp: now,
                    });
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    // dropping the last handle drains every remaining bucket
    collector.close();

    for bucket in queue.pop_all() {
        for (series, sink) in &bucket.sinks {
            match sink {
                Sink::Counter(counter) => {
                    println!(
                        "{} status={} sum={}",
                        series.metric.name,
                        series.tags.get("status").unwrap_or("-"),
                        counter.sum
                    );
                }
                Sink::Trend(trend) => {
                    println!(
                        "{} status={} count={} avg={:.1}",
                        series.metric.name,
                        series.tags.get("status").unwrap_or("-"),
                        trend.count(),
                        trend.avg()
                    );
                }
                _ => {}
            }
        }
    }
    Ok(())
}
