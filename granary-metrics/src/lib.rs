#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

pub mod metric;
pub mod registry;
pub mod series;
pub mod sink;

pub use metric::{Metric, MetricType};
pub use registry::{Registry, RegistryError};
pub use series::{Sample, TagSet, TimeSeries};
pub use sink::{CounterSink, GaugeSink, RateSink, Sink, TrendSink};
