#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

pub mod collect;
pub mod config;
pub mod queue;
pub mod worker;

pub use collect::{Collector, TimeBucket};
pub use config::{AggregatorConfig, ConfigError};
pub use queue::BucketQueue;
pub use worker::BackgroundCollector;
