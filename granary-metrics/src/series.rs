//! Time-series identity keys and samples.

use std::sync::Arc;
use std::time::SystemTime;

use smallvec::SmallVec;

use crate::metric::Metric;

/// An immutable set of key/value tags, kept sorted by key so that two
/// sets with the same pairs are structurally equal and hash identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TagSet {
    tags: SmallVec<[(String, String); 4]>,
}

impl TagSet {
    /// Return a new set with `key` bound to `value`, replacing any
    /// existing binding for `key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use granary_metrics::TagSet;
    ///
    /// let tags = TagSet::default().with("status", "200").with("method", "GET");
    /// assert_eq!(tags.get("status"), Some("200"));
    /// assert_eq!(tags.with("status", "500").get("status"), Some("500"));
    /// ```
    pub fn with(&self, key: impl Into<String>, value: impl Into<String>) -> TagSet {
        let key = key.into();
        let value = value.into();
        let mut tags = self.tags.clone();
        match tags.binary_search_by(|(k, _)| k.as_str().cmp(key.as_str())) {
            Ok(i) => tags[i].1 = value,
            Err(i) => tags.insert(i, (key, value)),
        }
        TagSet { tags }
    }

    /// Look up the value bound to `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.tags
            .binary_search_by(|(k, _)| k.as_str().cmp(key))
            .ok()
            .map(|i| self.tags[i].1.as_str())
    }

    /// Number of tags in the set
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether the set holds no tags
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Iterate over the pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// The identity of a stream of samples: a metric plus the tag set the
/// samples were observed with.
///
/// Series are map keys throughout the pipeline; equality and hashing are
/// structural (through the shared [`Metric`] definition) and cloning is
/// cheap relative to the strings it would otherwise copy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimeSeries {
    /// The metric the samples belong to
    pub metric: Arc<Metric>,
    /// The tags the samples were observed with
    pub tags: TagSet,
}

/// A single observed value, consumed by the pipeline by value.
#[derive(Debug, Clone)]
pub struct Sample {
    /// The series this sample belongs to
    pub time_series: TimeSeries,
    /// The observed value
    pub value: f64,
    /// When the value was observed, which decides the time bucket the
    /// sample lands in (not when it was collected)
    pub timestamp: SystemTime,
}
