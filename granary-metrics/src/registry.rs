//! Registry that interns metrics by name.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use regex_lite::Regex;

use crate::metric::{Metric, MetricType};
use crate::series::TagSet;

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[a-zA-Z_][a-zA-Z0-9_]{0,127}$").expect("known good"));

/// An error type describing why a metric could not be registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The metric name is empty, too long, or contains invalid characters
    InvalidName(String),
    /// The name is already registered with a different metric type
    TypeMismatch {
        /// The contested name
        name: String,
        /// The type the name was first registered with
        existing: MetricType,
        /// The type requested by the failing registration
        requested: MetricType,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::InvalidName(name) => {
                write!(f, "invalid metric name {name:?}")
            }
            RegistryError::TypeMismatch {
                name,
                existing,
                requested,
            } => write!(
                f,
                "metric {name:?} already registered as {existing}, requested {requested}"
            ),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Interns metrics by name so every series referring to a metric shares
/// one definition.
///
/// Registering the same name twice with the same type returns the
/// already-interned metric.
#[derive(Debug, Default)]
pub struct Registry {
    metrics: HashMap<String, Arc<Metric>>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a metric, or return the existing one if `name` is already
    /// registered with the same type.
    ///
    /// # Examples
    ///
    /// ```
    /// use granary_metrics::{MetricType, Registry};
    ///
    /// let mut registry = Registry::new();
    /// let m = registry.new_metric("iterations", MetricType::Counter).unwrap();
    /// assert_eq!(m.name, "iterations");
    /// ```
    pub fn new_metric(
        &mut self,
        name: impl Into<String>,
        metric_type: MetricType,
    ) -> Result<Arc<Metric>, RegistryError> {
        let name = name.into();
        if !NAME_PATTERN.is_match(&name) {
            return Err(RegistryError::InvalidName(name));
        }
        if let Some(existing) = self.metrics.get(&name) {
            if existing.metric_type != metric_type {
                return Err(RegistryError::TypeMismatch {
                    name,
                    existing: existing.metric_type,
                    requested: metric_type,
                });
            }
            return Ok(Arc::clone(existing));
        }
        let metric = Metric::new(name.clone(), metric_type);
        self.metrics.insert(name, Arc::clone(&metric));
        Ok(metric)
    }

    /// Look up a previously registered metric
    pub fn get(&self, name: &str) -> Option<Arc<Metric>> {
        self.metrics.get(name).cloned()
    }

    /// The empty tag set all series tags descend from
    pub fn root_tag_set(&self) -> TagSet {
        TagSet::default()
    }
}

#[cfg(test)]
mod tests {
    use assert2::check;

    use crate::metric::MetricType;
    use crate::registry::{Registry, RegistryError};

    #[test]
    fn interns_by_name() {
        let mut registry = Registry::new();
        let m1 = registry.new_metric("vus", MetricType::Gauge).unwrap();
        let m2 = registry.new_metric("vus", MetricType::Gauge).unwrap();
        check!(std::sync::Arc::ptr_eq(&m1, &m2));
        check!(registry.get("vus").is_some());
        check!(registry.get("missing").is_none());
    }

    #[test]
    fn rejects_invalid_names() {
        let mut registry = Registry::new();
        for name in ["", "1leading_digit", "has space", &"x".repeat(129)] {
            check!(
                registry.new_metric(name, MetricType::Counter)
                    == Err(RegistryError::InvalidName(name.to_string()))
            );
        }
    }

    #[test]
    fn rejects_type_conflicts() {
        let mut registry = Registry::new();
        registry.new_metric("vus", MetricType::Gauge).unwrap();
        let err = registry.new_metric("vus", MetricType::Counter).unwrap_err();
        check!(
            err == RegistryError::TypeMismatch {
                name: "vus".to_string(),
                existing: MetricType::Gauge,
                requested: MetricType::Counter,
            }
        );
    }
}
