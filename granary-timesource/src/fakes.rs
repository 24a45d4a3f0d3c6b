// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::{
    sync::{Arc, Mutex},
    time::{Duration, SystemTime},
};

use crate::Time;

/// Simple static timesource that will always return the same time
#[derive(Debug)]
pub struct StaticTimeSource {
    now: SystemTime,
}

impl StaticTimeSource {
    /// Create a new `StaticTimeSource` that always returns the given time
    ///
    /// # Examples
    ///
    /// ```
    /// use granary_timesource::{TimeSource, fakes::StaticTimeSource};
    /// use std::time::UNIX_EPOCH;
    ///
    /// let static_time = StaticTimeSource::at_time(UNIX_EPOCH);
    /// let ts = TimeSource::custom(static_time);
    /// assert_eq!(ts.system_time(), UNIX_EPOCH);
    /// ```
    pub fn at_time(time: impl Into<SystemTime>) -> Self {
        Self { now: time.into() }
    }
}

impl Time for StaticTimeSource {
    fn now(&self) -> SystemTime {
        self.now
    }
}

/// Fake timesource that is loaded with one time, but can be moved forward
/// or reloaded through a cloned handle while the clock is in use
#[derive(Debug, Clone)]
pub struct ManuallyAdvancedTimeSource(Arc<Mutex<StaticTimeSource>>);

impl ManuallyAdvancedTimeSource {
    /// Create a new `ManuallyAdvancedTimeSource` started at the given time.
    ///
    /// You can subsequently call [`Self::update_time`] or [`Self::advance`]
    /// to modify the loaded time.
    ///
    /// # Examples
    ///
    /// ```
    /// use granary_timesource::{TimeSource, fakes::ManuallyAdvancedTimeSource};
    /// use std::time::UNIX_EPOCH;
    ///
    /// let fake_time = ManuallyAdvancedTimeSource::at_time(UNIX_EPOCH);
    /// let ts = TimeSource::custom(fake_time.clone());
    /// assert_eq!(ts.system_time(), UNIX_EPOCH);
    /// ```
    pub fn at_time(time: impl Into<SystemTime>) -> Self {
        let ts = StaticTimeSource::at_time(time);
        Self(Arc::from(Mutex::from(ts)))
    }

    /// Replace the `SystemTime` loaded into this time source.
    ///
    /// # Examples
    ///
    /// ```
    /// use granary_timesource::{TimeSource, fakes::ManuallyAdvancedTimeSource};
    /// use std::time::{Duration, UNIX_EPOCH};
    ///
    /// let fake_time = ManuallyAdvancedTimeSource::at_time(UNIX_EPOCH);
    /// let ts = TimeSource::custom(fake_time.clone());
    ///
    /// let new_timestamp = UNIX_EPOCH + Duration::from_secs(100);
    /// fake_time.update_time(new_timestamp);
    /// assert_eq!(ts.system_time(), new_timestamp);
    /// ```
    pub fn update_time(&self, time: impl Into<SystemTime>) {
        let mut guard = self.0.lock().unwrap();
        guard.now = time.into();
    }

    /// Move the loaded time forward by a duration.
    ///
    /// # Examples
    ///
    /// ```
    /// use granary_timesource::{TimeSource, fakes::ManuallyAdvancedTimeSource};
    /// use std::time::{Duration, UNIX_EPOCH};
    ///
    /// let fake_time = ManuallyAdvancedTimeSource::at_time(UNIX_EPOCH);
    /// let ts = TimeSource::custom(fake_time.clone());
    ///
    /// fake_time.advance(Duration::from_secs(100));
    /// assert_eq!(ts.system_time(), UNIX_EPOCH + Duration::from_secs(100));
    /// ```
    pub fn advance(&self, by: Duration) {
        let mut guard = self.0.lock().unwrap();
        guard.now += by;
    }
}

impl Time for ManuallyAdvancedTimeSource {
    fn now(&self) -> SystemTime {
        self.0.lock().unwrap().now
    }
}
