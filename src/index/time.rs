//! Ordered time series of position fixes.
//!
//! Fixes are bucketed by their exact timestamp, so co-timestamped fixes
//! (common when several loggers run at once) stay together and come back
//! in insertion order.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use super::{GeographicRecord, IndexError, TimeSeries};

/// In-memory time index backed by a `BTreeMap`.
#[derive(Debug, Default, Clone)]
pub struct TimeIndex {
    series: BTreeMap<DateTime<Utc>, Vec<GeographicRecord>>,
    len: usize,
}

impl TimeIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from an iterator of records.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = GeographicRecord>,
    {
        let mut index = Self::new();
        for record in records {
            index.insert(record);
        }
        index
    }

    /// Add a record to the series.
    pub fn insert(&mut self, record: GeographicRecord) {
        self.series.entry(record.timestamp).or_default().push(record);
        self.len += 1;
    }

    /// Total number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the index holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of distinct timestamps.
    #[must_use]
    pub fn distinct_timestamps(&self) -> usize {
        self.series.len()
    }

    /// Earliest and latest indexed timestamps.
    #[must_use]
    pub fn span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let first = self.series.keys().next()?;
        let last = self.series.keys().next_back()?;
        Some((*first, *last))
    }
}

impl TimeSeries for TimeIndex {
    fn exact(&self, timestamp: DateTime<Utc>) -> Result<Vec<GeographicRecord>, IndexError> {
        Ok(self.series.get(&timestamp).cloned().unwrap_or_default())
    }

    fn nearest(
        &self,
        timestamp: DateTime<Utc>,
        window: Duration,
    ) -> Result<Option<DateTime<Utc>>, IndexError> {
        let before = self.series.range(..=timestamp).next_back().map(|(t, _)| *t);
        let after = self.series.range(timestamp..).next().map(|(t, _)| *t);

        let candidate = match (before, after) {
            (Some(b), Some(a)) => {
                // Equal distance keeps the earlier fix.
                if timestamp - b <= a - timestamp {
                    Some(b)
                } else {
                    Some(a)
                }
            }
            (Some(b), None) => Some(b),
            (None, Some(a)) => Some(a),
            (None, None) => None,
        };

        Ok(candidate.filter(|t| distance(*t, timestamp) <= window))
    }
}

fn distance(a: DateTime<Utc>, b: DateTime<Utc>) -> Duration {
    if a >= b {
        a - b
    } else {
        b - a
    }
}
