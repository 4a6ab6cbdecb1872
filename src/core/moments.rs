//! Moment registry
//!
//! Records monotonic ticks under named buckets and derives intervals between
//! them. Each bucket is append-only: once a tick is recorded its index and
//! value never change.

use crate::error::{EasyLogError, Result};
use std::collections::{BTreeSet, HashMap};
use std::panic::Location;
use std::sync::Mutex;
use std::time::Instant;

/// Key used when no caller location can be resolved
pub const UNKNOWN_MOMENT: &str = "Unknown";

/// Source of monotonic ticks
pub trait TickSource: Send + Sync {
    fn now_ticks(&self) -> i64;
}

/// Nanoseconds elapsed since the source was created
#[derive(Debug)]
pub struct SystemTicks {
    origin: Instant,
}

impl SystemTicks {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTicks {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for SystemTicks {
    fn now_ticks(&self) -> i64 {
        i64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(i64::MAX)
    }
}

/// Named buckets of ordered ticks
pub struct MomentRegistry {
    ticks: Box<dyn TickSource>,
    moments: Mutex<HashMap<String, Vec<i64>>>,
}

impl std::fmt::Debug for MomentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MomentRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}

impl Default for MomentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MomentRegistry {
    /// Registry stamping moments with [`SystemTicks`]
    pub fn new() -> Self {
        Self::with_ticks(SystemTicks::new())
    }

    pub fn with_ticks<T: TickSource + 'static>(ticks: T) -> Self {
        Self {
            ticks: Box::new(ticks),
            moments: Mutex::new(HashMap::new()),
        }
    }

    /// Append the current tick under `key` and return the bucket's new length.
    ///
    /// Without a key, or with a blank one, the caller's source location
    /// becomes the key.
    #[track_caller]
    pub fn mark(&self, key: Option<&str>) -> usize {
        let key = match key {
            Some(key) if !key.trim().is_empty() => key.to_string(),
            _ => caller_key(Location::caller()),
        };
        let mut moments = self.moments.lock().unwrap_or_else(|e| e.into_inner());
        let bucket = moments.entry(key).or_default();
        bucket.push(self.ticks.now_ticks());
        bucket.len()
    }

    /// All moments of `key` accepted by `predicate(tick, index)`, in order.
    pub fn get_moments(
        &self,
        key: &str,
        predicate: Option<&dyn Fn(i64, usize) -> bool>,
    ) -> Result<Vec<i64>> {
        self.read(key, |bucket| match predicate {
            None => bucket.to_vec(),
            Some(predicate) => bucket
                .iter()
                .enumerate()
                .filter(|(index, tick)| predicate(**tick, *index))
                .map(|(_, tick)| *tick)
                .collect(),
        })
    }

    /// Moments at `indexes`, in the order the indexes were given.
    /// Out-of-range indexes are skipped.
    pub fn get_moments_by_indexes(&self, key: &str, indexes: Option<&[usize]>) -> Result<Vec<i64>> {
        self.read(key, |bucket| match indexes {
            None => bucket.to_vec(),
            Some(indexes) => indexes
                .iter()
                .filter_map(|i| bucket.get(*i).copied())
                .collect(),
        })
    }

    /// `moment[i] - moment[i - 1]` for each requested `i`, or for every
    /// consecutive pair when `indexes` is `None`. Index 0 has no interval and
    /// is skipped along with out-of-range indexes.
    pub fn get_intervals(&self, key: &str, indexes: Option<&[usize]>) -> Result<Vec<i64>> {
        self.read(key, |bucket| match indexes {
            None => bucket.windows(2).map(|w| w[1] - w[0]).collect(),
            Some(indexes) => indexes
                .iter()
                .filter(|i| **i > 0 && **i < bucket.len())
                .map(|i| bucket[*i] - bucket[*i - 1])
                .collect(),
        })
    }

    /// Keys currently tracked
    pub fn keys(&self) -> BTreeSet<String> {
        let moments = self.moments.lock().unwrap_or_else(|e| e.into_inner());
        moments.keys().cloned().collect()
    }

    /// Number of moments recorded under `key`
    pub fn len(&self, key: &str) -> usize {
        let moments = self.moments.lock().unwrap_or_else(|e| e.into_inner());
        moments.get(key).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        let moments = self.moments.lock().unwrap_or_else(|e| e.into_inner());
        moments.is_empty()
    }

    fn read<T, F>(&self, key: &str, f: F) -> Result<Vec<T>>
    where
        F: FnOnce(&[i64]) -> Vec<T>,
    {
        if key.trim().is_empty() {
            return Err(EasyLogError::invalid_argument(
                "moment key cannot be empty to retrieve the concerned moments",
            ));
        }
        let moments = self.moments.lock().unwrap_or_else(|e| e.into_inner());
        Ok(moments.get(key).map(|bucket| f(bucket)).unwrap_or_default())
    }
}

/// Key derived from a call site: `"{file}: L{line}"`
pub fn caller_key(location: &Location<'_>) -> String {
    if location.file().is_empty() {
        return UNKNOWN_MOMENT.to_string();
    }
    format!("{}: L{}", location.file(), location.line())
}
