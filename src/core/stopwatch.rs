//! Restartable stopwatch and elapsed-time rendering
//!
//! The default tag builders embed the time elapsed since the last restart.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Elapsed-time provider consumed by the tag builders
pub trait Stopwatch: Send + Sync {
    /// Time since the last restart
    fn elapsed(&self) -> Duration;

    /// Reset the reference point to now
    fn restart(&self);
}

/// Stopwatch backed by [`Instant`]
#[derive(Debug)]
pub struct SystemStopwatch {
    started: Mutex<Instant>,
}

impl SystemStopwatch {
    pub fn new() -> Self {
        Self {
            started: Mutex::new(Instant::now()),
        }
    }
}

impl Default for SystemStopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch for SystemStopwatch {
    fn elapsed(&self) -> Duration {
        let started = self.started.lock().unwrap_or_else(|e| e.into_inner());
        started.elapsed()
    }

    fn restart(&self) {
        let mut started = self.started.lock().unwrap_or_else(|e| e.into_inner());
        *started = Instant::now();
    }
}

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: u64 = 24 * SECS_PER_HOUR;

/// Render an elapsed duration using the band that fits it:
///
/// | elapsed     | example          |
/// |-------------|------------------|
/// | < 1s        | `042ms`          |
/// | < 10s       | `03.250s`        |
/// | < 10min     | `04:05.006`      |
/// | < 24h       | `5h 6m 7s`       |
/// | < 99 days   | `03.04:05:06`    |
/// | otherwise   | `120:04:05:06.007` |
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_secs = elapsed.as_secs();
    let millis = elapsed.subsec_millis();
    let days = total_secs / SECS_PER_DAY;
    let hours = (total_secs % SECS_PER_DAY) / SECS_PER_HOUR;
    let minutes = (total_secs % SECS_PER_HOUR) / SECS_PER_MINUTE;
    let seconds = total_secs % SECS_PER_MINUTE;

    if total_secs < 1 {
        format!("{:03}ms", millis)
    } else if total_secs < 10 {
        format!("{:02}.{:03}s", seconds, millis)
    } else if total_secs < 10 * SECS_PER_MINUTE {
        format!("{:02}:{:02}.{:03}", minutes, seconds, millis)
    } else if total_secs < SECS_PER_DAY {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if total_secs < 99 * SECS_PER_DAY {
        format!("{:02}.{:02}:{:02}:{:02}", days, hours, minutes, seconds)
    } else {
        format!(
            "{}:{:02}:{:02}:{:02}.{:03}",
            days, hours, minutes, seconds, millis
        )
    }
}
