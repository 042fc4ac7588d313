//! Time-bounded window of readings for one device

use crate::stats::WindowStats;
use chrono::{DateTime, Duration, Utc};
use reading_ingestor::Reading;
use std::collections::VecDeque;

/// Default window duration (seconds)
pub const DEFAULT_WINDOW_SECS: u64 = 60;

/// Ordered readings observed within the last `duration` of the newest entry
#[derive(Debug, Clone)]
pub struct DeviceWindow {
    /// Oldest at the front, newest at the back
    entries: VecDeque<Reading>,
    duration: Duration,
    /// Total readings recorded (for statistics)
    total_recorded: u64,
}

impl DeviceWindow {
    /// Create an empty window of the given duration
    pub fn new(duration: Duration) -> Self {
        Self {
            entries: VecDeque::new(),
            duration,
            total_recorded: 0,
        }
    }

    /// Append a reading, then evict every entry older than the window.
    ///
    /// Callers guarantee non-decreasing `observed_at`, so the newest entry is
    /// always the reference point and eviction only ever pops from the front.
    /// A cutoff before the earliest representable time evicts nothing.
    pub fn push(&mut self, reading: Reading) {
        let newest = reading.observed_at();
        self.entries.push_back(reading);
        self.total_recorded += 1;
        if let Some(cutoff) = newest.checked_sub_signed(self.duration) {
            self.evict_older_than(cutoff);
        }
    }

    fn evict_older_than(&mut self, cutoff: DateTime<Utc>) {
        while self
            .entries
            .front()
            .is_some_and(|r| r.observed_at() < cutoff)
        {
            self.entries.pop_front();
        }
    }

    /// Statistics over the retained readings
    pub fn stats(&self) -> WindowStats {
        WindowStats::compute(&self.entries)
    }

    /// Retained readings, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Reading> {
        self.entries.iter()
    }

    /// Most recent reading
    pub fn latest(&self) -> Option<&Reading> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Readings recorded over the window's lifetime, evicted ones included
    pub fn total_recorded(&self) -> u64 {
        self.total_recorded
    }
}
