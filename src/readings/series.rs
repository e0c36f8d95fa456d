//! Bounded, chronologically ordered reading sequence

use super::types::Reading;
use super::window::Window;

/// Default capacity, matching the backend's `/api/data` response limit
pub const DEFAULT_CAPACITY: usize = 3000;

/// In-memory readings sorted ascending by `ts`.
///
/// The backend returns readings newest-first (and makes no ordering promise),
/// so every batch is normalized on the way in. Duplicates are kept as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingSeries {
    readings: Vec<Reading>,
    capacity: usize,
}

impl Default for ReadingSeries {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl ReadingSeries {
    /// Create an empty series holding at most `capacity` readings
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            readings: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Build a series from an unordered batch
    pub fn from_unordered(readings: Vec<Reading>, capacity: usize) -> Self {
        let mut series = Self::with_capacity(capacity);
        series.replace(readings);
        series
    }

    /// Replace the contents with a freshly fetched batch
    pub fn replace(&mut self, mut readings: Vec<Reading>) {
        // Stable: equal timestamps keep backend order
        readings.sort_by_key(|r| r.ts);
        self.readings = readings;
        self.trim();
    }

    /// Drop the oldest readings beyond capacity
    fn trim(&mut self) {
        if self.readings.len() > self.capacity {
            let excess = self.readings.len() - self.capacity;
            self.readings.drain(..excess);
        }
    }

    /// Most recent reading
    pub fn latest(&self) -> Option<&Reading> {
        self.readings.last()
    }

    /// All readings, oldest first
    pub fn as_slice(&self) -> &[Reading] {
        &self.readings
    }

    /// Readings with `ts >= now - window`, oldest first
    pub fn window(&self, window: Window, now: i64) -> &[Reading] {
        let cutoff = window.cutoff(now);
        let start = self.readings.partition_point(|r| r.ts < cutoff);
        &self.readings[start..]
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Span of timestamps held, `(oldest, newest)`
    pub fn span(&self) -> Option<(i64, i64)> {
        match (self.readings.first(), self.readings.last()) {
            (Some(first), Some(last)) => Some((first.ts, last.ts)),
            _ => None,
        }
    }
}
