use itertools::Itertools;

/// Successive differences of key-down timestamps (milliseconds), in order.
/// `n` timestamps yield `n - 1` intervals; nothing is smoothed or dropped.
pub fn intervals_from_timestamps(timestamps: &[f64]) -> Vec<f64> {
    timestamps
        .iter()
        .tuple_windows()
        .map(|(prev, next)| latency(*prev, *next))
        .collect()
}

fn latency(prev: f64, next: f64) -> f64 {
    // timestamps from a monotonic clock never go backwards; clamp anything that does
    (next - prev).max(0.0)
}

/// Incremental form of [`intervals_from_timestamps`] fed one key-down at a time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntervalRecorder {
    previous: Option<f64>,
    intervals: Vec<f64>,
}

impl IntervalRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a key-down at `at_ms`. Returns the interval it produced, if any:
    /// the first key-down after a reset has nothing to diff against.
    pub fn record(&mut self, at_ms: f64) -> Option<f64> {
        let interval = self.previous.map(|prev| latency(prev, at_ms));
        if let Some(interval) = interval {
            self.intervals.push(interval);
        }
        self.previous = Some(at_ms);
        interval
    }

    pub fn intervals(&self) -> &[f64] {
        &self.intervals
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn has_started(&self) -> bool {
        self.previous.is_some()
    }

    pub fn clear(&mut self) {
        self.previous = None;
        self.intervals.clear();
    }
}
