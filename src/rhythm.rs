//! Summary statistics over captured inter-keystroke intervals.

pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Population standard deviation
pub fn std_dev(data: &[f64]) -> Option<f64> {
    let data_mean = mean(data)?;
    let variance = data
        .iter()
        .map(|value| {
            let diff = data_mean - *value;
            diff * diff
        })
        .sum::<f64>()
        / data.len() as f64;

    Some(variance.sqrt())
}

/// Shape of a typing rhythm, shown next to the analysis result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RhythmSummary {
    pub mean_ms: f64,
    pub std_dev_ms: f64,
    pub longest_pause_ms: f64,
}

impl RhythmSummary {
    pub fn of(intervals: &[f64]) -> Option<Self> {
        Some(Self {
            mean_ms: mean(intervals)?,
            std_dev_ms: std_dev(intervals)?,
            longest_pause_ms: intervals.iter().copied().fold(0.0, f64::max),
        })
    }

    /// Keystrokes per second implied by the mean interval
    pub fn keys_per_sec(&self) -> Option<f64> {
        (self.mean_ms > 0.0).then(|| 1000.0 / self.mean_ms)
    }
}
