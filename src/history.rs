use std::collections::VecDeque;

pub const HISTORY_LEN: usize = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct HistorySeries {
    samples: VecDeque<f64>,
}

impl Default for HistorySeries {
    fn default() -> Self {
        Self::new()
    }
}

impl HistorySeries {
    pub fn new() -> Self {
        Self {
            samples: std::iter::repeat(0.0).take(HISTORY_LEN).collect(),
        }
    }

    pub fn push(&mut self, sample: f64) {
        self.samples.push_back(sample);
        self.samples.pop_front();
    }

    pub fn snapshot(&self) -> Vec<f64> {
        self.samples.iter().copied().collect()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[cfg(test)]
    pub fn latest(&self) -> f64 {
        self.samples.back().copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    NoAnimation,
}

impl UpdateMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoAnimation => "none",
        }
    }
}

/// Opaque chart sink fed with the full window after every push.
pub trait TrendSink {
    fn redraw(&mut self, series: &[f64], mode: UpdateMode);
}

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

pub fn sparkline(series: &[f64]) -> String {
    series
        .iter()
        .map(|v| {
            let clamped = if v.is_finite() { v.clamp(0.0, 100.0) } else { 0.0 };
            let idx = ((clamped / 100.0) * (SPARK_LEVELS.len() - 1) as f64).round() as usize;
            SPARK_LEVELS[idx.min(SPARK_LEVELS.len() - 1)]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_full_of_zeros() {
        let series = HistorySeries::new();
        assert_eq!(series.len(), HISTORY_LEN);
        assert!(series.snapshot().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn keeps_last_thirty_in_arrival_order() {
        let mut series = HistorySeries::new();
        for i in 0..75 {
            series.push(i as f64);
            assert_eq!(series.len(), HISTORY_LEN);
        }
        let expected: Vec<f64> = (45..75).map(|i| i as f64).collect();
        assert_eq!(series.snapshot(), expected);
        assert_eq!(series.latest(), 74.0);
    }

    #[test]
    fn snapshot_does_not_mutate() {
        let mut series = HistorySeries::new();
        series.push(12.5);
        let first = series.snapshot();
        let second = series.snapshot();
        assert_eq!(first, second);
        assert_eq!(series.len(), HISTORY_LEN);
    }

    #[test]
    fn sparkline_maps_bounds() {
        assert_eq!(sparkline(&[0.0, 100.0, 150.0, f64::NAN]), "▁██▁");
    }
}
