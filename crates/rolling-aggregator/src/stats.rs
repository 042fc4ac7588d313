//! Live statistics over a device window

use chrono::{DateTime, Utc};
use reading_ingestor::Reading;
use serde::{Deserialize, Serialize};

/// Statistics over the retained window.
///
/// An empty window is reported as `count == 0` with every value `None`;
/// it is not a window of zeros.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    /// Temperature of the newest reading
    pub current: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Mean over the retained window only
    pub avg: Option<f64>,
    pub count: usize,
    /// Sensor timestamp of the newest reading
    pub last_observed_at: Option<DateTime<Utc>>,
    /// Local receipt time of the newest reading
    pub last_accepted_at: Option<DateTime<Utc>>,
}

impl WindowStats {
    /// Sentinel for a device with no retained readings
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compute statistics from readings ordered oldest first
    pub fn compute<'a, I>(readings: I) -> Self
    where
        I: IntoIterator<Item = &'a Reading>,
    {
        let mut stats = Self::empty();
        let mut sum = 0.0;

        for reading in readings {
            let temp = reading.temperature();
            sum += temp;
            stats.count += 1;
            stats.min = Some(stats.min.map_or(temp, |m| m.min(temp)));
            stats.max = Some(stats.max.map_or(temp, |m| m.max(temp)));
            stats.current = Some(temp);
            stats.last_observed_at = Some(reading.observed_at());
            stats.last_accepted_at = Some(reading.accepted_at());
        }

        if stats.count > 0 {
            stats.avg = Some(sum / stats.count as f64);
        }
        stats
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use reading_ingestor::{Ingestor, RawReading};

    fn readings(temps: &[f64]) -> Vec<Reading> {
        let base = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut ingestor = Ingestor::default();
        let mut out: Vec<Reading> = Vec::new();
        for (i, &temp) in temps.iter().enumerate() {
            let at = base + Duration::seconds(i as i64);
            ingestor
                .ingest(RawReading::new("pot-1", temp, at), &mut out)
                .unwrap();
        }
        out
    }

    #[test]
    fn test_basic_stats() {
        let stats = WindowStats::compute(&readings(&[70.0, 85.0, 102.0, 93.0]));

        assert_eq!(stats.count, 4);
        assert_eq!(stats.current, Some(93.0));
        assert_eq!(stats.min, Some(70.0));
        assert_eq!(stats.max, Some(102.0));
        assert!((stats.avg.unwrap() - 87.5).abs() < 0.001);
    }

    #[test]
    fn test_single_reading() {
        let stats = WindowStats::compute(&readings(&[-12.5]));
        assert_eq!(stats.current, Some(-12.5));
        assert_eq!(stats.min, stats.max);
        assert_eq!(stats.avg, Some(-12.5));
    }

    #[test]
    fn test_empty_values() {
        let stats = WindowStats::compute(&Vec::<Reading>::new());
        assert!(stats.is_empty());
        assert_eq!(stats.current, None);
        assert_eq!(stats.avg, None);
        assert_eq!(stats.last_observed_at, None);
        assert_eq!(stats.last_accepted_at, None);
        assert_eq!(stats, WindowStats::empty());
    }
}
