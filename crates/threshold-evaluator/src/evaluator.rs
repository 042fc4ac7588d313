//! Hysteresis state machine

use crate::classification::Classification;
use crate::config::Thresholds;
use chrono::{DateTime, Utc};
use rolling_aggregator::WindowStats;
use std::collections::HashMap;
use tracing::{debug, info};

/// Holds the current classification of every evaluated device.
///
/// Thresholds are assumed valid (`crit > warn`, margin non-negative); the
/// caller checks them once at configuration time.
pub struct Evaluator {
    thresholds: Thresholds,
    states: HashMap<String, Classification>,
}

impl Evaluator {
    /// Create a new evaluator
    pub fn new(thresholds: Thresholds) -> Self {
        info!("Creating evaluator with thresholds: {:?}", thresholds);
        Self {
            thresholds,
            states: HashMap::new(),
        }
    }

    /// Classify a device from its window statistics as of `now`.
    ///
    /// Silence is measured on the local clock, from the receipt time of the
    /// newest reading. A device that has never reported keeps its current
    /// classification and is not registered by this call.
    pub fn evaluate(&mut self, device_id: &str, stats: &WindowStats, now: DateTime<Utc>) -> Classification {
        let previous = self.states.get(device_id).copied().unwrap_or_default();
        let Some(last_accepted_at) = stats.last_accepted_at else {
            return previous;
        };

        let silent_for = now.signed_duration_since(last_accepted_at);
        let next = if silent_for > self.thresholds.silence_timeout() {
            Classification::Unknown
        } else {
            match stats.current {
                Some(current) => self.transition(previous, current),
                None => previous,
            }
        };

        if next != previous {
            debug!("{}: {} -> {}", device_id, previous, next);
        }
        self.states.insert(device_id.to_string(), next);
        next
    }

    fn transition(&self, previous: Classification, current: f64) -> Classification {
        let t = &self.thresholds;
        match previous {
            // No hysteresis to honour: classify from scratch
            Classification::Safe | Classification::Unknown => self.level(current),
            Classification::Warning => {
                if current >= t.crit_threshold {
                    Classification::Critical
                } else if current < t.warn_release() {
                    Classification::Safe
                } else {
                    Classification::Warning
                }
            }
            Classification::Critical => {
                if current >= t.crit_release() {
                    Classification::Critical
                } else if current < t.warn_release() {
                    Classification::Safe
                } else {
                    Classification::Warning
                }
            }
        }
    }

    /// Classification ignoring hysteresis
    pub fn level(&self, current: f64) -> Classification {
        if current >= self.thresholds.crit_threshold {
            Classification::Critical
        } else if current >= self.thresholds.warn_threshold {
            Classification::Warning
        } else {
            Classification::Safe
        }
    }

    /// Current classification, `None` if the device was never evaluated
    pub fn classification(&self, device_id: &str) -> Option<Classification> {
        self.states.get(device_id).copied()
    }

    /// Discard a device's classification
    pub fn remove(&mut self, device_id: &str) -> bool {
        self.states.remove(device_id).is_some()
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(Thresholds::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(secs)
    }

    fn stats(current: f64, at: i64) -> WindowStats {
        WindowStats {
            current: Some(current),
            min: Some(current),
            max: Some(current),
            avg: Some(current),
            count: 1,
            last_observed_at: Some(t(at)),
            last_accepted_at: Some(t(at)),
        }
    }

    fn run(evaluator: &mut Evaluator, temps: &[f64]) -> Vec<Classification> {
        temps
            .iter()
            .enumerate()
            .map(|(i, &temp)| evaluator.evaluate("pot-1", &stats(temp, i as i64), t(i as i64)))
            .collect()
    }

    #[test]
    fn test_escalation_sequence() {
        let mut evaluator = Evaluator::default();
        assert_eq!(
            run(&mut evaluator, &[70.0, 85.0, 102.0]),
            vec![
                Classification::Safe,
                Classification::Warning,
                Classification::Critical
            ]
        );
    }

    #[test]
    fn test_direct_jump_to_critical() {
        let mut evaluator = Evaluator::default();
        assert_eq!(run(&mut evaluator, &[20.0, 150.0]).last(), Some(&Classification::Critical));
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let mut evaluator = Evaluator::default();
        assert_eq!(run(&mut evaluator, &[80.0]), vec![Classification::Warning]);

        let mut evaluator = Evaluator::default();
        assert_eq!(run(&mut evaluator, &[100.0]), vec![Classification::Critical]);
    }

    #[test]
    fn test_warning_hysteresis() {
        let mut evaluator = Evaluator::default();
        let classes = run(&mut evaluator, &[85.0, 79.0, 75.0, 74.9]);
        assert_eq!(
            classes,
            vec![
                Classification::Warning,
                Classification::Warning,
                Classification::Warning,
                Classification::Safe
            ]
        );
    }

    #[test]
    fn test_critical_hysteresis() {
        let mut evaluator = Evaluator::default();
        let classes = run(&mut evaluator, &[105.0, 99.0, 95.0, 94.9]);
        assert_eq!(
            classes,
            vec![
                Classification::Critical,
                Classification::Critical,
                Classification::Critical,
                Classification::Warning
            ]
        );
    }

    #[test]
    fn test_critical_straight_to_safe() {
        let mut evaluator = Evaluator::default();
        let classes = run(&mut evaluator, &[105.0, 40.0]);
        assert_eq!(classes[1], Classification::Safe);
    }

    #[test]
    fn test_critical_into_warning_band() {
        // Below warn but inside its release band: WARNING, not SAFE
        let mut evaluator = Evaluator::default();
        let classes = run(&mut evaluator, &[105.0, 77.0]);
        assert_eq!(classes[1], Classification::Warning);
    }

    #[test]
    fn test_silence_becomes_unknown() {
        let mut evaluator = Evaluator::default();
        let last = stats(70.0, 0);
        assert_eq!(evaluator.evaluate("pot-1", &last, t(0)), Classification::Safe);
        assert_eq!(evaluator.evaluate("pot-1", &last, t(30)), Classification::Safe);
        assert_eq!(evaluator.evaluate("pot-1", &last, t(31)), Classification::Unknown);
        assert_eq!(evaluator.classification("pot-1"), Some(Classification::Unknown));
    }

    #[test]
    fn test_lagging_sensor_clock_is_not_silence() {
        let mut evaluator = Evaluator::default();
        for i in 0..5 {
            // Sensor clock 40s behind, received every second
            let lagging = WindowStats {
                last_observed_at: Some(t(i - 40)),
                ..stats(85.0, i)
            };
            assert_eq!(evaluator.evaluate("pot-1", &lagging, t(i)), Classification::Warning);
        }
    }

    #[test]
    fn test_silence_overrides_hysteresis() {
        let mut evaluator = Evaluator::default();
        let hot = stats(120.0, 0);
        evaluator.evaluate("pot-1", &hot, t(0));
        assert_eq!(evaluator.evaluate("pot-1", &hot, t(45)), Classification::Unknown);
    }

    #[test]
    fn test_recovers_from_unknown_without_hysteresis() {
        let mut evaluator = Evaluator::default();
        evaluator.evaluate("pot-1", &stats(99.0, 0), t(0));
        evaluator.evaluate("pot-1", &stats(99.0, 0), t(60));
        assert_eq!(evaluator.evaluate("pot-1", &stats(78.0, 61), t(61)), Classification::Safe);
    }

    #[test]
    fn test_never_reported_device() {
        let mut evaluator = Evaluator::default();
        let class = evaluator.evaluate("ghost", &WindowStats::empty(), t(1000));
        assert_eq!(class, Classification::Safe);
        assert_eq!(evaluator.classification("ghost"), None);
    }

    #[test]
    fn test_remove() {
        let mut evaluator = Evaluator::default();
        run(&mut evaluator, &[120.0]);
        assert!(evaluator.remove("pot-1"));
        assert_eq!(evaluator.classification("pot-1"), None);
    }

    fn any_state() -> impl Strategy<Value = f64> {
        // Temperature that drives a fresh device into each of the states
        prop_oneof![Just(20.0), Just(90.0), Just(110.0)]
    }

    proptest! {
        #[test]
        fn prop_critical_holds_above_release(oscillation in prop::collection::vec(95.0f64..100.0, 1..40)) {
            let mut evaluator = Evaluator::default();
            evaluator.evaluate("pot-1", &stats(101.0, 0), t(0));

            for (i, temp) in oscillation.into_iter().enumerate() {
                let at = i as i64 + 1;
                let class = evaluator.evaluate("pot-1", &stats(temp, at), t(at));
                prop_assert_eq!(class, Classification::Critical);
            }
        }

        #[test]
        fn prop_reevaluation_is_a_fixpoint(start in any_state(), temp in -50.0f64..1000.0) {
            let mut evaluator = Evaluator::default();
            evaluator.evaluate("pot-1", &stats(start, 0), t(0));

            let sample = stats(temp, 1);
            let first = evaluator.evaluate("pot-1", &sample, t(1));
            let second = evaluator.evaluate("pot-1", &sample, t(1));
            prop_assert_eq!(first, second);
        }
    }
}
