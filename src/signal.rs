//! Signal-strength classification and the low-signal alerting rule.

use serde::Serialize;

use crate::config::SignalThresholds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SignalQuality {
    Excellent,
    Good,
    Weak,
    NoSignal,
}

impl SignalQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalQuality::Excellent => "Excellent",
            SignalQuality::Good => "Good",
            SignalQuality::Weak => "Weak",
            SignalQuality::NoSignal => "NoSignal",
        }
    }
}

pub struct SignalClassifier {
    thresholds: SignalThresholds,
}

impl SignalClassifier {
    pub fn new(thresholds: SignalThresholds) -> Self {
        Self { thresholds }
    }

    /// Band boundaries are inclusive lower bounds, checked strongest first.
    pub fn classify(&self, dbm: f64) -> SignalQuality {
        let t = &self.thresholds;
        if dbm >= t.excellent_dbm {
            SignalQuality::Excellent
        } else if dbm >= t.good_dbm {
            SignalQuality::Good
        } else if dbm >= t.weak_dbm {
            SignalQuality::Weak
        } else {
            SignalQuality::NoSignal
        }
    }

    /// Alerting rule, stricter than and independent of the quality bands:
    /// low when dBm is at or below the cutoff OR the coarse level is at or
    /// below its cutoff. A missing value is not-low for that criterion.
    pub fn is_low_signal(&self, dbm: Option<f64>, level: Option<i16>) -> bool {
        let dbm_low = dbm.map_or(false, |v| v <= self.thresholds.low_dbm);
        let level_low = level.map_or(false, |v| v <= self.thresholds.low_level);
        dbm_low || level_low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> SignalClassifier {
        SignalClassifier::new(SignalThresholds::default())
    }

    #[test]
    fn classify_bands() {
        let c = classifier();
        assert_eq!(c.classify(-65.0), SignalQuality::Excellent);
        assert_eq!(c.classify(-80.0), SignalQuality::Good);
        assert_eq!(c.classify(-95.0), SignalQuality::Weak);
        assert_eq!(c.classify(-120.0), SignalQuality::NoSignal);
    }

    #[test]
    fn classify_boundaries_inclusive() {
        let c = classifier();
        assert_eq!(c.classify(-70.0), SignalQuality::Excellent);
        assert_eq!(c.classify(-71.0), SignalQuality::Good);
        assert_eq!(c.classify(-85.0), SignalQuality::Good);
        assert_eq!(c.classify(-100.0), SignalQuality::Weak);
        assert_eq!(c.classify(-100.5), SignalQuality::NoSignal);
    }

    #[test]
    fn low_signal_dbm_cutoff() {
        let c = classifier();
        assert!(c.is_low_signal(Some(-100.0), None));
        assert!(!c.is_low_signal(Some(-99.0), None));
    }

    #[test]
    fn low_signal_level_cutoff() {
        let c = classifier();
        assert!(c.is_low_signal(None, Some(1)));
        assert!(c.is_low_signal(Some(-50.0), Some(0)));
        assert!(!c.is_low_signal(None, Some(2)));
    }

    #[test]
    fn low_signal_absent_inputs() {
        assert!(!classifier().is_low_signal(None, None));
    }
}
