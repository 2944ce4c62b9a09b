//! Failed-login detection: per-source counting, daily trend, severity bands.

pub mod bruteforce;
pub mod engine;
pub mod trend;

use serde::{Deserialize, Serialize};

/// Severity bands for a daily failed-attempt count, ordered LOW < MEDIUM < HIGH.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
        }
    }
}

/// Band boundaries. A count equal to a boundary falls in the band below it:
/// `low_max` itself is still LOW, `med_max` itself is still MEDIUM.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SeverityThresholds {
    pub low_max: u64,
    pub med_max: u64,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            low_max: 5,
            med_max: 20,
        }
    }
}

/// Classify a daily failed-attempt count against the configured bands.
/// Total over any count, including values that should never occur.
pub fn classify(count: u64, thresholds: &SeverityThresholds) -> Severity {
    if count > thresholds.med_max {
        Severity::High
    } else if count > thresholds.low_max {
        Severity::Medium
    } else {
        Severity::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_boundaries() {
        let t = SeverityThresholds::default();
        assert_eq!(classify(0, &t), Severity::Low);
        assert_eq!(classify(5, &t), Severity::Low);
        assert_eq!(classify(6, &t), Severity::Medium);
        assert_eq!(classify(20, &t), Severity::Medium);
        assert_eq!(classify(21, &t), Severity::High);
    }

    #[test]
    fn test_classify_custom_thresholds() {
        let t = SeverityThresholds {
            low_max: 0,
            med_max: 1,
        };
        assert_eq!(classify(0, &t), Severity::Low);
        assert_eq!(classify(1, &t), Severity::Medium);
        assert_eq!(classify(2, &t), Severity::High);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
    }

    #[test]
    fn test_severity_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&Severity::Medium).unwrap(),
            "\"MEDIUM\""
        );
    }
}
