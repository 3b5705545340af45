//! Per-sensor diagnosis outcomes.

use crate::SensorVariant;

/// Classification of one sensor for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Verdict {
    /// Downstream data is younger than the threshold.
    Healthy,
    /// The upstream source itself has nothing recent.
    UpstreamOutage,
    /// Upstream has fresh data that never reached downstream processing.
    ProcessingStall,
    /// The upstream listing could not be retrieved.
    TransportError,
}

impl Verdict {
    /// Returns true for every verdict that warrants an alert.
    pub fn is_fault(&self) -> bool {
        !matches!(self, Verdict::Healthy)
    }
}

/// The diagnosis of one enabled sensor.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiagnosisResult {
    pub sensor: SensorVariant,
    pub verdict: Verdict,
    /// Freshest downstream age, `None` when no mirror reported the sensor.
    pub downstream_age_hours: Option<f64>,
    /// Upstream age, present only when escalation computed one.
    pub upstream_age_hours: Option<f64>,
}

impl DiagnosisResult {
    /// A result that stopped at the local check.
    pub fn healthy(sensor: SensorVariant, downstream_age_hours: f64) -> Self {
        Self {
            sensor,
            verdict: Verdict::Healthy,
            downstream_age_hours: Some(downstream_age_hours),
            upstream_age_hours: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_faults() {
        assert!(!Verdict::Healthy.is_fault());
        assert!(Verdict::UpstreamOutage.is_fault());
        assert!(Verdict::ProcessingStall.is_fault());
        assert!(Verdict::TransportError.is_fault());
    }

    #[test]
    fn test_healthy_result_has_no_upstream_age() {
        let result = DiagnosisResult::healthy(SensorVariant::Modis, 3.0);
        assert_eq!(result.verdict, Verdict::Healthy);
        assert_eq!(result.downstream_age_hours, Some(3.0));
        assert_eq!(result.upstream_age_hours, None);
    }
}
