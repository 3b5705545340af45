//! Downstream status as reported by each mirror, and the cross-mirror summary.

use std::collections::BTreeMap;

/// How a single status fetch against one mirror ended.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", content = "detail"))]
pub enum FetchOutcome {
    /// The mirror answered with a success status code.
    Ok(u16),
    /// The mirror answered with a non-success status code.
    HttpError(u16),
    /// No usable answer: connect failure, timeout or an undecodable body.
    TransportError(String),
}

impl FetchOutcome {
    /// Returns true if the fetch produced usable status data.
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Ok(_))
    }

    /// The HTTP status code, if the mirror answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            FetchOutcome::Ok(code) | FetchOutcome::HttpError(code) => Some(*code),
            FetchOutcome::TransportError(_) => None,
        }
    }
}

/// Status of one downstream mirror for one cycle.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MirrorStatus {
    /// Mirror identifier from configuration.
    pub mirror_id: String,
    /// The status URL that was queried.
    #[cfg_attr(feature = "serde", serde(default))]
    pub url: String,
    /// Result of the fetch.
    pub outcome: FetchOutcome,
    /// Freshest age in hours per sensor name. Empty unless the fetch succeeded.
    #[cfg_attr(feature = "serde", serde(default))]
    pub sensor_ages: BTreeMap<String, f64>,
}

impl MirrorStatus {
    /// Create a status with no recorded ages.
    pub fn new(mirror_id: impl Into<String>, outcome: FetchOutcome) -> Self {
        Self {
            mirror_id: mirror_id.into(),
            url: String::new(),
            outcome,
            sensor_ages: BTreeMap::new(),
        }
    }

    /// Set the URL that was queried.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Record an age for a sensor, keeping the minimum seen so far.
    ///
    /// Status services may list several sub-products for one sensor; the
    /// smallest age is the freshest known path.
    pub fn record_age(&mut self, sensor: &str, age_hours: f64) {
        match self.sensor_ages.get_mut(sensor) {
            Some(existing) if age_hours < *existing => *existing = age_hours,
            Some(_) => {}
            None => {
                self.sensor_ages.insert(sensor.to_string(), age_hours);
            }
        }
    }

    /// Returns true if the fetch produced usable status data.
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// Age of the freshest image of any sensor on this mirror.
    pub fn freshest_age(&self) -> Option<f64> {
        self.sensor_ages.values().copied().reduce(f64::min)
    }
}

/// Minimum age per sensor across every mirror whose fetch succeeded.
///
/// One healthy mirror is enough to keep a sensor out of escalation.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorAgeSummary {
    /// Freshest age in hours per sensor name.
    pub ages: BTreeMap<String, f64>,
    /// Number of mirrors that contributed.
    pub successful_mirrors: usize,
}

impl SensorAgeSummary {
    /// Build the summary, ignoring mirrors whose fetch failed.
    pub fn from_statuses(statuses: &[MirrorStatus]) -> Self {
        let mut summary = Self::default();

        for status in statuses.iter().filter(|s| s.is_success()) {
            summary.successful_mirrors += 1;
            for (sensor, &age) in &status.sensor_ages {
                summary
                    .ages
                    .entry(sensor.clone())
                    .and_modify(|existing| *existing = existing.min(age))
                    .or_insert(age);
            }
        }

        summary
    }

    /// Freshest age for a sensor, if any successful mirror reported it.
    pub fn get(&self, sensor: &str) -> Option<f64> {
        self.ages.get(sensor).copied()
    }

    /// Number of sensors with a reported age.
    pub fn len(&self) -> usize {
        self.ages.len()
    }

    /// Check if no sensor ages were reported.
    pub fn is_empty(&self) -> bool {
        self.ages.is_empty()
    }

    /// Iterate over sensor names and ages.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.ages.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_mirror(id: &str, ages: &[(&str, f64)]) -> MirrorStatus {
        let mut status = MirrorStatus::new(id, FetchOutcome::Ok(200));
        for (sensor, age) in ages {
            status.record_age(sensor, *age);
        }
        status
    }

    #[test]
    fn test_record_age_keeps_minimum() {
        let status = ok_mirror("avo1", &[("MODIS", 5.0), ("MODIS", 2.0), ("MODIS", 7.0)]);
        assert_eq!(status.sensor_ages.get("MODIS"), Some(&2.0));
        assert_eq!(status.freshest_age(), Some(2.0));
    }

    #[test]
    fn test_freshest_age_empty() {
        let status = MirrorStatus::new("avo1", FetchOutcome::Ok(200));
        assert_eq!(status.freshest_age(), None);
    }

    #[test]
    fn test_summary_takes_minimum_across_mirrors() {
        let statuses = vec![
            ok_mirror("avo1", &[("MODIS", 9.0), ("VIIRS", 1.0)]),
            ok_mirror("avo2", &[("MODIS", 3.0), ("AVHRR", 4.0)]),
        ];

        let summary = SensorAgeSummary::from_statuses(&statuses);
        assert_eq!(summary.successful_mirrors, 2);
        assert_eq!(summary.get("MODIS"), Some(3.0));
        assert_eq!(summary.get("VIIRS"), Some(1.0));
        assert_eq!(summary.get("AVHRR"), Some(4.0));
        assert_eq!(summary.len(), 3);
    }

    #[test]
    fn test_summary_ignores_failed_mirrors() {
        let mut failed = MirrorStatus::new("avo2", FetchOutcome::HttpError(503));
        // A failed fetch should never carry ages, but make sure they are ignored anyway
        failed.record_age("MODIS", 0.1);
        let dropped = MirrorStatus::new("avo3", FetchOutcome::TransportError("timeout".into()));

        let statuses = vec![ok_mirror("avo1", &[("MODIS", 8.0)]), failed, dropped];
        let summary = SensorAgeSummary::from_statuses(&statuses);

        assert_eq!(summary.successful_mirrors, 1);
        assert_eq!(summary.get("MODIS"), Some(8.0));
    }

    #[test]
    fn test_summary_all_failed() {
        let statuses = vec![MirrorStatus::new("avo1", FetchOutcome::HttpError(500))];
        let summary = SensorAgeSummary::from_statuses(&statuses);
        assert!(summary.is_empty());
        assert_eq!(summary.successful_mirrors, 0);
    }

    #[test]
    fn test_outcome_status_code() {
        assert_eq!(FetchOutcome::Ok(200).status_code(), Some(200));
        assert_eq!(FetchOutcome::HttpError(503).status_code(), Some(503));
        assert_eq!(FetchOutcome::TransportError("refused".into()).status_code(), None);
        assert!(!FetchOutcome::HttpError(503).is_success());
    }
}
