//! Wall-time accounting across a benchmark run.
//!
//! One entry per benchmarked estimator, split into (hour, min, sec)
//! components with fractional seconds, plus a trailing `total` row when
//! persisted. The fractional seconds keep the per-estimator entries
//! summing to the total exactly.

use std::path::Path;
use std::time::Duration;

use crate::error::Result;

/// Elapsed wall time of one estimator's run.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeReportEntry {
    /// Estimator name, or `"total"` for the trailing row.
    pub label: String,
    /// Whole hours.
    pub hour: u64,
    /// Whole minutes.
    pub min: u64,
    /// Remaining seconds, fractional.
    pub sec: f64,
}

impl TimeReportEntry {
    /// Splits elapsed seconds into (hour, min, sec) components.
    #[must_use]
    pub fn from_elapsed(label: impl Into<String>, elapsed_secs: f64) -> Self {
        let hour = (elapsed_secs / 3600.0).floor();
        let rem = elapsed_secs - hour * 3600.0;
        let min = (rem / 60.0).floor();
        let sec = rem - min * 60.0;
        Self {
            label: label.into(),
            hour: hour as u64,
            min: min as u64,
            sec,
        }
    }

    /// The entry's elapsed time, reassembled into seconds.
    #[must_use]
    pub fn elapsed_seconds(&self) -> f64 {
        self.hour as f64 * 3600.0 + self.min as f64 * 60.0 + self.sec
    }
}

/// Accumulates per-estimator elapsed times.
#[derive(Debug, Clone, Default)]
pub struct TimeReport {
    entries: Vec<TimeReportEntry>,
}

impl TimeReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one estimator's elapsed wall time.
    pub fn record(&mut self, label: impl Into<String>, elapsed: Duration) {
        self.entries
            .push(TimeReportEntry::from_elapsed(label, elapsed.as_secs_f64()));
    }

    /// The recorded entries, without the total row.
    #[must_use]
    pub fn entries(&self) -> &[TimeReportEntry] {
        &self.entries
    }

    /// Sum of all recorded elapsed times in seconds.
    #[must_use]
    pub fn total_seconds(&self) -> f64 {
        self.entries.iter().map(TimeReportEntry::elapsed_seconds).sum()
    }

    /// Writes the report to `path` as CSV with a trailing `total` row.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O or CSV failure.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["algo", "hour", "min", "sec"])?;

        let total = TimeReportEntry::from_elapsed("total", self.total_seconds());
        for entry in self.entries.iter().chain(std::iter::once(&total)) {
            writer.write_record([
                entry.label.clone(),
                entry.hour.to_string(),
                entry.min.to_string(),
                entry.sec.to_string(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_split() {
        let entry = TimeReportEntry::from_elapsed("ridge", 3725.5);
        assert_eq!(entry.hour, 1);
        assert_eq!(entry.min, 2);
        assert!((entry.sec - 5.5).abs() < 1e-9);
    }

    #[test]
    fn test_elapsed_round_trip() {
        for secs in [0.25, 59.9, 60.0, 3599.99, 7323.125] {
            let entry = TimeReportEntry::from_elapsed("x", secs);
            assert!(
                (entry.elapsed_seconds() - secs).abs() < 1e-9,
                "round trip failed for {secs}"
            );
        }
    }

    #[test]
    fn test_total_equals_sum_of_entries() {
        let mut report = TimeReport::new();
        report.record("a", Duration::from_secs_f64(1.5));
        report.record("b", Duration::from_secs_f64(2.25));
        report.record("c", Duration::from_secs_f64(0.75));

        let sum: f64 = report
            .entries()
            .iter()
            .map(TimeReportEntry::elapsed_seconds)
            .sum();
        assert!((report.total_seconds() - sum).abs() < 1e-9);
        assert!((report.total_seconds() - 4.5).abs() < 1e-9);
    }

    #[test]
    fn test_csv_has_trailing_total_row() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("time_report.csv");

        let mut report = TimeReport::new();
        report.record("ridge", Duration::from_secs_f64(2.0));
        report.record("lasso", Duration::from_secs_f64(3.0));
        report.write_csv(&path).expect("write");

        let contents = std::fs::read_to_string(&path).expect("read");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], "algo,hour,min,sec");
        assert_eq!(lines.len(), 4);
        assert!(lines[3].starts_with("total,"));
        assert!(lines[3].ends_with("5"));
    }
}
