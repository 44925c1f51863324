//! Per-step statistics over a set of timing records

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Write;

use crate::record::{Status, TimingRecord};

/// Aggregated timings for one step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepStats {
    pub step: String,
    pub count: u64,
    pub failures: u64,
    pub total_seconds: f64,
    pub mean_seconds: f64,
    pub min_seconds: f64,
    pub max_seconds: f64,
    pub median_seconds: f64,
    pub p95_seconds: f64,
}

/// Statistics for every step, sorted by total time (descending)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub steps: Vec<StepStats>,
    pub total_records: u64,
    pub total_failures: u64,
    pub total_seconds: f64,
}

impl Summary {
    pub fn from_records(records: &[TimingRecord]) -> Self {
        let mut durations: HashMap<&str, Vec<f64>> = HashMap::new();
        let mut failures: HashMap<&str, u64> = HashMap::new();

        for rec in records {
            durations
                .entry(rec.step.as_str())
                .or_default()
                .push(rec.duration_seconds);
            if rec.status == Status::Failure {
                *failures.entry(rec.step.as_str()).or_default() += 1;
            }
        }

        let mut steps: Vec<StepStats> = durations
            .into_iter()
            .map(|(step, mut values)| {
                values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                let count = values.len() as u64;
                let total: f64 = values.iter().sum();
                StepStats {
                    step: step.to_string(),
                    count,
                    failures: failures.get(step).copied().unwrap_or(0),
                    total_seconds: total,
                    mean_seconds: total / count as f64,
                    min_seconds: values[0],
                    max_seconds: values[values.len() - 1],
                    median_seconds: percentile(&values, 50.0),
                    p95_seconds: percentile(&values, 95.0),
                }
            })
            .collect();

        steps.sort_by(|a, b| {
            b.total_seconds
                .partial_cmp(&a.total_seconds)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.step.cmp(&b.step))
        });

        Summary {
            total_records: steps.iter().map(|s| s.count).sum(),
            total_failures: steps.iter().map(|s| s.failures).sum(),
            total_seconds: steps.iter().map(|s| s.total_seconds).sum(),
            steps,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, step: &str) -> Option<&StepStats> {
        self.steps.iter().find(|s| s.step == step)
    }

    /// Human-readable table
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        if self.is_empty() {
            out.push_str("No timing records.\n");
            return out;
        }

        let rule = "------ ----------- ----------- ----------- --------- --------- ----------------";
        let _ = writeln!(out, "% time     seconds   mean secs    max secs     calls  failures step");
        let _ = writeln!(out, "{}", rule);
        for stats in &self.steps {
            let share = if self.total_seconds > 0.0 {
                stats.total_seconds / self.total_seconds * 100.0
            } else {
                0.0
            };
            let _ = writeln!(
                out,
                "{:6.2} {:>11.6} {:>11.6} {:>11.6} {:>9} {:>9} {}",
                share,
                stats.total_seconds,
                stats.mean_seconds,
                stats.max_seconds,
                stats.count,
                blank_if_zero(stats.failures),
                stats.step
            );
        }
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(
            out,
            "100.00 {:>11.6} {:>11} {:>11} {:>9} {:>9} total",
            self.total_seconds,
            "",
            "",
            self.total_records,
            blank_if_zero(self.total_failures)
        );
        out
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn blank_if_zero(n: u64) -> String {
    if n > 0 {
        n.to_string()
    } else {
        String::new()
    }
}

/// Linear-interpolated percentile of sorted data
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }

    let index = (pct / 100.0) * (sorted.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;

    if lower == upper {
        sorted[lower]
    } else {
        let weight = index - lower as f64;
        sorted[lower] * (1.0 - weight) + sorted[upper] * weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Extra;

    fn rec(step: &str, secs: f64, status: Status) -> TimingRecord {
        TimingRecord {
            id: format!("{}-{}", step, secs),
            timestamp_utc: "2025-01-01T00:00:00Z".to_string(),
            user: "u".to_string(),
            run_id: None,
            module: "m".to_string(),
            function: step.to_string(),
            step: step.to_string(),
            start_iso: "2025-01-01T00:00:00.000000Z".to_string(),
            end_iso: "2025-01-01T00:00:00.000000Z".to_string(),
            duration_seconds: secs,
            status,
            notes: String::new(),
            extra: Extra::new(),
        }
    }

    #[test]
    fn test_empty_summary() {
        let summary = Summary::from_records(&[]);
        assert!(summary.is_empty());
        assert_eq!(summary.render_text(), "No timing records.\n");
    }

    #[test]
    fn test_aggregates_per_step() {
        let records = vec![
            rec("copy", 1.0, Status::Success),
            rec("copy", 3.0, Status::Failure),
            rec("zip", 0.5, Status::Success),
        ];
        let summary = Summary::from_records(&records);

        let copy = summary.get("copy").unwrap();
        assert_eq!(copy.count, 2);
        assert_eq!(copy.failures, 1);
        assert_eq!(copy.total_seconds, 4.0);
        assert_eq!(copy.mean_seconds, 2.0);
        assert_eq!(copy.min_seconds, 1.0);
        assert_eq!(copy.max_seconds, 3.0);
        assert_eq!(copy.median_seconds, 2.0);

        assert_eq!(summary.total_records, 3);
        assert_eq!(summary.total_failures, 1);
        assert_eq!(summary.steps[0].step, "copy");
        assert_eq!(summary.steps[1].step, "zip");
    }

    #[test]
    fn test_render_text_lists_steps() {
        let summary = Summary::from_records(&[rec("probe", 0.25, Status::Success)]);
        let text = summary.render_text();
        assert!(text.contains("probe"));
        assert!(text.contains("total"));
        assert!(text.contains("0.250000"));
    }

    #[test]
    fn test_percentile_interpolates() {
        assert_eq!(percentile(&[1.0, 2.0, 3.0, 4.0], 50.0), 2.5);
        assert_eq!(percentile(&[7.0], 95.0), 7.0);
        assert_eq!(percentile(&[], 50.0), 0.0);
    }

    #[test]
    fn test_json_contains_steps() {
        let summary = Summary::from_records(&[rec("probe", 0.1, Status::Success)]);
        let json = summary.to_json().unwrap();
        assert!(json.contains("\"step\": \"probe\""));
    }
}
