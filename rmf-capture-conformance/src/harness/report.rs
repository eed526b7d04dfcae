//! Run summary: per-test outcomes, per-suite totals, table and JSON export.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::context::Failure;
use super::suite::Level;
use crate::error::Result;

#[derive(Debug, Clone, Serialize)]
pub struct TestOutcome {
    pub suite: String,
    pub level: Level,
    pub tag: String,
    pub name: String,
    pub passed: bool,
    /// A `require_*` assertion (or a panic) cut the test short.
    pub fatal: bool,
    pub failures: Vec<String>,
    pub duration_ms: u64,
}

impl TestOutcome {
    pub fn new(suite: &str, level: Level, tag: String, name: &str, failures: Vec<Failure>, duration: Duration) -> Self {
        Self {
            suite: suite.to_string(),
            level,
            tag,
            name: name.to_string(),
            passed: failures.is_empty(),
            fatal: failures.iter().any(|f| f.fatal),
            failures: failures.iter().map(|f| f.to_string()).collect(),
            duration_ms: duration.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SuiteTotals {
    pub name: String,
    pub run: usize,
    pub passed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// RFC 3339.
    pub started_at: String,
    pub duration_ms: u64,
    pub outcomes: Vec<TestOutcome>,
    pub suites: Vec<SuiteTotals>,
}

impl RunReport {
    pub fn new(outcomes: Vec<TestOutcome>, started_at: DateTime<Utc>, duration: Duration) -> Self {
        let mut suites: Vec<SuiteTotals> = Vec::new();
        for outcome in &outcomes {
            let idx = match suites.iter().position(|s| s.name == outcome.suite) {
                Some(idx) => idx,
                None => {
                    suites.push(SuiteTotals {
                        name: outcome.suite.clone(),
                        run: 0,
                        passed: 0,
                        failed: 0,
                    });
                    suites.len() - 1
                }
            };
            let totals = &mut suites[idx];
            totals.run += 1;
            if outcome.passed {
                totals.passed += 1;
            } else {
                totals.failed += 1;
            }
        }

        Self {
            started_at: started_at.to_rfc3339(),
            duration_ms: duration.as_millis() as u64,
            outcomes,
            suites,
        }
    }

    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    pub fn failed_outcomes(&self) -> impl Iterator<Item = &TestOutcome> {
        self.outcomes.iter().filter(|o| !o.passed)
    }

    pub fn export_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Human-readable summary, one row per suite, then every failure.
    pub fn summary_table(&self) -> String {
        let width = self
            .suites
            .iter()
            .map(|s| s.name.len())
            .max()
            .unwrap_or(0)
            .max("Suite".len());

        let mut out = String::new();
        out.push_str(&format!("\n{:<width$}  {:>5}  {:>6}  {:>6}\n", "Suite", "Run", "Passed", "Failed"));
        out.push_str(&format!("{}\n", "-".repeat(width + 23)));
        for suite in &self.suites {
            out.push_str(&format!(
                "{:<width$}  {:>5}  {:>6}  {:>6}\n",
                suite.name, suite.run, suite.passed, suite.failed
            ));
        }
        out.push_str(&format!("{}\n", "-".repeat(width + 23)));
        out.push_str(&format!(
            "{:<width$}  {:>5}  {:>6}  {:>6}\n",
            "Total",
            self.outcomes.len(),
            self.passed(),
            self.failed()
        ));

        for outcome in self.failed_outcomes() {
            out.push_str(&format!("\nFAILED {} {} ({})\n", outcome.tag, outcome.name, outcome.suite));
            for failure in &outcome.failures {
                out.push_str(&format!("    {}\n", failure));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(fatal: bool) -> Failure {
        Failure {
            location: "l1.rs:10".into(),
            message: "expected SUCCESS, got INVALID_STATE".into(),
            last_call: Some("Close(primary#1) -> INVALID_STATE".into()),
            fatal,
        }
    }

    fn sample() -> RunReport {
        let ms = Duration::from_millis(5);
        RunReport::new(
            vec![
                TestOutcome::new("[L1 a]", Level::L1, "[01001]".into(), "one", vec![], ms),
                TestOutcome::new("[L1 a]", Level::L1, "[01002]".into(), "two", vec![failure(true)], ms),
                TestOutcome::new("[L2 b]", Level::L2, "[02001]".into(), "three", vec![], ms),
            ],
            Utc::now(),
            Duration::from_millis(15),
        )
    }

    #[test]
    fn totals_per_suite() {
        let report = sample();
        assert_eq!(report.passed(), 2);
        assert_eq!(report.failed(), 1);
        assert!(!report.all_passed());
        assert_eq!(
            report.suites[0],
            SuiteTotals {
                name: "[L1 a]".into(),
                run: 2,
                passed: 1,
                failed: 1
            }
        );
        assert_eq!(report.suites[1].run, 1);
        assert!(report.outcomes[1].fatal);
    }

    #[test]
    fn table_lists_failures() {
        let table = sample().summary_table();
        assert!(table.contains("Total"));
        assert!(table.contains("FAILED [01002] two ([L1 a])"));
        assert!(table.contains("[after Close(primary#1) -> INVALID_STATE]"));
    }

    #[test]
    fn json_export() {
        let path = std::env::temp_dir().join(format!("rmf_capture_report_{}.json", std::process::id()));
        sample().export_json(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["outcomes"].as_array().unwrap().len(), 3);
        assert_eq!(value["outcomes"][0]["level"], "l1");
        assert_eq!(value["suites"][0]["failed"], 1);
        let _ = std::fs::remove_file(&path);
    }
}
