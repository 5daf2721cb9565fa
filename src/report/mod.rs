//! Pass/fail bookkeeping for one verification run.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use uuid::Uuid;

/// Outcome of a single executed step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StepStatus {
    Passed,
    Failed { error: String },
}

/// Record of one executed step. Created once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    pub name: String,
    pub status: StepStatus,
    /// Truncated response preview, final URL, or artifact path.
    pub observed: Option<String>,
    pub duration_ms: u64,
}

impl StepResult {
    pub fn passed(&self) -> bool {
        matches!(self.status, StepStatus::Passed)
    }
}

/// Terminal verdict of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Verdict {
    AllPassed,
    SomeFailed,
}

/// Ordered step results plus derived totals for one run.
///
/// Owned exclusively by the orchestrator that fills it; discarded when the
/// run ends. `aborted` carries the reason when the run stopped before
/// completing its plan (foundational failure, exhausted credentials, or a
/// broken UI dependency chain).
#[derive(Debug)]
pub struct RunReport {
    pub run_id: String,
    pub label: String,
    pub results: Vec<StepResult>,
    pub aborted: Option<String>,
    started_at: Instant,
}

impl RunReport {
    pub fn new(label: &str) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            label: label.to_string(),
            results: Vec::new(),
            aborted: None,
            started_at: Instant::now(),
        }
    }

    pub fn record(&mut self, result: StepResult) {
        self.results.push(result);
    }

    pub fn abort(&mut self, reason: impl Into<String>) {
        self.aborted = Some(reason.into());
    }

    pub fn run_count(&self) -> u32 {
        self.results.len() as u32
    }

    pub fn passed_count(&self) -> u32 {
        self.results.iter().filter(|r| r.passed()).count() as u32
    }

    pub fn failed_count(&self) -> u32 {
        self.run_count() - self.passed_count()
    }

    /// Percentage of recorded steps that passed. An empty run reports
    /// 100.0, but an aborted run never yields `AllPassed`.
    pub fn success_rate(&self) -> f64 {
        if self.results.is_empty() {
            return 100.0;
        }
        f64::from(self.passed_count()) / f64::from(self.run_count()) * 100.0
    }

    pub fn verdict(&self) -> Verdict {
        if self.aborted.is_none() && self.passed_count() == self.run_count() {
            Verdict::AllPassed
        } else {
            Verdict::SomeFailed
        }
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            run_id: self.run_id.clone(),
            label: self.label.clone(),
            steps: self.results.clone(),
            run: self.run_count(),
            passed: self.passed_count(),
            failed: self.failed_count(),
            success_rate: self.success_rate(),
            verdict: self.verdict(),
            aborted: self.aborted.clone(),
            total_duration_ms: self.started_at.elapsed().as_millis() as u64,
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Final console block: counts and success percentage.
    pub fn print_summary(&self) {
        println!("\n{} {} run finished", "■".blue().bold(), self.label);
        println!("  Steps run: {}", self.run_count());
        println!("  Passed: {}", self.passed_count().to_string().green());
        let failed = self.failed_count();
        if failed > 0 {
            println!("  Failed: {}", failed.to_string().red());
        } else {
            println!("  Failed: {}", failed);
        }
        println!("  Success rate: {:.1}%", self.success_rate());
        if let Some(ref reason) = self.aborted {
            println!("  Aborted: {}", reason.red());
        }
        match self.verdict() {
            Verdict::AllPassed => println!("  {} All steps passed", "🎉".green()),
            Verdict::SomeFailed => println!("  {} Some steps failed", "⚠️".yellow()),
        }
    }

    /// Write the machine-readable report next to the other artifacts.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.summary())?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        println!(
            "{} JSON report saved to: {}",
            "📄".blue(),
            path.display().to_string().cyan()
        );
        Ok(())
    }
}

/// Serializable totals written as the JSON report artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub run_id: String,
    pub label: String,
    pub steps: Vec<StepResult>,
    pub run: u32,
    pub passed: u32,
    pub failed: u32,
    pub success_rate: f64,
    pub verdict: Verdict,
    pub aborted: Option<String>,
    pub total_duration_ms: u64,
    pub generated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passed(name: &str) -> StepResult {
        StepResult {
            name: name.to_string(),
            status: StepStatus::Passed,
            observed: None,
            duration_ms: 1,
        }
    }

    fn failed(name: &str) -> StepResult {
        StepResult {
            name: name.to_string(),
            status: StepStatus::Failed {
                error: "boom".to_string(),
            },
            observed: None,
            duration_ms: 1,
        }
    }

    #[test]
    fn passed_never_exceeds_run() {
        let mut report = RunReport::new("api");
        report.record(passed("a"));
        report.record(failed("b"));
        report.record(passed("c"));
        assert!(report.passed_count() <= report.run_count());
        assert_eq!(report.run_count(), 3);
        assert_eq!(report.passed_count(), 2);
        assert_eq!(report.failed_count(), 1);
    }

    #[test]
    fn verdict_requires_every_step_passed() {
        let mut report = RunReport::new("api");
        report.record(passed("a"));
        assert_eq!(report.verdict(), Verdict::AllPassed);
        report.record(failed("b"));
        assert_eq!(report.verdict(), Verdict::SomeFailed);
    }

    #[test]
    fn abort_forces_failed_verdict_even_if_all_recorded_steps_passed() {
        let mut report = RunReport::new("api");
        report.record(passed("health"));
        report.record(passed("database"));
        report.abort("no candidate credentials authenticated");
        assert_eq!(report.passed_count(), report.run_count());
        assert_eq!(report.verdict(), Verdict::SomeFailed);
    }

    #[test]
    fn success_rate_of_empty_run_is_hundred() {
        let report = RunReport::new("ui");
        assert_eq!(report.success_rate(), 100.0);
    }

    #[test]
    fn success_rate_is_passed_over_run() {
        let mut report = RunReport::new("api");
        report.record(passed("a"));
        report.record(passed("b"));
        report.record(failed("c"));
        report.record(failed("d"));
        assert!((report.success_rate() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn summary_serializes_step_details() {
        let mut report = RunReport::new("api");
        report.record(failed("health"));
        let json = serde_json::to_string(&report.summary()).unwrap();
        assert!(json.contains("\"someFailed\""));
        assert!(json.contains("\"health\""));
        assert!(json.contains("\"boom\""));
    }
}
