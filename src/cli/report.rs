//! Test-outcome accumulation and summary rendering.

use std::collections::BTreeSet;
use std::fmt::Write as _;

/// One test case's verdict, as produced by suite evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestOutcome {
    pub name: String,
    /// Endpoint the case was recorded against; may be empty.
    pub endpoint: String,
    pub passed: bool,
}

/// Aggregated metrics over a sequence of outcomes.
///
/// Created empty, fed once per outcome through [`TestSummary::record`], then
/// rendered and discarded.
#[derive(Debug, Default)]
pub struct TestSummary {
    total: usize,
    passed: usize,
    failed: usize,
    endpoints: BTreeSet<String>,
}

impl TestSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one outcome into the summary. Empty endpoints are not tracked;
    /// repeated endpoints count once.
    pub fn record(&mut self, outcome: &TestOutcome) {
        self.total += 1;
        if outcome.passed {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        if !outcome.endpoint.is_empty() {
            self.endpoints.insert(outcome.endpoint.clone());
        }
    }

    /// Percentage of passed tests, 0 when nothing ran.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.passed as f64 / self.total as f64 * 100.0
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn passed(&self) -> usize {
        self.passed
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn unique_endpoints(&self) -> usize {
        self.endpoints.len()
    }
}

const RULE: &str = "===================================";

/// Render the per-outcome lines and the summary block for a finished run.
///
/// Pure function of the outcome sequence: the same input renders to
/// byte-identical output.
pub fn render_report(outcomes: &[TestOutcome]) -> String {
    let mut summary = TestSummary::new();
    let mut out = String::new();
    for outcome in outcomes {
        summary.record(outcome);
        let status = if outcome.passed { "PASSED" } else { "FAILED" };
        let _ = writeln!(
            out,
            "Test: {:<25} | Endpoint: {:<20} | Status: {}",
            outcome.name, outcome.endpoint, status
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "        TEST EXECUTION SUMMARY");
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "Total Tests Executed : {}", summary.total());
    let _ = writeln!(out, "Passed Tests         : {}", summary.passed());
    let _ = writeln!(out, "Failed Tests         : {}", summary.failed());
    let _ = writeln!(out, "Success Rate         : {:.2}%", summary.success_rate());
    let _ = writeln!(out, "Unique Endpoints     : {}", summary.unique_endpoints());
    let _ = writeln!(out, "{RULE}");
    out
}
