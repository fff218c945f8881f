//! End-of-run counters.

use serde::{Deserialize, Serialize};

/// What happened during one harvest run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestReport {
    pub terms: usize,
    pub dispatched: usize,
    pub responses_parsed: usize,
    pub summary_lines: usize,
    pub transport_failures: usize,
    pub service_errors: usize,
    pub parse_failures: usize,
    pub feature_errors: usize,
    pub write_failures: usize,
    /// Times the output store refused the schema.
    pub declare_failures: usize,
    pub summary_failures: usize,
    pub records_written: usize,
    /// Output columns, once a schema has been derived.
    pub schema: Option<Vec<String>>,
    pub elapsed_ms: u64,
}

impl HarvestReport {
    /// Units of work that were logged and skipped.
    pub fn skipped(&self) -> usize {
        self.transport_failures
            + self.service_errors
            + self.parse_failures
            + self.feature_errors
            + self.write_failures
    }
}

impl std::fmt::Display for HarvestReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "  Terms:              {}", self.terms)?;
        writeln!(f, "  Requests:           {}", self.dispatched)?;
        writeln!(f, "  Responses parsed:   {}", self.responses_parsed)?;
        writeln!(f, "  Summary lines:      {}", self.summary_lines)?;
        writeln!(f, "  Records written:    {}", self.records_written)?;
        writeln!(f, "  Transport failures: {}", self.transport_failures)?;
        writeln!(f, "  Service errors:     {}", self.service_errors)?;
        writeln!(f, "  Parse failures:     {}", self.parse_failures)?;
        writeln!(f, "  Feature errors:     {}", self.feature_errors)?;
        writeln!(f, "  Write failures:     {}", self.write_failures)?;
        if self.declare_failures > 0 {
            writeln!(f, "  Schema refused:     {}", self.declare_failures)?;
        }
        if self.summary_failures > 0 {
            writeln!(f, "  Summary failures:   {}", self.summary_failures)?;
        }
        write!(
            f,
            "  Elapsed time:       {:.1}s",
            self.elapsed_ms as f64 / 1000.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skipped_total_and_display() {
        let report = HarvestReport {
            terms: 3,
            dispatched: 3,
            transport_failures: 1,
            service_errors: 1,
            feature_errors: 2,
            elapsed_ms: 1500,
            ..HarvestReport::default()
        };
        assert_eq!(report.skipped(), 4);
        let text = report.to_string();
        assert!(text.contains("Service errors:     1"));
        assert!(text.contains("1.5s"));
        assert!(!text.contains("Summary failures"));
        assert!(!text.contains("Schema refused"));
    }
}
