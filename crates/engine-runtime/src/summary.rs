use engine_processing::stats::BonusSnapshot;
use serde::Serialize;
use std::fmt;

/// Terminal outcome of one record in a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Succeeded,
    Failed(String),
    DrySkipped,
    Skipped,
}

/// Counts and failures of one batch operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub operation: String,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub dry_skipped: usize,
    /// `(subject, message)` per failed record, in record order.
    pub failures: Vec<(String, String)>,
    /// Totals of the bonuses granted, for bonus batches.
    pub bonus: Option<BonusSnapshot>,
}

impl BatchSummary {
    pub fn new(operation: impl Into<String>) -> Self {
        BatchSummary {
            operation: operation.into(),
            ..Default::default()
        }
    }

    pub fn record(&mut self, subject: &str, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Succeeded => self.succeeded += 1,
            ItemOutcome::DrySkipped => self.dry_skipped += 1,
            ItemOutcome::Skipped => self.skipped += 1,
            ItemOutcome::Failed(message) => {
                self.failed += 1;
                self.failures.push((subject.to_string(), message));
            }
        }
    }

    pub fn skip(&mut self) {
        self.skipped += 1;
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.skipped + self.dry_skipped
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {} succeeded, {} failed, {} skipped, {} dry-run",
            self.operation, self.succeeded, self.failed, self.skipped, self.dry_skipped
        )?;
        for (subject, message) in &self.failures {
            writeln!(f, "  failed {subject}: {message}")?;
        }
        if let Some(bonus) = &self.bonus {
            writeln!(f, "  {bonus}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_lists_failures() {
        let mut summary = BatchSummary::new("approve/reject");
        summary.record("A1", ItemOutcome::Succeeded);
        summary.record("A2", ItemOutcome::Failed("Service error (400): nope".into()));
        summary.skip();

        assert_eq!(summary.total(), 3);
        assert_eq!(
            summary.to_string(),
            "approve/reject: 1 succeeded, 1 failed, 1 skipped, 0 dry-run\n  failed A2: Service error (400): nope\n"
        );
    }
}
