use crate::error::CliError;
use engine_processing::{
    stats::{BonusSnapshot, QualificationSnapshot, ResultsSnapshot},
    store::RecordStore,
};
use engine_runtime::summary::BatchSummary;
use serde::Serialize;

/// What `validate` reports about the loaded results.
#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub records: usize,
    pub filtered: usize,
    pub errors: Vec<String>,
    pub results: ResultsSnapshot,
    pub bonus: BonusSnapshot,
    pub qualification: QualificationSnapshot,
}

impl ValidationReport {
    pub fn from_store(store: &RecordStore) -> Self {
        let stats = store.stats();
        ValidationReport {
            records: store.len(),
            filtered: store.filtered().len(),
            errors: store.errors().to_vec(),
            results: stats.results(),
            bonus: stats.bonus(),
            qualification: stats.qualification(),
        }
    }
}

pub async fn write_report(report: &ValidationReport, path: String) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(report)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

pub fn print_report(report: &ValidationReport) {
    println!("{} records loaded, {} filtered", report.records, report.filtered);
    println!("{}", report.results);
    println!("{}", report.bonus);
    println!("qualifications: {}", report.qualification.count);
    if report.errors.is_empty() {
        println!("No validation errors");
    } else {
        println!("{} validation error(s):", report.errors.len());
        for err in &report.errors {
            println!("  {err}");
        }
    }
}

/// Prints every summary and returns the number of failed records.
pub fn print_summaries(summaries: &[BatchSummary]) -> usize {
    for summary in summaries {
        print!("{summary}");
    }
    summaries.iter().map(|s| s.failed).sum()
}

/// Prints a single-call reply. `None` is the dry-run case.
pub fn print_reply(reply: Option<serde_json::Value>) -> Result<(), CliError> {
    match reply {
        Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        None => println!("Dry run: nothing was sent"),
    }
    Ok(())
}
