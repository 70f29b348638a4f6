use crate::store::{
    error::StoreError,
    options::StoreOptions,
    record_store::{InsertOutcome, RecordStore},
};
use connectors::file::csv::{adapter::CsvAdapter, settings::CsvSettings};
use engine_config::settings::validated::Settings;
use model::records::{field::StoreKind, record::Record};
use std::fmt;
use tracing::info;

/// How a load treats a store that already holds records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadMode {
    pub append: bool,
    pub replace: bool,
}

impl LoadMode {
    pub fn append() -> Self {
        LoadMode {
            append: true,
            replace: false,
        }
    }

    pub fn replace() -> Self {
        LoadMode {
            append: false,
            replace: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub kind: StoreKind,
    pub inserted: usize,
    pub filtered: usize,
    pub errors: usize,
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} loaded, {} filtered, {} errors",
            self.kind, self.inserted, self.filtered, self.errors
        )
    }
}

/// Owns the results store and the reference code list it is checked against.
#[derive(Debug)]
pub struct StoreRegistry {
    results_options: StoreOptions,
    reference_options: StoreOptions,
    results: Option<RecordStore>,
    reference: Option<RecordStore>,
}

impl StoreRegistry {
    pub fn new(results_options: StoreOptions, reference_options: StoreOptions) -> Self {
        StoreRegistry {
            results_options,
            reference_options,
            results: None,
            reference: None,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            StoreOptions::from_settings(settings, StoreKind::Results),
            StoreOptions::from_settings(settings, StoreKind::Reference),
        )
    }

    /// Inserts `rows` into the store of `kind`. Results are cross-checked
    /// against the reference store when it is loaded.
    pub fn load_rows<I>(
        &mut self,
        kind: StoreKind,
        rows: I,
        mode: LoadMode,
    ) -> Result<LoadReport, StoreError>
    where
        I: IntoIterator<Item = Record>,
    {
        self.check_mode(kind, mode)?;

        let options = match kind {
            StoreKind::Results => self.results_options.clone(),
            StoreKind::Reference => self.reference_options.clone(),
        };
        let (slot, reference) = match kind {
            StoreKind::Results => (&mut self.results, self.reference.as_ref()),
            StoreKind::Reference => (&mut self.reference, None),
        };
        if mode.replace {
            *slot = None;
        }
        let store = slot.get_or_insert_with(|| RecordStore::new(kind, options));

        let errors_before = store.errors().len();
        let mut report = LoadReport {
            kind,
            inserted: 0,
            filtered: 0,
            errors: 0,
        };
        for record in rows {
            match store.insert_with_reference(record, reference) {
                InsertOutcome::Inserted { .. } => report.inserted += 1,
                InsertOutcome::Filtered => report.filtered += 1,
            }
        }
        report.errors = store.errors().len() - errors_before;

        Ok(report)
    }

    /// Reads every row of `path` before touching the store, so a malformed
    /// file leaves the registry unchanged.
    pub fn load_file(
        &mut self,
        kind: StoreKind,
        path: &str,
        csv: &CsvSettings,
        mode: LoadMode,
    ) -> Result<LoadReport, StoreError> {
        self.check_mode(kind, mode)?;

        let mut adapter = CsvAdapter::new(path, csv.clone())?;
        let rows = adapter.records().collect::<Result<Vec<_>, _>>()?;
        let report = self.load_rows(kind, rows, mode)?;

        info!("Loaded {path}: {report}");
        Ok(report)
    }

    fn check_mode(&self, kind: StoreKind, mode: LoadMode) -> Result<(), StoreError> {
        if mode.append && mode.replace {
            return Err(StoreError::ConflictingLoadMode);
        }
        if self.store(kind).is_some() && !mode.append && !mode.replace {
            return Err(StoreError::AlreadyLoaded(kind));
        }
        Ok(())
    }

    pub fn store(&self, kind: StoreKind) -> Option<&RecordStore> {
        match kind {
            StoreKind::Results => self.results.as_ref(),
            StoreKind::Reference => self.reference.as_ref(),
        }
    }

    pub fn is_loaded(&self, kind: StoreKind) -> bool {
        self.store(kind).is_some()
    }

    pub fn results(&self) -> Result<&RecordStore, StoreError> {
        self.store(StoreKind::Results)
            .ok_or(StoreError::NotLoaded(StoreKind::Results))
    }

    pub fn reference(&self) -> Option<&RecordStore> {
        self.reference.as_ref()
    }
}
