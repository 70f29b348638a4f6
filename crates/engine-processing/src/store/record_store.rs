use crate::{
    stats::StatsAccumulator,
    store::{
        index::{EqualityIndex, Index},
        options::StoreOptions,
    },
    validation::{cross_reference, record::is_flag_set, validate_bonus, validate_record},
};
use engine_config::settings::validated::ValidateLevel;
use model::{
    core::value::Value,
    records::{
        field::{Field, FieldMap, StoreKind},
        record::Record,
    },
};
use std::{collections::HashMap, fmt};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Approve,
    Reject,
    None,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Approve => f.write_str("approve"),
            Status::Reject => f.write_str("reject"),
            Status::None => f.write_str("none"),
        }
    }
}

/// A record as held by a store, with the classification derived on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub record: Record,
    pub status: Status,
    pub bonus: f64,
    pub has_bonus: bool,
    pub has_qualification: bool,
}

impl StoredRecord {
    fn classify(record: Record, fields: &FieldMap) -> Self {
        let approve = is_flag_set(&record, fields.physical(Field::Approve));
        let reject = is_flag_set(&record, fields.physical(Field::Reject));
        let status = match (approve, reject) {
            (true, false) => Status::Approve,
            (false, true) => Status::Reject,
            _ => Status::None,
        };
        let bonus = record
            .present(fields.physical(Field::Bonus))
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        let has_qualification = record
            .present(fields.physical(Field::QualificationTypeId))
            .is_some_and(Value::is_non_empty_string);

        StoredRecord {
            record,
            status,
            bonus,
            has_bonus: bonus > 0.0,
            has_qualification,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Inserted { position: usize, errors: Vec<String> },
    /// The record went to the filtered store.
    Filtered,
}

impl InsertOutcome {
    pub fn is_filtered(&self) -> bool {
        matches!(self, InsertOutcome::Filtered)
    }
}

/// An in-memory, insertion-ordered collection of records with equality
/// indices, derived views, an error log and running statistics.
#[derive(Debug)]
pub struct RecordStore {
    kind: StoreKind,
    options: StoreOptions,
    records: Vec<StoredRecord>,
    indices: HashMap<Index, EqualityIndex>,
    errors: Vec<String>,
    filtered: Vec<Record>,
    stats: StatsAccumulator,
}

impl RecordStore {
    pub fn new(kind: StoreKind, options: StoreOptions) -> Self {
        RecordStore {
            kind,
            options,
            records: Vec::new(),
            indices: HashMap::new(),
            errors: Vec::new(),
            filtered: Vec::new(),
            stats: StatsAccumulator::new(),
        }
    }

    pub fn create(kind: StoreKind) -> Self {
        Self::new(kind, StoreOptions::new(kind))
    }

    pub fn insert(&mut self, record: Record) -> InsertOutcome {
        self.insert_with_reference(record, None)
    }

    /// Runs the insert pipeline. `reference`, when given, is the code list
    /// results are cross-checked against.
    pub fn insert_with_reference(
        &mut self,
        mut record: Record,
        reference: Option<&RecordStore>,
    ) -> InsertOutcome {
        if !self.options.fields.is_frozen() {
            if self.options.fields_case_insensitive {
                self.options.fields.rebuild_case_insensitive(record.columns());
            } else {
                self.options.fields.freeze();
            }
        }

        if let Some(filter) = &self.options.filter
            && !filter(&record)
        {
            debug!(store = %self.kind, line = ?record.source_line, "Record filtered");
            self.divert(record);
            return InsertOutcome::Filtered;
        }

        self.apply_overrides(&mut record);

        let mut errors = Vec::new();
        if self.kind == StoreKind::Results && self.options.validate_level >= ValidateLevel::Standard
        {
            let fields = &self.options.fields;
            let structural = validate_record(&mut record, fields, self.options.hit_id.as_deref());
            let bonus =
                validate_bonus(&record, fields, self.options.min_bonus, self.options.max_bonus)
                    .filter(|err| structural.as_ref() != Some(err));
            let failed: Vec<String> = structural.into_iter().chain(bonus).collect();

            if !failed.is_empty() && self.options.validate_level == ValidateLevel::Strict {
                self.log_errors(&record, failed);
                self.divert(record);
                return InsertOutcome::Filtered;
            }
            errors.extend(failed);

            if let Some(reference) = reference
                && let Some(err) = cross_reference(&record, fields, reference)
            {
                errors.push(err);
            }
        }

        let position = self.records.len();
        for index in Index::ALL {
            let column = self.options.fields.physical(index.field());
            let Some(key) = record.get_string(column).filter(|k| !k.is_empty()) else {
                continue;
            };
            let prior = self
                .indices
                .entry(index)
                .or_default()
                .insert(key.clone(), position);
            if prior > 0 {
                errors.push(format!(
                    "Duplicate {index} {key} ({} occurrences)",
                    prior + 1
                ));
            }
        }

        let stored = StoredRecord::classify(record, &self.options.fields);
        self.stats.update(&stored);
        self.log_errors(&stored.record, errors.clone());
        self.records.push(stored);

        InsertOutcome::Inserted { position, errors }
    }

    fn apply_overrides(&self, record: &mut Record) {
        let fields = &self.options.fields;
        if let Some(qualification) = &self.options.qualification_type_id {
            record.set(
                fields.physical(Field::QualificationTypeId),
                Value::from(qualification.as_str()),
            );
        }
        if self.options.auto_approve {
            record.set(fields.physical(Field::Approve), Value::Boolean(true));
            record.set(fields.physical(Field::Reject), Value::Boolean(false));
        }
    }

    fn divert(&mut self, record: Record) {
        self.stats.record_filtered();
        self.filtered.push(record);
    }

    fn log_errors(&mut self, record: &Record, errors: Vec<String>) {
        for err in errors {
            warn!(store = %self.kind, line = ?record.source_line, "{err}");
            self.errors.push(err);
        }
    }

    /// First record carrying `key` on `index`.
    pub fn get(&self, index: Index, key: &str) -> Option<&Record> {
        self.indices
            .get(&index)
            .and_then(|i| i.first(key))
            .and_then(|p| self.records.get(p))
            .map(|s| &s.record)
    }

    /// Every record carrying `key` on `index`, in insertion order.
    pub fn get_all(&self, index: Index, key: &str) -> Vec<&Record> {
        self.indices
            .get(&index)
            .map(|i| i.all(key))
            .unwrap_or_default()
            .iter()
            .filter_map(|&p| self.records.get(p))
            .map(|s| &s.record)
            .collect()
    }

    pub fn each<F>(&self, mut visitor: F)
    where
        F: FnMut(&StoredRecord),
    {
        self.records.iter().for_each(|r| visitor(r));
    }

    pub fn iter(&self) -> impl Iterator<Item = &StoredRecord> {
        self.records.iter()
    }

    pub fn with_bonus(&self) -> impl Iterator<Item = &StoredRecord> {
        self.records.iter().filter(|r| r.has_bonus)
    }

    pub fn with_qualification(&self) -> impl Iterator<Item = &StoredRecord> {
        self.records.iter().filter(|r| r.has_qualification)
    }

    pub fn by_status(&self, status: Status) -> impl Iterator<Item = &StoredRecord> {
        self.records.iter().filter(move |r| r.status == status)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn size(&self) -> usize {
        self.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn filtered(&self) -> &[Record] {
        &self.filtered
    }

    pub fn stats(&self) -> &StatsAccumulator {
        &self.stats
    }

    pub fn fields(&self) -> &FieldMap {
        &self.options.fields
    }

    pub fn kind(&self) -> StoreKind {
        self.kind
    }

}
