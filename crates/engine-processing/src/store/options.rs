use engine_config::settings::validated::{Settings, ValidateLevel};
use model::records::{
    field::{FieldMap, StoreKind},
    record::Record,
};
use std::{fmt, sync::Arc};

/// Predicate run before anything else on insert; `false` diverts the record
/// to the filtered store.
pub type RecordFilter = Arc<dyn Fn(&Record) -> bool + Send + Sync>;

/// Per-store insert behaviour.
#[derive(Clone)]
pub struct StoreOptions {
    pub fields: FieldMap,
    pub fields_case_insensitive: bool,
    pub validate_level: ValidateLevel,
    pub min_bonus: f64,
    pub max_bonus: f64,
    pub hit_id: Option<String>,
    pub qualification_type_id: Option<String>,
    pub auto_approve: bool,
    pub filter: Option<RecordFilter>,
}

impl StoreOptions {
    pub fn new(kind: StoreKind) -> Self {
        StoreOptions {
            fields: FieldMap::for_kind(kind),
            fields_case_insensitive: false,
            validate_level: ValidateLevel::Standard,
            min_bonus: 0.0,
            max_bonus: 10.0,
            hit_id: None,
            qualification_type_id: None,
            auto_approve: false,
            filter: None,
        }
    }

    /// Options for one store kind. Overrides, filtering and validation only
    /// concern results; a reference list is indexed as loaded.
    pub fn from_settings(settings: &Settings, kind: StoreKind) -> Self {
        let mut options = StoreOptions {
            fields: settings.field_map(kind).clone(),
            fields_case_insensitive: settings.fields_case_insensitive,
            ..StoreOptions::new(kind)
        };

        if kind == StoreKind::Results {
            options.validate_level = settings.validate_level;
            options.min_bonus = settings.min_bonus;
            options.max_bonus = settings.max_bonus;
            options.hit_id = settings.hit_id.clone();
            options.qualification_type_id = settings.qualification_type_id.clone();
            options.auto_approve = settings.auto_approve;
            options.filter = settings.filter.clone().map(|rule| {
                let filter: RecordFilter = Arc::new(move |record: &Record| rule.keeps(record));
                filter
            });
        }

        options
    }

    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }
}

impl fmt::Debug for StoreOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreOptions")
            .field("fields", &self.fields)
            .field("fields_case_insensitive", &self.fields_case_insensitive)
            .field("validate_level", &self.validate_level)
            .field("min_bonus", &self.min_bonus)
            .field("max_bonus", &self.max_bonus)
            .field("hit_id", &self.hit_id)
            .field("qualification_type_id", &self.qualification_type_id)
            .field("auto_approve", &self.auto_approve)
            .field("filter", &self.filter.is_some())
            .finish()
    }
}
