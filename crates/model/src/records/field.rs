use serde::Serialize;
use std::{collections::HashMap, fmt, str::FromStr};
use thiserror::Error;

/// Logical record fields. Stores and validators address columns through
/// these names and resolve them to physical columns with a [`FieldMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Field {
    Id,
    Bonus,
    WorkerId,
    AssignmentId,
    HitId,
    Approve,
    Reject,
    ExitCode,
    AccessCode,
    QualificationTypeId,
    Reason,
    IntegerValue,
    AssignmentStatus,
    RequesterFeedback,
}

impl Field {
    pub const ALL: [Field; 14] = [
        Field::Id,
        Field::Bonus,
        Field::WorkerId,
        Field::AssignmentId,
        Field::HitId,
        Field::Approve,
        Field::Reject,
        Field::ExitCode,
        Field::AccessCode,
        Field::QualificationTypeId,
        Field::Reason,
        Field::IntegerValue,
        Field::AssignmentStatus,
        Field::RequesterFeedback,
    ];

    /// The logical name used in configuration files.
    pub fn logical_name(&self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Bonus => "bonus",
            Field::WorkerId => "workerId",
            Field::AssignmentId => "assignmentId",
            Field::HitId => "hitId",
            Field::Approve => "approve",
            Field::Reject => "reject",
            Field::ExitCode => "exitCode",
            Field::AccessCode => "accessCode",
            Field::QualificationTypeId => "qualificationTypeId",
            Field::Reason => "reason",
            Field::IntegerValue => "integerValue",
            Field::AssignmentStatus => "assignmentStatus",
            Field::RequesterFeedback => "requesterFeedback",
        }
    }

    fn default_column(&self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Bonus => "bonus",
            Field::WorkerId => "WorkerId",
            Field::AssignmentId => "AssignmentId",
            Field::HitId => "HITId",
            Field::Approve => "Approve",
            Field::Reject => "Reject",
            Field::ExitCode => "exitCode",
            Field::AccessCode => "accessCode",
            Field::QualificationTypeId => "QualificationTypeId",
            Field::Reason => "Reason",
            Field::IntegerValue => "IntegerValue",
            Field::AssignmentStatus => "AssignmentStatus",
            Field::RequesterFeedback => "RequesterFeedback",
        }
    }
}

impl FromStr for Field {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|f| f.logical_name() == s)
            .ok_or_else(|| FieldError::UnknownField(s.to_string()))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.logical_name())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum FieldError {
    #[error("Unknown logical field name: {0}")]
    UnknownField(String),

    #[error("Physical column name for '{0}' must not be empty")]
    EmptyColumn(String),
}

/// Which class of records a store holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StoreKind {
    Results,
    Reference,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Results => f.write_str("results"),
            StoreKind::Reference => f.write_str("reference"),
        }
    }
}

/// Logical field -> physical column mapping.
///
/// Once a store has observed its first record the map is frozen; the only
/// mutation after construction is the one-time case-insensitive rebuild.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMap {
    columns: HashMap<Field, String>,
    frozen: bool,
}

impl Default for FieldMap {
    fn default() -> Self {
        FieldMap {
            columns: Field::ALL
                .into_iter()
                .map(|f| (f, f.default_column().to_string()))
                .collect(),
            frozen: false,
        }
    }
}

impl FieldMap {
    /// Reference code lists are issued with a capitalised `ExitCode` header.
    pub fn for_kind(kind: StoreKind) -> Self {
        let mut map = FieldMap::default();
        if kind == StoreKind::Reference {
            map.columns.insert(Field::ExitCode, "ExitCode".to_string());
        }
        map
    }

    pub fn with_overrides(mut self, overrides: &HashMap<String, String>) -> Result<Self, FieldError> {
        for (logical, column) in overrides {
            let field = Field::from_str(logical)?;
            if column.is_empty() {
                return Err(FieldError::EmptyColumn(logical.clone()));
            }
            self.columns.insert(field, column.clone());
        }
        Ok(self)
    }

    pub fn physical(&self, field: Field) -> &str {
        self.columns
            .get(&field)
            .map(String::as_str)
            .unwrap_or_else(|| field.default_column())
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Re-spells every physical column to match a header that equals it
    /// ignoring ASCII case. No-op once the map is frozen; always freezes.
    pub fn rebuild_case_insensitive<'a, I>(&mut self, headers: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        if self.frozen {
            return;
        }

        let headers: Vec<&str> = headers.into_iter().collect();
        for column in self.columns.values_mut() {
            if let Some(header) = headers.iter().find(|h| h.eq_ignore_ascii_case(column)) {
                *column = header.to_string();
            }
        }
        self.frozen = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_per_kind() {
        let results = FieldMap::for_kind(StoreKind::Results);
        let reference = FieldMap::for_kind(StoreKind::Reference);
        assert_eq!(results.physical(Field::ExitCode), "exitCode");
        assert_eq!(reference.physical(Field::ExitCode), "ExitCode");
        assert_eq!(results.physical(Field::HitId), "HITId");
    }

    #[test]
    fn test_overrides() {
        let overrides = HashMap::from([("workerId".to_string(), "worker".to_string())]);
        let map = FieldMap::default().with_overrides(&overrides).unwrap();
        assert_eq!(map.physical(Field::WorkerId), "worker");

        let bad = HashMap::from([("nope".to_string(), "x".to_string())]);
        assert_eq!(
            FieldMap::default().with_overrides(&bad),
            Err(FieldError::UnknownField("nope".to_string()))
        );
    }

    #[test]
    fn test_case_insensitive_rebuild_happens_once() {
        let mut map = FieldMap::default();
        map.rebuild_case_insensitive(["workerid", "ASSIGNMENTID", "bonus"]);
        assert_eq!(map.physical(Field::WorkerId), "workerid");
        assert_eq!(map.physical(Field::AssignmentId), "ASSIGNMENTID");
        assert!(map.is_frozen());

        map.rebuild_case_insensitive(["WORKERID"]);
        assert_eq!(map.physical(Field::WorkerId), "workerid");
    }
}
