use crate::core::value::Value;
use serde::{Deserialize, Serialize};

/// One named cell of a record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldValue {
    pub name: String,
    pub value: Value,
}

/// An ordered mapping from physical column name to value, one per ingested row.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Record {
    pub field_values: Vec<FieldValue>,
    /// 1-based data row the record was loaded from, if it came from a file.
    pub source_line: Option<usize>,
}

impl Record {
    pub fn new(field_values: Vec<FieldValue>) -> Self {
        Record {
            field_values,
            source_line: None,
        }
    }

    pub fn with_source_line(mut self, line: usize) -> Self {
        self.source_line = Some(line);
        self
    }

    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Record::new(
            pairs
                .into_iter()
                .map(|(name, value)| FieldValue {
                    name: name.into(),
                    value: value.into(),
                })
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.field_values.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.field_values.iter().map(|f| f.name.as_str())
    }

    /// Exact, case-sensitive lookup.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.field_values
            .iter()
            .find(|f| f.name == column)
            .map(|f| &f.value)
    }

    /// Lookup that treats `Null` cells as absent.
    pub fn present(&self, column: &str) -> Option<&Value> {
        self.get(column).filter(|v| !v.is_null())
    }

    pub fn get_string(&self, column: &str) -> Option<String> {
        self.present(column).and_then(Value::as_string)
    }

    /// Replaces the value in place, or appends a new column.
    pub fn set(&mut self, column: &str, value: Value) {
        match self.field_values.iter_mut().find(|f| f.name == column) {
            Some(field) => field.value = value,
            None => self.field_values.push(FieldValue {
                name: column.to_string(),
                value,
            }),
        }
    }
}
