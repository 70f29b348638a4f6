use model::records::record::Record;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawFilter {
    pub field: Option<String>,
    pub equals: Option<String>,
    pub not_equals: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterCondition {
    Equals(String),
    NotEquals(String),
}

/// Keeps records whose column matches the condition; everything else is
/// diverted away from the main store.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterRule {
    pub column: String,
    pub condition: FilterCondition,
}

impl FilterRule {
    pub fn from_raw(raw: &RawFilter) -> Result<Self, String> {
        let column = raw
            .field
            .clone()
            .filter(|f| !f.is_empty())
            .ok_or_else(|| "filter.field must be a non-empty column name".to_string())?;

        let condition = match (&raw.equals, &raw.not_equals) {
            (Some(v), None) => FilterCondition::Equals(v.clone()),
            (None, Some(v)) => FilterCondition::NotEquals(v.clone()),
            _ => return Err("filter needs exactly one of equals / not_equals".to_string()),
        };

        Ok(FilterRule { column, condition })
    }

    /// Absent and empty cells compare as the empty string.
    pub fn keeps(&self, record: &Record) -> bool {
        let value = record.get_string(&self.column).unwrap_or_default();
        match &self.condition {
            FilterCondition::Equals(expected) => value == *expected,
            FilterCondition::NotEquals(expected) => value != *expected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(field: &str, equals: Option<&str>, not_equals: Option<&str>) -> RawFilter {
        RawFilter {
            field: Some(field.to_string()),
            equals: equals.map(str::to_string),
            not_equals: not_equals.map(str::to_string),
        }
    }

    #[test]
    fn test_equals_and_not_equals() {
        let submitted = Record::from_pairs([("AssignmentStatus", "Submitted")]);
        let approved = Record::from_pairs([("AssignmentStatus", "Approved")]);

        let eq = FilterRule::from_raw(&raw("AssignmentStatus", Some("Submitted"), None)).unwrap();
        assert!(eq.keeps(&submitted));
        assert!(!eq.keeps(&approved));

        let ne = FilterRule::from_raw(&raw("AssignmentStatus", None, Some("Approved"))).unwrap();
        assert!(ne.keeps(&submitted));
        assert!(!ne.keeps(&approved));
    }

    #[test]
    fn test_rule_needs_exactly_one_condition() {
        assert!(FilterRule::from_raw(&raw("x", Some("a"), Some("b"))).is_err());
        assert!(FilterRule::from_raw(&raw("x", None, None)).is_err());
        assert!(FilterRule::from_raw(&raw("", Some("a"), None)).is_err());
    }
}
