use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Null,
}

impl Value {
    /// Builds a value from a raw CSV cell. Empty cells load as `Null`.
    pub fn from_cell(cell: &str) -> Self {
        if cell.is_empty() {
            Value::Null
        } else {
            Value::String(cell.to_string())
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::String(v) => v.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            Value::Boolean(_) => None,
            Value::Null => None,
        }
    }

    /// Integer coercion. Integral floats and numeric strings are accepted.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            Value::Float(_) => None,
            Value::String(v) => {
                let trimmed = v.trim();
                trimmed.parse::<i64>().ok().or_else(|| {
                    trimmed
                        .parse::<f64>()
                        .ok()
                        .filter(|f| f.fract() == 0.0 && f.is_finite())
                        .map(|f| f as i64)
                })
            }
            Value::Boolean(_) => None,
            Value::Null => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<String> {
        match self {
            Value::Int(v) => Some(v.to_string()),
            Value::Float(v) => Some(v.to_string()),
            Value::String(v) => Some(v.clone()),
            Value::Boolean(v) => Some(v.to_string()),
            Value::Null => None,
        }
    }

    /// Flag semantics for Approve/Reject columns.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Boolean(v) => *v,
            Value::Int(v) => *v != 0,
            Value::Float(v) => *v != 0.0,
            Value::String(v) => {
                let v = v.trim();
                !v.is_empty()
                    && !["0", "false", "no", "n"]
                        .iter()
                        .any(|falsy| v.eq_ignore_ascii_case(falsy))
            }
            Value::Null => false,
        }
    }

    /// Strings that carry at least one character. Numeric cells (codes that
    /// were typed as numbers) also count.
    pub fn is_non_empty_string(&self) -> bool {
        match self {
            Value::String(v) => !v.is_empty(),
            Value::Null | Value::Boolean(_) => false,
            Value::Int(_) | Value::Float(_) => true,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v}"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Null => write!(f, "NULL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(Value::from("1").is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(Value::from(true).is_truthy());
        assert!(Value::Int(2).is_truthy());
        assert!(!Value::from("0").is_truthy());
        assert!(!Value::from("FALSE").is_truthy());
        assert!(!Value::from(" ").is_truthy());
        assert!(!Value::Null.is_truthy());
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(Value::from(" 2.50 ").as_f64(), Some(2.5));
        assert_eq!(Value::from("abc").as_f64(), None);
        assert_eq!(Value::from("NaN").as_f64(), None);
        assert_eq!(Value::from("7").as_i64(), Some(7));
        assert_eq!(Value::from("7.0").as_i64(), Some(7));
        assert_eq!(Value::from("7.5").as_i64(), None);
        assert_eq!(Value::Float(3.0).as_i64(), Some(3));
    }

    #[test]
    fn test_from_cell() {
        assert_eq!(Value::from_cell(""), Value::Null);
        assert_eq!(Value::from_cell("W1"), Value::from("W1"));
    }
}
