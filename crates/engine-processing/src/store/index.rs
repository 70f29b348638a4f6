use model::records::field::Field;
use std::{collections::HashMap, fmt};

/// The equality indices every store maintains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Index {
    Id,
    WorkerId,
    AssignmentId,
    ExitCode,
}

impl Index {
    pub const ALL: [Index; 4] = [Index::Id, Index::WorkerId, Index::AssignmentId, Index::ExitCode];

    pub fn field(&self) -> Field {
        match self {
            Index::Id => Field::Id,
            Index::WorkerId => Field::WorkerId,
            Index::AssignmentId => Field::AssignmentId,
            Index::ExitCode => Field::ExitCode,
        }
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Index::Id => f.write_str("id"),
            Index::WorkerId => f.write_str("WorkerId"),
            Index::AssignmentId => f.write_str("AssignmentId"),
            Index::ExitCode => f.write_str("exit code"),
        }
    }
}

/// Key -> record positions, in insertion order. Duplicates are kept so every
/// record stays reachable.
#[derive(Debug, Clone, Default)]
pub struct EqualityIndex {
    entries: HashMap<String, Vec<usize>>,
}

impl EqualityIndex {
    /// Adds `position` under `key` and returns how many records already
    /// carried the key.
    pub fn insert(&mut self, key: String, position: usize) -> usize {
        let positions = self.entries.entry(key).or_default();
        positions.push(position);
        positions.len() - 1
    }

    pub fn first(&self, key: &str) -> Option<usize> {
        self.entries.get(key).and_then(|p| p.first().copied())
    }

    pub fn all(&self, key: &str) -> &[usize] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_reports_prior_occurrences() {
        let mut index = EqualityIndex::default();
        assert_eq!(index.insert("W1".into(), 0), 0);
        assert_eq!(index.insert("W2".into(), 1), 0);
        assert_eq!(index.insert("W1".into(), 2), 1);

        assert_eq!(index.first("W1"), Some(0));
        assert_eq!(index.all("W1"), &[0, 2]);
        assert!(index.all("nope").is_empty());
    }
}
