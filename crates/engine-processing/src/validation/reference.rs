use crate::store::{RecordStore, index::Index};
use model::records::{
    field::{Field, FieldMap},
    record::Record,
};

/// Checks a results record against the reference code list.
///
/// The reference entry is looked up by id, then by exit code, then by
/// WorkerId. When both sides carry an exit code they must match exactly.
pub fn cross_reference(record: &Record, fields: &FieldMap, reference: &RecordStore) -> Option<String> {
    let worker = record
        .get_string(fields.physical(Field::WorkerId))
        .unwrap_or_default();
    let exit_code = record
        .get_string(fields.physical(Field::ExitCode))
        .filter(|s| !s.is_empty());

    let lookups = [
        (Index::Id, record.get_string(fields.physical(Field::Id))),
        (Index::ExitCode, exit_code.clone()),
        (Index::WorkerId, Some(worker.clone())),
    ];
    let found = lookups.into_iter().find_map(|(index, key)| {
        key.filter(|k| !k.is_empty())
            .and_then(|k| reference.get(index, &k))
    });

    let Some(entry) = found else {
        return Some(format!(
            "WorkerId {worker} not found in the reference list{}",
            exit_code
                .as_deref()
                .map(|c| format!(" (exit code {c})"))
                .unwrap_or_default()
        ));
    };

    let expected = entry
        .get_string(reference.fields().physical(Field::ExitCode))
        .filter(|s| !s.is_empty());
    match (expected, exit_code) {
        (Some(expected), Some(found)) if expected != found => Some(format!(
            "Exit code mismatch for WorkerId {worker}: expected {expected}, found {found}"
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::records::field::StoreKind;

    fn reference() -> RecordStore {
        let mut store = RecordStore::create(StoreKind::Reference);
        store.insert(Record::from_pairs([("WorkerId", "W1"), ("ExitCode", "X1")]));
        store.insert(Record::from_pairs([("WorkerId", "W2"), ("ExitCode", "X2")]));
        store
    }

    fn result(worker: &str, exit_code: &str) -> Record {
        Record::from_pairs([("WorkerId", worker), ("exitCode", exit_code)])
    }

    #[test]
    fn test_matching_code_passes() {
        let fields = FieldMap::for_kind(StoreKind::Results);
        assert_eq!(cross_reference(&result("W1", "X1"), &fields, &reference()), None);
    }

    #[test]
    fn test_code_of_another_worker_is_found_by_code() {
        // Found via the exit code index; the codes trivially agree.
        let fields = FieldMap::for_kind(StoreKind::Results);
        assert_eq!(cross_reference(&result("W1", "X2"), &fields, &reference()), None);
    }

    #[test]
    fn test_mismatch_cites_both_codes() {
        let mut reference = RecordStore::create(StoreKind::Reference);
        reference.insert(Record::from_pairs([("WorkerId", "W1"), ("ExitCode", "X1")]));

        let fields = FieldMap::for_kind(StoreKind::Results);
        let err = cross_reference(&result("W1", "X9"), &fields, &reference).unwrap();
        assert!(err.contains("expected X1"), "{err}");
        assert!(err.contains("found X9"), "{err}");
    }

    #[test]
    fn test_unknown_worker_is_not_found() {
        let fields = FieldMap::for_kind(StoreKind::Results);
        let err = cross_reference(&result("W9", "X9"), &fields, &reference()).unwrap();
        assert!(err.contains("not found"));
        assert!(err.contains("W9"));
    }

    #[test]
    fn test_id_lookup_wins_over_exit_code() {
        let mut reference = RecordStore::create(StoreKind::Reference);
        reference.insert(Record::from_pairs([("id", "R1"), ("WorkerId", "W1"), ("ExitCode", "X1")]));
        reference.insert(Record::from_pairs([("id", "R2"), ("WorkerId", "W2"), ("ExitCode", "X2")]));

        // X2 belongs to R2, but the id points at R1.
        let record = Record::from_pairs([("id", "R1"), ("WorkerId", "W1"), ("exitCode", "X2")]);
        let fields = FieldMap::for_kind(StoreKind::Results);
        let err = cross_reference(&record, &fields, &reference).unwrap();
        assert!(err.contains("expected X1, found X2"), "{err}");
    }
}
