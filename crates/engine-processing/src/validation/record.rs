use model::{
    core::value::Value,
    records::{
        field::{Field, FieldMap},
        record::Record,
    },
};

/// Upper bound on RequesterFeedback length, in characters.
pub const MAX_FEEDBACK_CHARS: usize = 1024;
const SUBMITTED: &str = "Submitted";

/// Structural check of one results record. Returns the first violation.
///
/// The bonus and IntegerValue columns are coerced in place (string to number,
/// string to integer) when they pass.
pub fn validate_record(
    record: &mut Record,
    fields: &FieldMap,
    expected_hit_id: Option<&str>,
) -> Option<String> {
    if record.is_empty() {
        return Some("Record has no fields".to_string());
    }

    let worker_col = fields.physical(Field::WorkerId);
    let worker = match record.present(worker_col) {
        Some(v) if v.is_non_empty_string() => v.to_string(),
        _ => return Some(format!("Record is missing a WorkerId ({worker_col})")),
    };

    let assignment_col = fields.physical(Field::AssignmentId);
    if !record
        .present(assignment_col)
        .is_some_and(Value::is_non_empty_string)
    {
        return Some(format!(
            "Record for WorkerId {worker} is missing an AssignmentId ({assignment_col})"
        ));
    }

    let hit_col = fields.physical(Field::HitId);
    if let Some(hit) = record.present(hit_col) {
        if !hit.is_non_empty_string() {
            return Some(format!("{hit_col} for WorkerId {worker} must be a non-empty string"));
        }
        if let Some(expected) = expected_hit_id
            && hit.to_string() != expected
        {
            return Some(format!(
                "{hit_col} for WorkerId {worker} is {hit}, expected {expected}"
            ));
        }
    }

    let bonus_col = fields.physical(Field::Bonus);
    if let Some(bonus) = record.present(bonus_col) {
        let Some(amount) = bonus.as_f64() else {
            return Some(format!(
                "{bonus_col} for WorkerId {worker} is not a number: {bonus}"
            ));
        };
        record.set(bonus_col, Value::Float(amount));
        if amount < 0.0 {
            return Some(format!(
                "{bonus_col} for WorkerId {worker} must not be negative: {amount}"
            ));
        }
    }

    for field in [Field::Reason, Field::ExitCode, Field::QualificationTypeId] {
        let col = fields.physical(field);
        if let Some(v) = record.present(col)
            && !v.is_non_empty_string()
        {
            return Some(format!("{col} for WorkerId {worker} must be a non-empty string"));
        }
    }

    let int_col = fields.physical(Field::IntegerValue);
    if let Some(v) = record.present(int_col) {
        let Some(n) = v.as_i64() else {
            return Some(format!("{int_col} for WorkerId {worker} is not an integer: {v}"));
        };
        record.set(int_col, Value::Int(n));
    }

    let approve = is_flag_set(record, fields.physical(Field::Approve));
    let reject = is_flag_set(record, fields.physical(Field::Reject));
    match (approve, reject) {
        (true, true) => {
            return Some(format!(
                "Record for WorkerId {worker} is marked both Approve and Reject"
            ));
        }
        (false, false) => {
            return Some(format!(
                "Record for WorkerId {worker} is marked neither Approve nor Reject"
            ));
        }
        _ => {}
    }

    let status_col = fields.physical(Field::AssignmentStatus);
    if let Some(status) = record.present(status_col)
        && status.as_str() != Some(SUBMITTED)
    {
        return Some(format!(
            "{status_col} for WorkerId {worker} is {status}, expected {SUBMITTED}"
        ));
    }

    let feedback_col = fields.physical(Field::RequesterFeedback);
    if let Some(feedback) = record.present(feedback_col) {
        let len = feedback.as_str().map(|s| s.chars().count()).unwrap_or(0);
        if !(1..=MAX_FEEDBACK_CHARS).contains(&len) {
            return Some(format!(
                "{feedback_col} for WorkerId {worker} must be 1-{MAX_FEEDBACK_CHARS} characters, got {len}"
            ));
        }
    }

    None
}

/// Bonus range check, applied on top of [`validate_record`]. A record
/// without a bonus passes.
pub fn validate_bonus(record: &Record, fields: &FieldMap, min: f64, max: f64) -> Option<String> {
    let bonus_col = fields.physical(Field::Bonus);
    let bonus = record.present(bonus_col)?;
    let worker = record
        .get_string(fields.physical(Field::WorkerId))
        .unwrap_or_default();

    match bonus.as_f64() {
        None => Some(format!(
            "{bonus_col} for WorkerId {worker} is not a number: {bonus}"
        )),
        Some(amount) if amount < min || amount > max => Some(format!(
            "{bonus_col} for WorkerId {worker} is {amount}, outside {min}..={max}"
        )),
        Some(_) => None,
    }
}

pub(crate) fn is_flag_set(record: &Record, column: &str) -> bool {
    record.present(column).is_some_and(Value::is_truthy)
}
