use serde::Serialize;
use std::fmt;

/// Remote marketplace operations issued by the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operation {
    ApproveAssignment,
    RejectAssignment,
    GrantBonus,
    AssignQualification,
    ExtendHit,
    ExtendHitExpiration,
    ForceExpireHit,
    SearchHits,
    SearchQualificationTypes,
    NotifyWorkers,
    GetAccountBalance,
    CreateHit,
}

impl Operation {
    /// Name of the operation on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::ApproveAssignment => "ApproveAssignment",
            Operation::RejectAssignment => "RejectAssignment",
            Operation::GrantBonus => "SendBonus",
            Operation::AssignQualification => "AssociateQualificationWithWorker",
            Operation::ExtendHit => "CreateAdditionalAssignmentsForHIT",
            Operation::ExtendHitExpiration => "UpdateExpirationForHIT",
            Operation::ForceExpireHit => "UpdateExpirationForHIT",
            Operation::SearchHits => "ListHITs",
            Operation::SearchQualificationTypes => "ListQualificationTypes",
            Operation::NotifyWorkers => "NotifyWorkers",
            Operation::GetAccountBalance => "GetAccountBalance",
            Operation::CreateHit => "CreateHIT",
        }
    }

    /// The parameters that identify the subject of a call, used in logs and
    /// to key in-flight operations. Two calls share a subject only when they
    /// act on the same record.
    pub fn subject_params(&self) -> &'static [&'static str] {
        match self {
            Operation::ApproveAssignment
            | Operation::RejectAssignment
            | Operation::GrantBonus => &["AssignmentId"],
            Operation::AssignQualification => &["WorkerId", "QualificationTypeId"],
            Operation::ExtendHit
            | Operation::ExtendHitExpiration
            | Operation::ForceExpireHit => &["HITId"],
            Operation::NotifyWorkers => &["Subject"],
            Operation::SearchHits
            | Operation::SearchQualificationTypes
            | Operation::GetAccountBalance
            | Operation::CreateHit => &[],
        }
    }

    /// Extracts the subject from a parameter object, joining multi-part
    /// subjects with `/`; `"-"` when there is none.
    pub fn subject(&self, params: &serde_json::Value) -> String {
        let parts: Vec<&str> = self
            .subject_params()
            .iter()
            .filter_map(|key| params.get(*key).and_then(|v| v.as_str()))
            .collect();
        if parts.is_empty() {
            "-".to_string()
        } else {
            parts.join("/")
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
