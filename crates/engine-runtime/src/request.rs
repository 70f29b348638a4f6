use crate::error::BatchError;
use engine_processing::validation::MAX_FEEDBACK_CHARS;

/// What a combined `results` run should do with the loaded results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultsRequest {
    pub approve: bool,
    pub bonus: bool,
    pub qualify: bool,
    /// Batch-wide bonus reason; per-record reasons take precedence.
    pub reason: Option<String>,
    /// Default feedback for approvals and rejections without their own.
    pub feedback: Option<String>,
}

impl ResultsRequest {
    pub fn validate(&self) -> Result<(), BatchError> {
        if !self.approve && !self.bonus && !self.qualify {
            return Err(BatchError::InvalidArguments(
                "nothing to do: request approvals, bonuses or qualifications".to_string(),
            ));
        }
        if self.reason.is_some() && !self.bonus {
            return Err(BatchError::InvalidArguments(
                "a bonus reason was given without granting bonuses".to_string(),
            ));
        }
        if self.feedback.is_some() && !self.approve {
            return Err(BatchError::InvalidArguments(
                "feedback was given without approving or rejecting".to_string(),
            ));
        }
        if let Some(feedback) = &self.feedback {
            check_feedback(feedback)?;
        }
        if self.bonus && self.reason.as_deref().is_none_or(|r| r.trim().is_empty()) {
            return Err(BatchError::InvalidArguments(
                "granting bonuses requires a non-empty reason".to_string(),
            ));
        }
        Ok(())
    }
}

/// Batch-wide feedback obeys the same 1-1024 character bound as the
/// per-record RequesterFeedback column.
pub(crate) fn check_feedback(feedback: &str) -> Result<(), BatchError> {
    let len = feedback.chars().count();
    if !(1..=MAX_FEEDBACK_CHARS).contains(&len) {
        return Err(BatchError::InvalidArguments(format!(
            "feedback must be 1-{MAX_FEEDBACK_CHARS} characters, got {len}"
        )));
    }
    Ok(())
}
