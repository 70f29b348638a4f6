use crate::{
    error::BatchError,
    request::{ResultsRequest, check_feedback},
    summary::{BatchSummary, ItemOutcome},
};
use chrono::{TimeDelta, Utc};
use engine_core::dispatch::dispatcher::RequestDispatcher;
use engine_processing::{
    stats::StatsAccumulator,
    store::{RecordStore, Status, registry::StoreRegistry},
};
use model::{core::value::Value, operation::Operation, records::field::Field};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const MAX_RECIPIENTS: usize = 100;
const MAX_SUBJECT_CHARS: usize = 200;
const MAX_MESSAGE_CHARS: usize = 4096;
const MAX_EXTENSION_SECS: u64 = 365 * 24 * 60 * 60;
const SEARCH_PAGE_SIZE: u32 = 100;

/// One call of a batch. `amount` is set for bonus grants.
struct Job {
    operation: Operation,
    params: serde_json::Value,
    amount: Option<f64>,
}

/// Orchestrates marketplace calls over the loaded results.
///
/// Per-record failures are collected into the returned [`BatchSummary`];
/// only missing preconditions and bad arguments fail a whole batch.
pub struct BatchOperations<'a> {
    dispatcher: &'a RequestDispatcher,
    registry: &'a StoreRegistry,
    cancel: CancellationToken,
}

impl<'a> BatchOperations<'a> {
    pub fn new(
        dispatcher: &'a RequestDispatcher,
        registry: &'a StoreRegistry,
        cancel: CancellationToken,
    ) -> Self {
        BatchOperations {
            dispatcher,
            registry,
            cancel,
        }
    }

    fn ensure_connected(&self) -> Result<(), BatchError> {
        let context = self.dispatcher.context();
        if context.is_dry_run() || context.is_connected() {
            Ok(())
        } else {
            Err(BatchError::NotConnected)
        }
    }

    fn results(&self) -> Result<&'a RecordStore, BatchError> {
        self.ensure_connected()?;
        Ok(self.registry.results()?)
    }

    /// Approves or rejects every classified record. Records marked neither
    /// are skipped.
    pub async fn approve_reject(&self, feedback: Option<&str>) -> Result<BatchSummary, BatchError> {
        if let Some(feedback) = feedback {
            check_feedback(feedback)?;
        }
        let store = self.results()?;
        let fields = store.fields();
        let mut summary = BatchSummary::new("approve/reject");
        let mut jobs = Vec::new();

        for stored in store.iter() {
            let operation = match stored.status {
                Status::Approve => Operation::ApproveAssignment,
                Status::Reject => Operation::RejectAssignment,
                Status::None => {
                    summary.skip();
                    continue;
                }
            };
            let Some(assignment) = stored
                .record
                .get_string(fields.physical(Field::AssignmentId))
            else {
                warn!(line = ?stored.record.source_line, "No AssignmentId, skipping {operation}");
                summary.skip();
                continue;
            };

            let mut params = json!({ "AssignmentId": assignment });
            let text = stored
                .record
                .get_string(fields.physical(Field::RequesterFeedback))
                .or_else(|| feedback.map(str::to_string));
            if let Some(text) = text {
                params["RequesterFeedback"] = json!(text);
            }
            jobs.push(Job {
                operation,
                params,
                amount: None,
            });
        }

        Ok(self.run(summary, jobs).await)
    }

    /// Grants the bonus of every record with a positive bonus. Rejected
    /// assignments are skipped with a warning.
    pub async fn grant_bonus(&self, reason: &str) -> Result<BatchSummary, BatchError> {
        if reason.trim().is_empty() {
            return Err(BatchError::InvalidArguments(
                "a non-empty Reason is required to grant bonuses".to_string(),
            ));
        }
        let store = self.results()?;
        let fields = store.fields();
        let mut summary = BatchSummary::new("bonus");
        let mut jobs = Vec::new();

        for stored in store.iter() {
            if !stored.has_bonus {
                summary.skip();
                continue;
            }
            let record = &stored.record;
            let worker = record
                .get_string(fields.physical(Field::WorkerId))
                .unwrap_or_default();
            let assignment = record
                .get_string(fields.physical(Field::AssignmentId))
                .unwrap_or_default();

            if stored.status == Status::Reject {
                warn!(
                    worker = %worker,
                    assignment = %assignment,
                    "Assignment is rejected, skipping its bonus of {:.2}",
                    stored.bonus
                );
                summary.skip();
                continue;
            }
            if worker.is_empty() || assignment.is_empty() {
                warn!(line = ?record.source_line, "Bonus without WorkerId or AssignmentId, skipping");
                summary.skip();
                continue;
            }

            let reason = record
                .get_string(fields.physical(Field::Reason))
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| reason.to_string());
            jobs.push(Job {
                operation: Operation::GrantBonus,
                params: json!({
                    "WorkerId": worker,
                    "AssignmentId": assignment,
                    "BonusAmount": format!("{:.2}", stored.bonus),
                    "Reason": reason,
                    "UniqueRequestToken": request_token(&assignment, stored.bonus),
                }),
                amount: Some(stored.bonus),
            });
        }

        Ok(self.run(summary, jobs).await)
    }

    /// Associates the qualification of every record that carries one.
    pub async fn assign_qualification(&self) -> Result<BatchSummary, BatchError> {
        let store = self.results()?;
        let fields = store.fields();
        let mut summary = BatchSummary::new("qualify");
        let mut jobs = Vec::new();

        for stored in store.iter() {
            let record = &stored.record;
            let worker = record.get_string(fields.physical(Field::WorkerId));
            let qualification = record.get_string(fields.physical(Field::QualificationTypeId));
            let (Some(worker), Some(qualification)) = (worker, qualification) else {
                summary.skip();
                continue;
            };
            if !stored.has_qualification {
                summary.skip();
                continue;
            }

            let value = record
                .present(fields.physical(Field::IntegerValue))
                .and_then(Value::as_i64)
                .unwrap_or(1);
            jobs.push(Job {
                operation: Operation::AssignQualification,
                params: json!({
                    "QualificationTypeId": qualification,
                    "WorkerId": worker,
                    "IntegerValue": value,
                    "SendNotification": false,
                }),
                amount: None,
            });
        }

        Ok(self.run(summary, jobs).await)
    }

    /// Runs the requested result operations in order: approvals and
    /// rejections, then bonuses, then qualifications.
    pub async fn process_results(
        &self,
        request: &ResultsRequest,
    ) -> Result<Vec<BatchSummary>, BatchError> {
        request.validate()?;
        self.results()?;

        let mut summaries = Vec::new();
        if request.approve {
            summaries.push(self.approve_reject(request.feedback.as_deref()).await?);
        }
        if request.bonus {
            let reason = request.reason.as_deref().unwrap_or_default();
            summaries.push(self.grant_bonus(reason).await?);
        }
        if request.qualify {
            summaries.push(self.assign_qualification().await?);
        }
        Ok(summaries)
    }

    /// Sends one message to up to 100 workers. Counts are per recipient.
    pub async fn notify(
        &self,
        worker_ids: &[String],
        subject: &str,
        body: &str,
    ) -> Result<BatchSummary, BatchError> {
        if worker_ids.is_empty() || worker_ids.len() > MAX_RECIPIENTS {
            return Err(BatchError::InvalidArguments(format!(
                "notifications need 1-{MAX_RECIPIENTS} recipients, got {}",
                worker_ids.len()
            )));
        }
        check_text("subject", subject, MAX_SUBJECT_CHARS)?;
        check_text("message", body, MAX_MESSAGE_CHARS)?;
        self.ensure_connected()?;

        let mut summary = BatchSummary::new("notify");
        let params = json!({
            "Subject": subject,
            "MessageText": body,
            "WorkerIds": worker_ids,
        });

        match self.dispatcher.dispatch(Operation::NotifyWorkers, params).await {
            Ok(response) => {
                let failures = notify_failures(&response);
                for (worker, message) in &failures {
                    summary.record(worker, ItemOutcome::Failed(message.clone()));
                }
                summary.succeeded = worker_ids.len().saturating_sub(failures.len());
            }
            Err(err) if err.is_dry_skip() => summary.dry_skipped = worker_ids.len(),
            Err(err) => {
                summary.failed = worker_ids.len();
                summary.failures.push((subject.to_string(), err.to_string()));
            }
        }

        info!("{}", summary.to_string().trim_end());
        Ok(summary)
    }

    /// Adds assignments to a HIT and/or pushes its expiration `seconds` into
    /// the future. `None` means dry mode sent nothing.
    pub async fn extend_hit(
        &self,
        hit_id: &str,
        assignments: u32,
        seconds: u64,
    ) -> Result<Option<serde_json::Value>, BatchError> {
        check_hit_id(hit_id)?;
        if assignments == 0 && seconds == 0 {
            return Err(BatchError::InvalidArguments(
                "extending a HIT needs additional assignments or seconds".to_string(),
            ));
        }
        if seconds > MAX_EXTENSION_SECS {
            return Err(BatchError::InvalidArguments(format!(
                "a HIT can be extended by at most {MAX_EXTENSION_SECS} seconds"
            )));
        }

        let mut reply = serde_json::Map::new();
        if assignments > 0 {
            let params = json!({ "HITId": hit_id, "NumberOfAdditionalAssignments": assignments });
            if let Some(response) = self.single(Operation::ExtendHit, params).await? {
                reply.insert("additionalAssignments".to_string(), response);
            }
        }
        if seconds > 0 {
            let expire_at = Utc::now() + TimeDelta::seconds(seconds as i64);
            let params = json!({ "HITId": hit_id, "ExpireAt": expire_at.timestamp() });
            if let Some(response) = self.single(Operation::ExtendHitExpiration, params).await? {
                reply.insert("expiration".to_string(), response);
            }
        }

        Ok((!reply.is_empty()).then_some(serde_json::Value::Object(reply)))
    }

    /// Expires a HIT immediately.
    pub async fn expire_hit(&self, hit_id: &str) -> Result<Option<serde_json::Value>, BatchError> {
        check_hit_id(hit_id)?;
        self.single(
            Operation::ForceExpireHit,
            json!({ "HITId": hit_id, "ExpireAt": 0 }),
        )
        .await
    }

    pub async fn search_hits(&self) -> Result<Option<serde_json::Value>, BatchError> {
        self.single(
            Operation::SearchHits,
            json!({ "MaxResults": SEARCH_PAGE_SIZE }),
        )
        .await
    }

    pub async fn search_qualification_types(
        &self,
        query: &str,
    ) -> Result<Option<serde_json::Value>, BatchError> {
        self.single(
            Operation::SearchQualificationTypes,
            json!({
                "Query": query,
                "MustBeRequestable": false,
                "MustBeOwnedByCaller": true,
                "MaxResults": SEARCH_PAGE_SIZE,
            }),
        )
        .await
    }

    pub async fn account_balance(&self) -> Result<Option<serde_json::Value>, BatchError> {
        self.single(Operation::GetAccountBalance, json!({})).await
    }

    /// Creates a HIT from a complete parameter object.
    pub async fn create_hit(
        &self,
        params: serde_json::Value,
    ) -> Result<Option<serde_json::Value>, BatchError> {
        if !params.as_object().is_some_and(|p| !p.is_empty()) {
            return Err(BatchError::InvalidArguments(
                "HIT parameters must be a non-empty JSON object".to_string(),
            ));
        }
        self.single(Operation::CreateHit, params).await
    }

    async fn single(
        &self,
        operation: Operation,
        params: serde_json::Value,
    ) -> Result<Option<serde_json::Value>, BatchError> {
        self.ensure_connected()?;
        match self.dispatcher.dispatch(operation, params).await {
            Ok(response) => Ok(Some(response)),
            Err(err) if err.is_dry_skip() => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn run(&self, mut summary: BatchSummary, jobs: Vec<Job>) -> BatchSummary {
        info!("Dispatching {} {} call(s)", jobs.len(), summary.operation);
        let tracks_bonus = jobs.iter().any(|j| j.amount.is_some());

        let outcomes = self
            .dispatcher
            .dispatch_batch(jobs, |job| self.run_job(job))
            .await;

        let mut granted = StatsAccumulator::new();
        for (subject, amount, outcome) in outcomes {
            if let Some(amount) = amount
                && matches!(outcome, ItemOutcome::Succeeded | ItemOutcome::DrySkipped)
            {
                granted.add_bonus(amount);
            }
            summary.record(&subject, outcome);
        }
        if tracks_bonus {
            summary.bonus = Some(granted.bonus());
        }

        info!(
            "{}: {} succeeded, {} failed, {} skipped, {} dry-run",
            summary.operation, summary.succeeded, summary.failed, summary.skipped, summary.dry_skipped
        );
        summary
    }

    async fn run_job(&self, job: Job) -> (String, Option<f64>, ItemOutcome) {
        let subject = job.operation.subject(&job.params);
        if self.cancel.is_cancelled() {
            warn!(operation = %job.operation, %subject, "Batch cancelled, not sending");
            return (subject, job.amount, ItemOutcome::Skipped);
        }

        let outcome = match self.dispatcher.dispatch(job.operation, job.params).await {
            Ok(_) => ItemOutcome::Succeeded,
            Err(err) if err.is_dry_skip() => ItemOutcome::DrySkipped,
            Err(err) => ItemOutcome::Failed(err.to_string()),
        };
        (subject, job.amount, outcome)
    }
}

/// Idempotency token for a bonus grant; the same assignment and amount
/// always yield the same token.
pub fn request_token(assignment: &str, amount: f64) -> String {
    let mut h = blake3::Hasher::new();
    h.update(b"bonus:");
    h.update(assignment.as_bytes());
    h.update(b":");
    h.update(format!("{amount:.2}").as_bytes());
    h.finalize().to_hex()[..32].to_string()
}

fn check_text(name: &str, text: &str, max: usize) -> Result<(), BatchError> {
    let len = text.chars().count();
    if len == 0 || len > max {
        return Err(BatchError::InvalidArguments(format!(
            "the {name} must be 1-{max} characters, got {len}"
        )));
    }
    Ok(())
}

fn check_hit_id(hit_id: &str) -> Result<(), BatchError> {
    if hit_id.trim().is_empty() {
        return Err(BatchError::InvalidArguments("a HITId is required".to_string()));
    }
    Ok(())
}

fn notify_failures(response: &serde_json::Value) -> Vec<(String, String)> {
    response
        .get("NotifyWorkersFailureStatuses")
        .and_then(|s| s.as_array())
        .map(|statuses| {
            statuses
                .iter()
                .map(|s| {
                    let field = |key: &str| {
                        s.get(key)
                            .and_then(|v| v.as_str())
                            .unwrap_or("-")
                            .to_string()
                    };
                    (field("WorkerId"), field("NotifyWorkersFailureMessage"))
                })
                .collect()
        })
        .unwrap_or_default()
}
