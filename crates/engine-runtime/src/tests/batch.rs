#[cfg(test)]
mod tests {
    use crate::{
        batch::{BatchOperations, request_token},
        error::BatchError,
        request::ResultsRequest,
    };
    use async_trait::async_trait;
    use connectors::market::{client::MarketplaceClient, error::RemoteError};
    use engine_core::{
        context::MarketContext, dispatch::dispatcher::RequestDispatcher, retry::RetryPolicy,
    };
    use engine_processing::store::{
        error::StoreError,
        options::StoreOptions,
        registry::{LoadMode, StoreRegistry},
    };
    use model::{
        core::value::Value,
        operation::Operation,
        records::{field::StoreKind, record::Record},
    };
    use serde_json::json;
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };
    use tokio_util::sync::CancellationToken;

    type Calls = Vec<(Operation, serde_json::Value)>;

    /// Records every call and fails those whose subject is listed.
    struct RecordingClient {
        calls: Mutex<Calls>,
        fail_subjects: Vec<String>,
        response: serde_json::Value,
    }

    impl RecordingClient {
        fn new() -> Arc<Self> {
            Self::with(vec![], json!({}))
        }

        fn with(fail_subjects: Vec<&str>, response: serde_json::Value) -> Arc<Self> {
            Arc::new(RecordingClient {
                calls: Mutex::new(Vec::new()),
                fail_subjects: fail_subjects.into_iter().map(String::from).collect(),
                response,
            })
        }

        fn calls(&self) -> Calls {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MarketplaceClient for RecordingClient {
        async fn call(
            &self,
            operation: Operation,
            params: serde_json::Value,
        ) -> Result<serde_json::Value, RemoteError> {
            let subject = operation.subject(&params);
            self.calls.lock().unwrap().push((operation, params));
            if self.fail_subjects.contains(&subject) {
                return Err(RemoteError::Service {
                    status: 400,
                    message: "rejected".to_string(),
                });
            }
            Ok(self.response.clone())
        }
    }

    fn dispatcher(dry_run: bool, client: Option<Arc<RecordingClient>>) -> RequestDispatcher {
        let context = Arc::new(MarketContext::new(
            dry_run,
            RetryPolicy::default(),
            Duration::from_millis(500),
        ));
        if let Some(client) = client {
            context.connect(client).unwrap();
        }
        RequestDispatcher::new(context)
    }

    fn result(worker: &str, assignment: &str, status: &str, bonus: f64) -> Record {
        let mut record = Record::from_pairs([
            ("WorkerId", Value::from(worker)),
            ("AssignmentId", Value::from(assignment)),
        ]);
        record.set(status, Value::Boolean(true));
        if bonus > 0.0 {
            record.set("bonus", Value::Float(bonus));
        }
        record
    }

    fn registry(rows: Vec<Record>) -> StoreRegistry {
        let mut registry = StoreRegistry::new(
            StoreOptions::new(StoreKind::Results),
            StoreOptions::new(StoreKind::Reference),
        );
        registry
            .load_rows(StoreKind::Results, rows, LoadMode::default())
            .unwrap();
        registry
    }

    fn sample() -> StoreRegistry {
        registry(vec![
            result("W1", "A1", "Approve", 5.0),
            result("W2", "A2", "Reject", 3.0),
            result("W3", "A3", "Approve", 0.0),
        ])
    }

    #[tokio::test(start_paused = true)]
    async fn test_approve_reject_dispatches_by_status() {
        let client = RecordingClient::new();
        let dispatcher = dispatcher(false, Some(client.clone()));
        let registry = sample();
        let batch = BatchOperations::new(&dispatcher, &registry, CancellationToken::new());

        let summary = batch.approve_reject(Some("thanks")).await.unwrap();

        assert_eq!(summary.succeeded, 3);
        assert_eq!(summary.failed, 0);
        let calls = client.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].0, Operation::ApproveAssignment);
        assert_eq!(calls[1].0, Operation::RejectAssignment);
        assert_eq!(
            calls[1].1,
            json!({ "AssignmentId": "A2", "RequesterFeedback": "thanks" })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_feedback_is_refused_before_sending() {
        let client = RecordingClient::new();
        let dispatcher = dispatcher(false, Some(client.clone()));
        let registry = sample();
        let batch = BatchOperations::new(&dispatcher, &registry, CancellationToken::new());

        let result = batch.approve_reject(Some(&"x".repeat(1025))).await;

        assert!(matches!(result, Err(BatchError::InvalidArguments(_))));
        assert!(client.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unclassified_records_are_skipped() {
        let client = RecordingClient::new();
        let dispatcher = dispatcher(false, Some(client.clone()));
        let mut record = result("W1", "A1", "Approve", 0.0);
        record.set("Approve", Value::Boolean(false));
        let registry = registry(vec![record]);
        let batch = BatchOperations::new(&dispatcher, &registry, CancellationToken::new());

        let summary = batch.approve_reject(None).await.unwrap();
        assert_eq!(summary.skipped, 1);
        assert!(client.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_bonus_requires_reason() {
        let client = RecordingClient::new();
        let dispatcher = dispatcher(false, Some(client.clone()));
        let registry = sample();
        let batch = BatchOperations::new(&dispatcher, &registry, CancellationToken::new());

        assert!(matches!(
            batch.grant_bonus(" ").await,
            Err(BatchError::InvalidArguments(_))
        ));
        assert!(client.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_bonus_skips_rejected_and_zero_amounts() {
        let client = RecordingClient::new();
        let dispatcher = dispatcher(false, Some(client.clone()));
        let registry = sample();
        let batch = BatchOperations::new(&dispatcher, &registry, CancellationToken::new());

        let summary = batch.grant_bonus("great work").await.unwrap();

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.skipped, 2);
        let bonus = summary.bonus.unwrap();
        assert_eq!(bonus.count, 1);
        assert_eq!(bonus.total, 5.0);

        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, Operation::GrantBonus);
        assert_eq!(
            calls[0].1,
            json!({
                "WorkerId": "W1",
                "AssignmentId": "A1",
                "BonusAmount": "5.00",
                "Reason": "great work",
                "UniqueRequestToken": request_token("A1", 5.0),
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_record_reason_overrides_batch_reason() {
        let client = RecordingClient::new();
        let dispatcher = dispatcher(false, Some(client.clone()));
        let mut record = result("W1", "A1", "Approve", 1.25);
        record.set("Reason", Value::from("top scorer"));
        let registry = registry(vec![record]);
        let batch = BatchOperations::new(&dispatcher, &registry, CancellationToken::new());

        batch.grant_bonus("thanks").await.unwrap();
        let calls = client.calls();
        assert_eq!(calls[0].1["Reason"], "top scorer");
        assert_eq!(calls[0].1["BonusAmount"], "1.25");
    }

    #[test]
    fn test_request_token_is_deterministic() {
        assert_eq!(request_token("A1", 5.0), request_token("A1", 5.0));
        assert_ne!(request_token("A1", 5.0), request_token("A1", 5.01));
        assert_ne!(request_token("A1", 5.0), request_token("A2", 5.0));
        assert_eq!(request_token("A1", 5.0).len(), 32);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_failure_does_not_abort_the_batch() {
        let client = RecordingClient::with(vec!["A1"], json!({}));
        let dispatcher = dispatcher(false, Some(client.clone()));
        let registry = sample();
        let batch = BatchOperations::new(&dispatcher, &registry, CancellationToken::new());

        let summary = batch.approve_reject(None).await.unwrap();

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failures[0].0, "A1");
        assert!(summary.failures[0].1.contains("rejected"));
        assert_eq!(client.calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dry_run_sends_nothing() {
        let dispatcher = dispatcher(true, None);
        let registry = sample();
        let batch = BatchOperations::new(&dispatcher, &registry, CancellationToken::new());

        let summary = batch.grant_bonus("thanks").await.unwrap();
        assert_eq!(summary.dry_skipped, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.bonus.unwrap().total, 5.0);
        assert_eq!(dispatcher.metrics().attempts_sent, 0);

        assert_eq!(batch.account_balance().await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_preconditions() {
        let disconnected = dispatcher(false, None);
        let registry = sample();
        let batch = BatchOperations::new(&disconnected, &registry, CancellationToken::new());
        assert!(matches!(
            batch.approve_reject(None).await,
            Err(BatchError::NotConnected)
        ));

        let connected = dispatcher(false, Some(RecordingClient::new()));
        let empty = StoreRegistry::new(
            StoreOptions::new(StoreKind::Results),
            StoreOptions::new(StoreKind::Reference),
        );
        let batch = BatchOperations::new(&connected, &empty, CancellationToken::new());
        assert!(matches!(
            batch.assign_qualification().await,
            Err(BatchError::Store(StoreError::NotLoaded(StoreKind::Results)))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_assign_qualification_payload() {
        let client = RecordingClient::new();
        let dispatcher = dispatcher(false, Some(client.clone()));
        let mut with_value = result("W1", "A1", "Approve", 0.0);
        with_value.set("QualificationTypeId", Value::from("Q1"));
        with_value.set("IntegerValue", Value::from("7"));
        let mut default_value = result("W2", "A2", "Approve", 0.0);
        default_value.set("QualificationTypeId", Value::from("Q1"));
        let without = result("W3", "A3", "Approve", 0.0);
        let registry = registry(vec![with_value, default_value, without]);
        let batch = BatchOperations::new(&dispatcher, &registry, CancellationToken::new());

        let summary = batch.assign_qualification().await.unwrap();

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.skipped, 1);
        let calls = client.calls();
        assert_eq!(
            calls[0].1,
            json!({
                "QualificationTypeId": "Q1",
                "WorkerId": "W1",
                "IntegerValue": 7,
                "SendNotification": false,
            })
        );
        assert_eq!(calls[1].1["IntegerValue"], 1);
    }

    /// Takes `delay` to answer every call.
    struct SlowClient {
        delay: Duration,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl MarketplaceClient for SlowClient {
        async fn call(
            &self,
            _operation: Operation,
            _params: serde_json::Value,
        ) -> Result<serde_json::Value, RemoteError> {
            *self.calls.lock().unwrap() += 1;
            tokio::time::sleep(self.delay).await;
            Ok(json!({}))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_qualifications_for_one_worker_both_succeed() {
        let client = Arc::new(SlowClient {
            delay: Duration::from_millis(800),
            calls: Mutex::new(0),
        });
        let context = Arc::new(MarketContext::new(
            false,
            RetryPolicy::default(),
            Duration::from_millis(500),
        ));
        context.connect(client.clone()).unwrap();
        let dispatcher = RequestDispatcher::new(context);

        let mut first = result("W1", "A1", "Approve", 0.0);
        first.set("QualificationTypeId", Value::from("Q1"));
        let mut second = result("W1", "A2", "Approve", 0.0);
        second.set("QualificationTypeId", Value::from("Q2"));
        let registry = registry(vec![first, second]);
        let batch = BatchOperations::new(&dispatcher, &registry, CancellationToken::new());

        let summary = batch.assign_qualification().await.unwrap();

        assert_eq!(summary.succeeded, 2, "{:?}", summary.failures);
        assert_eq!(summary.failed, 0);
        assert_eq!(*client.calls.lock().unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_process_results_runs_in_order() {
        let client = RecordingClient::new();
        let dispatcher = dispatcher(false, Some(client.clone()));
        let registry = sample();
        let batch = BatchOperations::new(&dispatcher, &registry, CancellationToken::new());

        let request = ResultsRequest {
            approve: true,
            bonus: true,
            reason: Some("thanks".into()),
            ..Default::default()
        };
        let summaries = batch.process_results(&request).await.unwrap();

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].operation, "approve/reject");
        assert_eq!(summaries[1].operation, "bonus");
        let ops: Vec<_> = client.calls().into_iter().map(|(op, _)| op).collect();
        assert_eq!(ops.last(), Some(&Operation::GrantBonus));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_batch_sends_nothing() {
        let client = RecordingClient::new();
        let dispatcher = dispatcher(false, Some(client.clone()));
        let registry = sample();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let batch = BatchOperations::new(&dispatcher, &registry, cancel);

        let summary = batch.approve_reject(None).await.unwrap();
        assert_eq!(summary.skipped, 3);
        assert!(client.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_notify_argument_limits() {
        let dispatcher = dispatcher(false, Some(RecordingClient::new()));
        let registry = sample();
        let batch = BatchOperations::new(&dispatcher, &registry, CancellationToken::new());
        let workers = |n: usize| (0..n).map(|i| format!("W{i}")).collect::<Vec<_>>();

        for (ids, subject, body) in [
            (workers(0), "hi", "body"),
            (workers(101), "hi", "body"),
            (workers(1), &*"s".repeat(201), "body"),
            (workers(1), "hi", &*"b".repeat(4097)),
        ] {
            assert!(matches!(
                batch.notify(&ids, subject, body).await,
                Err(BatchError::InvalidArguments(_))
            ));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_notify_counts_per_recipient() {
        let client = RecordingClient::with(
            vec![],
            json!({
                "NotifyWorkersFailureStatuses": [
                    { "WorkerId": "W2", "NotifyWorkersFailureMessage": "blocked" }
                ]
            }),
        );
        let dispatcher = dispatcher(false, Some(client.clone()));
        let registry = sample();
        let batch = BatchOperations::new(&dispatcher, &registry, CancellationToken::new());
        let ids = vec!["W1".to_string(), "W2".to_string(), "W3".to_string()];

        let summary = batch.notify(&ids, "New HITs", "More work is up").await.unwrap();

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failures, vec![("W2".to_string(), "blocked".to_string())]);
        assert_eq!(client.calls()[0].1["WorkerIds"], json!(["W1", "W2", "W3"]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hit_operations() {
        let client = RecordingClient::with(vec![], json!({ "ok": true }));
        let dispatcher = dispatcher(false, Some(client.clone()));
        let registry = sample();
        let batch = BatchOperations::new(&dispatcher, &registry, CancellationToken::new());

        assert!(matches!(
            batch.extend_hit("H1", 0, 0).await,
            Err(BatchError::InvalidArguments(_))
        ));
        assert!(matches!(
            batch.expire_hit("").await,
            Err(BatchError::InvalidArguments(_))
        ));
        assert!(matches!(
            batch.create_hit(json!([])).await,
            Err(BatchError::InvalidArguments(_))
        ));

        let reply = batch.extend_hit("H1", 2, 3600).await.unwrap().unwrap();
        assert_eq!(reply["additionalAssignments"], json!({ "ok": true }));
        assert_eq!(reply["expiration"], json!({ "ok": true }));

        batch.expire_hit("H1").await.unwrap();

        let calls = client.calls();
        assert_eq!(calls[0].0, Operation::ExtendHit);
        assert_eq!(calls[0].1["NumberOfAdditionalAssignments"], 2);
        assert_eq!(calls[1].0, Operation::ExtendHitExpiration);
        assert!(calls[1].1["ExpireAt"].as_i64().unwrap() > 0);
        assert_eq!(calls[2], (Operation::ForceExpireHit, json!({ "HITId": "H1", "ExpireAt": 0 })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_single_call_is_an_error() {
        let client = RecordingClient::with(vec!["H1"], json!({}));
        let dispatcher = dispatcher(false, Some(client));
        let registry = sample();
        let batch = BatchOperations::new(&dispatcher, &registry, CancellationToken::new());

        assert!(matches!(
            batch.expire_hit("H1").await,
            Err(BatchError::Dispatch(_))
        ));
    }
}
