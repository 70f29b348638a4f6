use crate::{
    context::MarketContext,
    dispatch::pending::{DispatchState, PendingKey, PendingOperation, PendingRegistry},
    error::DispatchError,
    metrics::{Metrics, MetricsSnapshot},
};
use connectors::market::{client::MarketplaceClient, error::RemoteError};
use futures::future::join_all;
use model::operation::Operation;
use std::{future::Future, sync::Arc, time::Duration};
use tokio::time::{Instant, sleep, sleep_until, timeout};
use tracing::{debug, error, info, warn};

/// Sends named operations to the marketplace with a per-attempt deadline,
/// bounded retries and a fixed wait between attempts.
pub struct RequestDispatcher {
    context: Arc<MarketContext>,
    pending: PendingRegistry,
    metrics: Metrics,
}

impl RequestDispatcher {
    pub fn new(context: Arc<MarketContext>) -> Self {
        RequestDispatcher {
            context,
            pending: PendingRegistry::new(),
            metrics: Metrics::new(),
        }
    }

    pub fn context(&self) -> &Arc<MarketContext> {
        &self.context
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn in_flight(&self) -> Vec<PendingOperation> {
        self.pending.snapshot()
    }

    /// Runs one operation to a terminal outcome.
    ///
    /// `Ok` carries the raw response of the first successful attempt. Every
    /// non-success, including a dry-mode skip, comes back as `Err`.
    pub async fn dispatch(
        &self,
        operation: Operation,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, DispatchError> {
        let subject = operation.subject(&params);

        if self.context.is_dry_run() {
            info!(%operation, %subject, "Dry run, not sending: {params}");
            self.metrics.increment_dry_skipped(1);
            return Err(DispatchError::DrySkipped(operation));
        }

        let Some(client) = self.context.client() else {
            error!(%operation, %subject, "Cannot send, no marketplace connection");
            self.metrics.increment_failed(1);
            return Err(DispatchError::NotConnected);
        };

        let key = PendingKey {
            operation,
            subject: subject.clone(),
        };
        let Some(guard) = self.pending.register(key) else {
            warn!(%operation, %subject, "Operation already in flight, refusing duplicate");
            return Err(DispatchError::AlreadyPending { operation, subject });
        };

        let policy = self.context.retry_policy().clone();

        loop {
            let attempt = guard.send(Instant::now() + policy.timeout);
            self.metrics.increment_attempts(1);
            debug!(%operation, %subject, attempt, "Sending");

            match Self::attempt(&client, operation, params.clone(), policy.timeout).await {
                Ok(response) => {
                    guard.transition(DispatchState::Succeeded);
                    self.metrics.increment_succeeded(1);
                    debug!(%operation, %subject, attempt, "Succeeded");
                    return Ok(response);
                }
                Err(err) => {
                    self.metrics.increment_attempt_failures(1);
                    if matches!(err, RemoteError::NoReply { .. }) {
                        self.metrics.increment_timeouts(1);
                    }
                    warn!(%operation, %subject, attempt, "Attempt failed: {err}");

                    if !policy.should_retry(attempt) {
                        guard.transition(DispatchState::Failed);
                        self.metrics.increment_failed(1);
                        error!(%operation, %subject, attempts = attempt, "Giving up: {err}");
                        return Err(DispatchError::Exhausted {
                            operation,
                            subject,
                            attempts: attempt,
                            last: err,
                        });
                    }

                    guard.transition(DispatchState::Retrying);
                    self.metrics.increment_retries(1);
                    let delay = policy.backoff_delay(attempt);
                    debug!(%operation, %subject, "Retrying in {} ms", delay.as_millis());
                    sleep(delay).await;
                }
            }
        }
    }

    /// One attempt, raced against the deadline. The call runs in its own task
    /// so a missed deadline stops the wait without cancelling the call.
    async fn attempt(
        client: &Arc<dyn MarketplaceClient>,
        operation: Operation,
        params: serde_json::Value,
        deadline: Duration,
    ) -> Result<serde_json::Value, RemoteError> {
        let client = Arc::clone(client);
        let call = tokio::spawn(async move { client.call(operation, params).await });

        match timeout(deadline, call).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(RemoteError::Aborted(join_err.to_string())),
            Err(_) => Err(RemoteError::NoReply {
                timeout_ms: deadline.as_millis() as u64,
            }),
        }
    }

    /// Staggers `items`: item `i` starts `i * throttle_interval` after the
    /// batch starts, without waiting for earlier items to finish. Results come
    /// back in item order.
    pub async fn dispatch_batch<T, F, Fut, R>(&self, items: Vec<T>, f: F) -> Vec<R>
    where
        F: FnMut(T) -> Fut,
        Fut: Future<Output = R>,
    {
        stagger(items, self.context.throttle_interval(), f).await
    }
}

/// Fixed-stagger scheduling shared by the dispatcher.
pub async fn stagger<T, F, Fut, R>(items: Vec<T>, interval: Duration, mut f: F) -> Vec<R>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = R>,
{
    let start = Instant::now();
    let scheduled = items.into_iter().enumerate().map(|(i, item)| {
        let fire_at = start + interval * i as u32;
        let task = f(item);
        async move {
            sleep_until(fire_at).await;
            task.await
        }
    });

    join_all(scheduled).await
}
