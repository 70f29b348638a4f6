use crate::{error::ContextError, retry::RetryPolicy};
use connectors::market::client::MarketplaceClient;
use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};
use tracing::info;

/// Process-wide state for one session: the dispatch policy and the
/// marketplace connection. Built once at startup and shared by `Arc`.
pub struct MarketContext {
    dry_run: bool,
    retry: RetryPolicy,
    throttle_interval: Duration,
    client: OnceLock<Arc<dyn MarketplaceClient>>,
}

impl MarketContext {
    pub fn new(dry_run: bool, retry: RetryPolicy, throttle_interval: Duration) -> Self {
        MarketContext {
            dry_run,
            retry,
            throttle_interval,
            client: OnceLock::new(),
        }
    }

    /// Installs the connection. A second connection is a caller error.
    pub fn connect(&self, client: Arc<dyn MarketplaceClient>) -> Result<(), ContextError> {
        self.client
            .set(client)
            .map_err(|_| ContextError::AlreadyConnected)?;
        info!("Connected to the marketplace service");
        Ok(())
    }

    pub fn client(&self) -> Option<Arc<dyn MarketplaceClient>> {
        self.client.get().cloned()
    }

    pub fn is_connected(&self) -> bool {
        self.client.get().is_some()
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn throttle_interval(&self) -> Duration {
        self.throttle_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use connectors::market::error::RemoteError;
    use model::operation::Operation;

    struct NullClient;

    #[async_trait]
    impl MarketplaceClient for NullClient {
        async fn call(
            &self,
            _operation: Operation,
            _params: serde_json::Value,
        ) -> Result<serde_json::Value, RemoteError> {
            Ok(serde_json::Value::Null)
        }
    }

    #[test]
    fn test_second_connection_is_rejected() {
        let ctx = MarketContext::new(false, RetryPolicy::default(), Duration::ZERO);
        assert!(!ctx.is_connected());

        ctx.connect(Arc::new(NullClient)).unwrap();
        assert!(ctx.is_connected());
        assert_eq!(
            ctx.connect(Arc::new(NullClient)),
            Err(ContextError::AlreadyConnected)
        );
    }
}
